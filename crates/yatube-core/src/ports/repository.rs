use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentEntry, Follow, Group, NewComment, NewGroup, NewPost, Post, PostEntry,
    PostScope, User,
};
use crate::error::RepoError;

/// Lookup shared by every entity repository.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Insert a user. A taken username yields [`RepoError::Constraint`].
    async fn save(&self, user: User) -> Result<User, RepoError>;
}

/// Group repository.
#[async_trait]
pub trait GroupRepository: BaseRepository<Group, i64> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError>;

    /// All groups ordered by title.
    async fn list_all(&self) -> Result<Vec<Group>, RepoError>;

    /// Groups are created administratively; a taken slug yields [`RepoError::Constraint`].
    async fn create(&self, group: NewGroup) -> Result<Group, RepoError>;
}

/// Post repository.
///
/// Listings are ordered newest first, ties broken by id descending.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    /// A single post with its author and group.
    async fn find_entry(&self, id: i64) -> Result<Option<PostEntry>, RepoError>;

    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// Overwrite text, group and image of an existing post.
    async fn update(&self, post: Post) -> Result<Post, RepoError>;

    async fn count(&self, scope: PostScope) -> Result<u64, RepoError>;

    async fn list(
        &self,
        scope: PostScope,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostEntry>, RepoError>;
}

/// Comment repository.
#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, i64> {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError>;

    /// Comments of a post, oldest first.
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentEntry>, RepoError>;
}

/// Follow relationship repository.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError>;

    /// Insert a relationship. An existing pair yields [`RepoError::Constraint`].
    async fn insert(&self, user_id: Uuid, author_id: Uuid) -> Result<Follow, RepoError>;

    /// Remove a relationship, returning the number of rows removed.
    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, RepoError>;
}
