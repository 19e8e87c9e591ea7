//! PostgreSQL repository implementations.
//!
//! Related rows are loaded with explicit batched queries rather than
//! relationship traversal.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sea_orm::sea_query::Query;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Select,
};
use uuid::Uuid;

use yatube_core::domain::{
    Comment, CommentEntry, Follow, Group, NewComment, NewGroup, NewPost, Post, PostEntry,
    PostScope, User,
};
use yatube_core::error::RepoError;
use yatube_core::ports::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};

use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::follow::{self, Entity as FollowEntity};
use super::entity::group::{self, Entity as GroupEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error, write_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL group repository.
pub type PostgresGroupRepository = PostgresBaseRepository<GroupEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// PostgreSQL follow repository.
pub type PostgresFollowRepository = PostgresBaseRepository<FollowEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(%username, "Finding user by username");

        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let model = user::ActiveModel::from(user)
            .insert(&self.db)
            .await
            .map_err(write_error)?;

        Ok(model.into())
    }
}

#[async_trait]
impl GroupRepository for PostgresGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let result = GroupEntity::find()
            .filter(group::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let result = GroupEntity::find()
            .order_by_asc(group::Column::Title)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn create(&self, group: NewGroup) -> Result<Group, RepoError> {
        let model = group::ActiveModel::from(group)
            .insert(&self.db)
            .await
            .map_err(write_error)?;

        tracing::info!(slug = %model.slug, "Group created");
        Ok(model.into())
    }
}

impl PostgresPostRepository {
    fn scoped(scope: PostScope) -> Select<PostEntity> {
        let select = PostEntity::find();
        match scope {
            PostScope::All => select,
            PostScope::Group(group_id) => select.filter(post::Column::GroupId.eq(group_id)),
            PostScope::Author(author_id) => select.filter(post::Column::AuthorId.eq(author_id)),
            PostScope::FollowedBy(user_id) => select.filter(
                post::Column::AuthorId.in_subquery(
                    Query::select()
                        .column(follow::Column::AuthorId)
                        .from(FollowEntity)
                        .and_where(follow::Column::UserId.eq(user_id))
                        .to_owned(),
                ),
            ),
        }
    }

    /// Join authors and groups onto a batch of posts, keeping their order.
    async fn attach(&self, models: Vec<post::Model>) -> Result<Vec<PostEntry>, RepoError> {
        let author_ids: HashSet<Uuid> = models.iter().map(|m| m.author_id).collect();
        let group_ids: HashSet<i64> = models.iter().filter_map(|m| m.group_id).collect();

        let authors = usernames(&self.db, author_ids).await?;

        let groups: HashMap<i64, Group> = if group_ids.is_empty() {
            HashMap::new()
        } else {
            GroupEntity::find()
                .filter(group::Column::Id.is_in(group_ids))
                .all(&self.db)
                .await
                .map_err(query_error)?
                .into_iter()
                .map(|g| (g.id, g.into()))
                .collect()
        };

        Ok(models
            .into_iter()
            .map(|model| PostEntry {
                author: authors.get(&model.author_id).cloned().unwrap_or_default(),
                group: model.group_id.and_then(|id| groups.get(&id).cloned()),
                post: model.into(),
            })
            .collect())
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_entry(&self, id: i64) -> Result<Option<PostEntry>, RepoError> {
        let Some(model) = PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(query_error)?
        else {
            return Ok(None);
        };

        Ok(self.attach(vec![model]).await?.pop())
    }

    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(post)
            .insert(&self.db)
            .await
            .map_err(write_error)?;

        tracing::info!(post_id = model.id, author_id = %model.author_id, "Post created");
        Ok(model.into())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(post)
            .update(&self.db)
            .await
            .map_err(write_error)?;

        tracing::info!(post_id = model.id, "Post updated");
        Ok(model.into())
    }

    async fn count(&self, scope: PostScope) -> Result<u64, RepoError> {
        Self::scoped(scope)
            .count(&self.db)
            .await
            .map_err(query_error)
    }

    async fn list(
        &self,
        scope: PostScope,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<PostEntry>, RepoError> {
        let models = Self::scoped(scope)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        self.attach(models).await
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment, RepoError> {
        let model = comment::ActiveModel::from(comment)
            .insert(&self.db)
            .await
            .map_err(write_error)?;

        tracing::info!(comment_id = model.id, post_id = model.post_id, "Comment created");
        Ok(model.into())
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<CommentEntry>, RepoError> {
        let models = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        let authors = usernames(&self.db, models.iter().map(|m| m.author_id).collect()).await?;

        Ok(models
            .into_iter()
            .map(|model| CommentEntry {
                author: authors.get(&model.author_id).cloned().unwrap_or_default(),
                comment: model.into(),
            })
            .collect())
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn exists(&self, user_id: Uuid, author_id: Uuid) -> Result<bool, RepoError> {
        let count = FollowEntity::find()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .count(&self.db)
            .await
            .map_err(query_error)?;

        Ok(count > 0)
    }

    async fn insert(&self, user_id: Uuid, author_id: Uuid) -> Result<Follow, RepoError> {
        let model = follow::new_follow(user_id, author_id)
            .insert(&self.db)
            .await
            .map_err(write_error)?;

        Ok(model.into())
    }

    async fn delete(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, RepoError> {
        let result = FollowEntity::delete_many()
            .filter(follow::Column::UserId.eq(user_id))
            .filter(follow::Column::AuthorId.eq(author_id))
            .exec(&self.db)
            .await
            .map_err(write_error)?;

        Ok(result.rows_affected)
    }
}

/// Usernames of the given users, keyed by id.
async fn usernames(
    db: &sea_orm::DbConn,
    ids: HashSet<Uuid>,
) -> Result<HashMap<Uuid, String>, RepoError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = UserEntity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await
        .map_err(query_error)?;

    Ok(users.into_iter().map(|u| (u.id, u.username)).collect())
}
