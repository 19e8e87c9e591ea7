//! Domain entities - the core business objects.

mod comment;
mod follow;
mod group;
mod post;
mod user;

pub use comment::{Comment, CommentEntry, NewComment};
pub use follow::{Follow, FollowOutcome, UnfollowOutcome};
pub use group::{Group, NewGroup};
pub use post::{LABEL_LENGTH, NewPost, Post, PostEntry, PostScope};
pub use user::User;
