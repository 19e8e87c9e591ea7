use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Group;

/// Number of characters of the text used as the post label.
pub const LABEL_LENGTH: usize = 15;

/// Post entity - a short text entry written by a single author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub text: String,
    /// Media storage key of the attached image.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// First [`LABEL_LENGTH`] characters of the text.
    pub fn label(&self) -> String {
        self.text.chars().take(LABEL_LENGTH).collect()
    }

    pub fn is_authored_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A post that has not been stored yet. The store assigns the id and timestamp.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub text: String,
    pub image: Option<String>,
}

impl NewPost {
    pub fn new(author_id: Uuid, text: impl Into<String>) -> Self {
        Self {
            author_id,
            group_id: None,
            text: text.into(),
            image: None,
        }
    }

    pub fn with_group(mut self, group_id: Option<i64>) -> Self {
        self.group_id = group_id;
        self
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }
}

/// A post joined with its author's username and its group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostEntry {
    pub post: Post,
    pub author: String,
    pub group: Option<Group>,
}

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(Uuid),
    /// Posts by every author the given user follows.
    FollowedBy(Uuid),
}
