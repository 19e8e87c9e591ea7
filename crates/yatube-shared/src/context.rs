//! Page contexts - the named values each template receives.

use serde::{Deserialize, Serialize};

use crate::forms::{FormErrors, PostForm};

/// A page of records with the navigation values the paginator template needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageObj<T> {
    pub object_list: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub count: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub previous_page_number: Option<u64>,
    pub next_page_number: Option<u64>,
    pub page_range: Vec<u64>,
}

impl<T> PageObj<T> {
    pub fn len(&self) -> usize {
        self.object_list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.object_list.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupView {
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post as shown in lists and on its detail page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostCard {
    pub id: i64,
    pub label: String,
    pub text: String,
    pub author: String,
    pub group: Option<GroupView>,
    pub image_url: Option<String>,
    pub pub_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentView {
    pub author: String,
    pub text: String,
    pub created: String,
}

/// An option of the group select box.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupChoice {
    pub id: i64,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexContext {
    pub page_obj: PageObj<PostCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupContext {
    pub group: GroupView,
    pub page_obj: PageObj<PostCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileContext {
    pub author: String,
    pub posts_count: u64,
    /// Whether the requesting user follows this author.
    pub following: bool,
    /// Whether the requesting user may follow this author at all.
    pub can_follow: bool,
    pub page_obj: PageObj<PostCard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentFormView {
    pub text: String,
    pub errors: FormErrors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDetailContext {
    pub post: PostCard,
    pub author: String,
    pub posts_count: u64,
    pub can_edit: bool,
    pub comments: Vec<CommentView>,
    pub form: CommentFormView,
}

/// Submitted (or prefilled) values of the post form with their errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormView {
    pub text: String,
    pub group: Option<String>,
    pub image_url: Option<String>,
    pub errors: FormErrors,
}

impl PostFormView {
    pub fn blank() -> Self {
        Self::from_form(&PostForm::default(), FormErrors::new())
    }

    pub fn from_form(form: &PostForm, errors: FormErrors) -> Self {
        Self {
            text: form.text.clone(),
            group: form.group.clone(),
            image_url: None,
            errors,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostFormContext {
    pub form: PostFormView,
    pub groups: Vec<GroupChoice>,
    pub is_edit: bool,
    pub post_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowContext {
    pub page_obj: PageObj<PostCard>,
}

/// Signup and login pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthFormContext {
    pub username: String,
    pub email: Option<String>,
    pub next: Option<String>,
    pub errors: FormErrors,
}

impl AuthFormContext {
    pub fn blank(next: Option<String>) -> Self {
        Self {
            username: String::new(),
            email: None,
            next,
            errors: FormErrors::new(),
        }
    }
}
