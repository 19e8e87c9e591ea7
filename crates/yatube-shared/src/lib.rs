//! # Yatube Shared
//!
//! Types exchanged between the handlers and the templates: submitted forms
//! with their validation rules, and the page contexts handed to rendering.

pub mod context;
pub mod forms;

pub use context::PageObj;
pub use forms::{CommentForm, FormErrors, LoginForm, PostForm, SignupForm};
