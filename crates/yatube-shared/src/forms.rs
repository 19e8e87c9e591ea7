//! Submitted forms and their field-level validation.
//!
//! Inputs are normalised (trimmed) before validation, so a text made only of
//! whitespace counts as missing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Key of errors that belong to the form as a whole.
pub const NON_FIELD: &str = "non_field";

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
pub const USERNAME_CHARS: &str =
    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.";

/// Field name to error messages, in a stable order for rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.entry(field.into()).or_default().push(message.into());
    }

    /// Take over every message of `other`.
    pub fn merge(&mut self, other: FormErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = FormErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                form_errors.add(field.to_string(), message);
            }
        }
        form_errors
    }
}

/// Post create/edit form.
///
/// `group` holds the raw submitted group id; whether it names an existing
/// group is checked against the store by the handler.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PostForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    pub group: Option<String>,
}

impl PostForm {
    pub fn normalized(self) -> Self {
        Self {
            text: self.text.trim().to_string(),
            group: self
                .group
                .map(|g| g.trim().to_string())
                .filter(|g| !g.is_empty()),
        }
    }

    /// Validate the local rules, returning field errors.
    pub fn check(&self) -> FormErrors {
        self.validate().err().map(FormErrors::from).unwrap_or_default()
    }
}

/// Comment form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    pub fn normalized(self) -> Self {
        Self {
            text: self.text.trim().to_string(),
        }
    }
}

/// Signup form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SignupForm {
    #[validate(length(min = 1, max = 150, message = "Enter a username of at most 150 characters."))]
    pub username: String,
    #[validate(email(message = "Enter a valid email address."))]
    pub email: Option<String>,
    #[serde(skip_serializing)]
    #[validate(length(min = 8, message = "Password must be at least 8 characters."))]
    pub password: String,
}

impl SignupForm {
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self
                .email
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            password: self.password,
        }
    }

    pub fn check(&self) -> FormErrors {
        let mut errors = self.validate().err().map(FormErrors::from).unwrap_or_default();
        if !self.username.chars().all(is_username_char) {
            errors.add("username", USERNAME_CHARS);
        }
        errors
    }
}

/// Usernames end up verbatim in profile URLs.
fn is_username_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-')
}

/// Login form. `next` is where to go after a successful login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub next: Option<String>,
}
