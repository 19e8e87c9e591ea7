//! HTML rendering with MiniJinja.
//!
//! Templates are compiled into the binary and loaded once into a shared
//! environment. Handlers render through the [`Renderer`] trait so tests can
//! capture the context a page was given.

use std::sync::OnceLock;

use actix_web::http::StatusCode;
use chrono::Datelike;
use minijinja::Environment;
use serde_json::{Value, json};

/// Content type of every rendered page.
pub const HTML: &str = "text/html; charset=utf-8";

const TEMPLATES: &[(&str, &str)] = &[
    ("base.html", include_str!("../templates/base.html")),
    (
        "includes/paginator.html",
        include_str!("../templates/includes/paginator.html"),
    ),
    (
        "includes/post_card.html",
        include_str!("../templates/includes/post_card.html"),
    ),
    (
        "includes/form_errors.html",
        include_str!("../templates/includes/form_errors.html"),
    ),
    ("posts/index.html", include_str!("../templates/posts/index.html")),
    (
        "posts/group_list.html",
        include_str!("../templates/posts/group_list.html"),
    ),
    ("posts/profile.html", include_str!("../templates/posts/profile.html")),
    (
        "posts/post_detail.html",
        include_str!("../templates/posts/post_detail.html"),
    ),
    (
        "posts/create_post.html",
        include_str!("../templates/posts/create_post.html"),
    ),
    ("posts/follow.html", include_str!("../templates/posts/follow.html")),
    ("users/signup.html", include_str!("../templates/users/signup.html")),
    ("users/login.html", include_str!("../templates/users/login.html")),
    (
        "users/logged_out.html",
        include_str!("../templates/users/logged_out.html"),
    ),
    ("core/404.html", include_str!("../templates/core/404.html")),
    ("core/error.html", include_str!("../templates/core/error.html")),
];

/// Rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(String),

    #[error("Context error: {0}")]
    Context(String),
}

impl From<minijinja::Error> for RenderError {
    fn from(err: minijinja::Error) -> Self {
        RenderError::Template(err.to_string())
    }
}

/// Turns a named template and its context into HTML.
pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError>;
}

/// Renderer backed by the compiled-in template set.
#[derive(Debug, Default, Clone, Copy)]
pub struct MiniJinjaRenderer;

impl Renderer for MiniJinjaRenderer {
    fn render(&self, template: &str, context: &Value) -> Result<String, RenderError> {
        Ok(environment().get_template(template)?.render(context)?)
    }
}

fn environment() -> &'static Environment<'static> {
    static ENV: OnceLock<Environment<'static>> = OnceLock::new();

    ENV.get_or_init(|| {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            if let Err(e) = env.add_template(name, source) {
                tracing::error!(template = %name, error = %e, "Failed to load template");
            }
        }
        env
    })
}

/// Current year, shown in the footer of every page.
pub fn current_year() -> i32 {
    chrono::Utc::now().year()
}

/// Body of the error page for `status`.
pub fn error_page(status: StatusCode) -> String {
    let template = if status == StatusCode::NOT_FOUND {
        "core/404.html"
    } else {
        "core/error.html"
    };
    let context = json!({
        "year": current_year(),
        "current_user": Value::Null,
        "status": status.as_u16(),
        "reason": status.canonical_reason().unwrap_or("Error"),
    });

    MiniJinjaRenderer
        .render(template, &context)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to render error page");
            format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or("Error"))
        })
}
