//! HTTP handlers and route configuration.

mod auth;
mod follow;
mod health;
mod media;
mod posts;

#[cfg(test)]
mod tests;

use actix_web::{HttpResponse, http::header, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::render::{self, RenderError};
use crate::state::AppState;

/// `?page=N` of paginated pages. Kept as text; the paginator resolves it.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// Render `template` with `context` plus the values every page receives.
pub(crate) fn render_page<C: Serialize>(
    state: &AppState,
    viewer: Option<&Identity>,
    template: &str,
    context: &C,
) -> AppResult<HttpResponse> {
    let mut value =
        serde_json::to_value(context).map_err(|e| RenderError::Context(e.to_string()))?;

    if let Value::Object(map) = &mut value {
        map.insert("year".to_string(), json!(render::current_year()));
        map.insert(
            "current_user".to_string(),
            json!(viewer.map(|v| v.username.as_str())),
        );
    }

    let html = state.renderer.render(template, &value)?;
    Ok(HttpResponse::Ok().content_type(render::HTML).body(html))
}

pub(crate) fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

pub(crate) fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

pub(crate) fn post_url(post_id: i64) -> String {
    format!("/posts/{}/", post_id)
}

async fn not_found(req: actix_web::HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!("No route for {}", req.path())))
}

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::NotFound(err.to_string()).into()),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
    )
    // Public pages
    .route("/", web::get().to(posts::index))
    .route("/group/{slug}/", web::get().to(posts::group_posts))
    .route("/profile/{username}/", web::get().to(posts::profile))
    .route("/posts/{post_id}/", web::get().to(posts::post_detail))
    // Authoring
    .service(
        web::resource("/create/")
            .route(web::get().to(posts::post_create_form))
            .route(web::post().to(posts::post_create)),
    )
    .service(
        web::resource("/posts/{post_id}/edit/")
            .route(web::get().to(posts::post_edit_form))
            .route(web::post().to(posts::post_edit)),
    )
    .route("/posts/{post_id}/comment/", web::post().to(posts::add_comment))
    // Subscriptions
    .route("/follow/", web::get().to(follow::follow_index))
    .route(
        "/profile/{username}/follow/",
        web::get().to(follow::profile_follow),
    )
    .route(
        "/profile/{username}/unfollow/",
        web::get().to(follow::profile_unfollow),
    )
    // Sessions
    .service(
        web::scope("/auth")
            .service(
                web::resource("/signup/")
                    .route(web::get().to(auth::signup_form))
                    .route(web::post().to(auth::signup)),
            )
            .service(
                web::resource("/login/")
                    .route(web::get().to(auth::login_form))
                    .route(web::post().to(auth::login)),
            )
            .service(
                web::resource("/logout/")
                    .route(web::get().to(auth::logout))
                    .route(web::post().to(auth::logout)),
            ),
    )
    .route("/media/{key:.*}", web::get().to(media::serve))
    .route("/health", web::get().to(health::health_check))
    .default_service(web::to(not_found));
}
