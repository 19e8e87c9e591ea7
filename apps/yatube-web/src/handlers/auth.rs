//! Session pages: signup, login and logout.

use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::{HttpResponse, web};
use serde::Deserialize;
use std::sync::Arc;

use yatube_core::domain::User;
use yatube_core::error::RepoError;
use yatube_core::ports::{PasswordService, TokenService};
use yatube_shared::context::AuthFormContext;
use yatube_shared::forms::{FormErrors, LoginForm, NON_FIELD, SignupForm};

use super::{redirect, render_page};
use crate::middleware::auth::{OptionalIdentity, SESSION_COOKIE};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const USERNAME_TAKEN: &str = "A user with that username already exists.";
const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

/// Only local absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

fn session_cookie(token: String, lifetime_seconds: i64) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(Duration::seconds(lifetime_seconds))
        .finish()
}

/// Issue a session token and redirect to `location` with it set.
fn start_session(
    token_service: &dyn TokenService,
    user: &User,
    location: &str,
) -> AppResult<HttpResponse> {
    let token = token_service.generate_token(user.id, &user.username)?;
    let cookie = session_cookie(token, token_service.expiration_seconds());

    tracing::info!(user_id = %user.id, username = %user.username, "Session started");

    let mut response = redirect(location);
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

/// GET /auth/signup/
pub async fn signup_form(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
) -> AppResult<HttpResponse> {
    render_page(
        &state,
        viewer.0.as_ref(),
        "users/signup.html",
        &AuthFormContext::blank(None),
    )
}

/// POST /auth/signup/
pub async fn signup(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    form: web::Form<SignupForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner().normalized();
    let mut errors = form.check();

    if errors.is_empty() && state.users.find_by_username(&form.username).await?.is_some() {
        errors.add("username", USERNAME_TAKEN);
    }

    if errors.is_empty() {
        let password_hash = password_service.hash(&form.password)?;
        let user = User::new(
            form.username.clone(),
            form.email.clone().unwrap_or_default(),
            password_hash,
        );

        match state.users.save(user).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, username = %user.username, "User registered");
                return start_session(token_service.get_ref().as_ref(), &user, "/");
            }
            Err(RepoError::Constraint(_)) => errors.add("username", USERNAME_TAKEN),
            Err(e) => return Err(e.into()),
        }
    }

    let context = AuthFormContext {
        username: form.username,
        email: form.email,
        next: None,
        errors,
    };
    render_page(&state, None, "users/signup.html", &context)
}

/// GET /auth/login/
pub async fn login_form(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    query: web::Query<NextQuery>,
) -> AppResult<HttpResponse> {
    let context = AuthFormContext::blank(query.into_inner().next);
    render_page(&state, viewer.0.as_ref(), "users/login.html", &context)
}

/// POST /auth/login/
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    password_service: web::Data<Arc<dyn PasswordService>>,
    form: web::Form<LoginForm>,
) -> AppResult<HttpResponse> {
    let form = form.into_inner();
    let username = form.username.trim();

    let user = state.users.find_by_username(username).await?;
    let verified = match &user {
        Some(user) => password_service.verify(&form.password, &user.password_hash)?,
        None => false,
    };

    if let (true, Some(user)) = (verified, user) {
        let location = safe_next(form.next.as_deref());
        return start_session(token_service.get_ref().as_ref(), &user, location);
    }

    tracing::debug!(%username, "Login rejected");
    let mut errors = FormErrors::new();
    errors.add(NON_FIELD, BAD_CREDENTIALS);

    let context = AuthFormContext {
        username: username.to_string(),
        email: None,
        next: form.next,
        errors,
    };
    render_page(&state, None, "users/login.html", &context)
}

/// GET|POST /auth/logout/
pub async fn logout(state: web::Data<AppState>) -> AppResult<HttpResponse> {
    let mut response = render_page(
        &state,
        None,
        "users/logged_out.html",
        &serde_json::json!({}),
    )?;

    let cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    response
        .add_removal_cookie(&cookie)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_next_only_follows_local_paths() {
        assert_eq!(safe_next(Some("/create/")), "/create/");
        assert_eq!(safe_next(Some("/?page=2")), "/?page=2");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil.example")), "/");
        assert_eq!(safe_next(None), "/");
    }
}
