//! Subscriptions: the followed-authors feed and follow toggles.

use actix_web::{HttpResponse, web};

use yatube_core::DomainError;
use yatube_core::domain::{PostScope, User};
use yatube_core::services::{self, page_of_posts};
use yatube_shared::context::FollowContext;

use super::{PageQuery, profile_url, redirect, render_page};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::views::{page_obj, post_card};

/// GET /follow/
pub async fn follow_index(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = page_of_posts(
        state.posts.as_ref(),
        &state.paginator,
        PostScope::FollowedBy(identity.user_id),
        query.page.as_deref(),
    )
    .await?;

    let context = FollowContext {
        page_obj: page_obj(page, post_card),
    };
    render_page(&state, Some(&identity), "posts/follow.html", &context)
}

async fn find_author(state: &AppState, username: &str) -> AppResult<User> {
    let author = state
        .users
        .find_by_username(username)
        .await?
        .ok_or_else(|| DomainError::not_found("User", username))?;
    Ok(author)
}

/// GET /profile/{username}/follow/
pub async fn profile_follow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state, &path).await?;

    let outcome = services::follow(state.follows.as_ref(), identity.user_id, author.id).await?;
    tracing::debug!(?outcome, author = %author.username, "Follow requested");

    Ok(redirect(profile_url(&author.username)))
}

/// GET /profile/{username}/unfollow/
pub async fn profile_unfollow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let author = find_author(&state, &path).await?;

    let outcome = services::unfollow(state.follows.as_ref(), identity.user_id, author.id).await?;
    tracing::debug!(?outcome, author = %author.username, "Unfollow requested");

    Ok(redirect(profile_url(&author.username)))
}
