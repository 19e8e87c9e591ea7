//! Post pages: listings, detail, authoring and comments.

use actix_multipart::Multipart;
use actix_web::{HttpResponse, web};
use validator::Validate;

use yatube_core::DomainError;
use yatube_core::domain::{Group, NewComment, NewPost, PostScope};
use yatube_core::services::page_of_posts;
use yatube_shared::context::{
    CommentFormView, GroupContext, IndexContext, PostDetailContext, PostFormContext, PostFormView,
    ProfileContext,
};
use yatube_shared::forms::{CommentForm, FormErrors, INVALID_CHOICE};

use super::{PageQuery, post_url, profile_url, redirect, render_page};
use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;
use crate::upload::{PostSubmission, read_post_form};
use crate::views::{comment_view, group_choice, group_view, media_url, page_obj, post_card};

const FORM_TEMPLATE: &str = "posts/create_post.html";

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let page = page_of_posts(
        state.posts.as_ref(),
        &state.paginator,
        PostScope::All,
        query.page.as_deref(),
    )
    .await?;

    let context = IndexContext {
        page_obj: page_obj(page, post_card),
    };
    render_page(&state, viewer.0.as_ref(), "posts/index.html", &context)
}

/// GET /group/{slug}/
pub async fn group_posts(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let slug = path.into_inner();
    let group = state
        .groups
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| DomainError::not_found("Group", &slug))?;

    let page = page_of_posts(
        state.posts.as_ref(),
        &state.paginator,
        PostScope::Group(group.id),
        query.page.as_deref(),
    )
    .await?;

    let context = GroupContext {
        group: group_view(group),
        page_obj: page_obj(page, post_card),
    };
    render_page(&state, viewer.0.as_ref(), "posts/group_list.html", &context)
}

/// GET /profile/{username}/
pub async fn profile(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let username = path.into_inner();
    let author = state
        .users
        .find_by_username(&username)
        .await?
        .ok_or_else(|| DomainError::not_found("User", &username))?;

    let page = page_of_posts(
        state.posts.as_ref(),
        &state.paginator,
        PostScope::Author(author.id),
        query.page.as_deref(),
    )
    .await?;

    let can_follow = viewer.user_id().is_some_and(|id| id != author.id);
    let following = match viewer.user_id() {
        Some(user_id) if can_follow => state.follows.exists(user_id, author.id).await?,
        _ => false,
    };

    let context = ProfileContext {
        posts_count: page.total,
        author: author.username,
        following,
        can_follow,
        page_obj: page_obj(page, post_card),
    };
    render_page(&state, viewer.0.as_ref(), "posts/profile.html", &context)
}

/// GET /posts/{post_id}/
pub async fn post_detail(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let entry = state
        .posts
        .find_entry(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;

    let author_id = entry.post.author_id;
    let posts_count = state.posts.count(PostScope::Author(author_id)).await?;
    let comments = state.comments.list_for_post(post_id).await?;

    let context = PostDetailContext {
        author: entry.author.clone(),
        can_edit: viewer.user_id() == Some(author_id),
        post: post_card(entry),
        posts_count,
        comments: comments.into_iter().map(comment_view).collect(),
        form: CommentFormView {
            text: String::new(),
            errors: FormErrors::new(),
        },
    };
    render_page(&state, viewer.0.as_ref(), "posts/post_detail.html", &context)
}

/// Check the submitted fields against the available groups, returning the
/// chosen group id and every field error.
fn validate_submission(
    submission: &PostSubmission,
    groups: &[Group],
) -> (Option<i64>, FormErrors) {
    let mut errors = submission.errors.clone();
    errors.merge(submission.form.check());

    let group_id = match submission.form.group.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<i64>() {
            Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
            _ => {
                errors.add("group", INVALID_CHOICE);
                None
            }
        },
    };

    (group_id, errors)
}

fn form_context(
    form: PostFormView,
    groups: Vec<Group>,
    post_id: Option<i64>,
) -> PostFormContext {
    PostFormContext {
        form,
        groups: groups.into_iter().map(group_choice).collect(),
        is_edit: post_id.is_some(),
        post_id,
    }
}

/// GET /create/
pub async fn post_create_form(
    state: web::Data<AppState>,
    identity: Identity,
) -> AppResult<HttpResponse> {
    let groups = state.groups.list_all().await?;
    let context = form_context(PostFormView::blank(), groups, None);
    render_page(&state, Some(&identity), FORM_TEMPLATE, &context)
}

/// POST /create/
pub async fn post_create(
    state: web::Data<AppState>,
    identity: Identity,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let submission = read_post_form(payload).await?;
    let groups = state.groups.list_all().await?;
    let (group_id, errors) = validate_submission(&submission, &groups);

    if !errors.is_empty() {
        tracing::debug!(?errors, "Post form rejected");
        let form = PostFormView::from_form(&submission.form, errors);
        return render_page(
            &state,
            Some(&identity),
            FORM_TEMPLATE,
            &form_context(form, groups, None),
        );
    }

    let image = match submission.image {
        Some(upload) => Some(state.media.store(&upload.extension, upload.bytes).await?),
        None => None,
    };

    state
        .posts
        .create(
            NewPost::new(identity.user_id, submission.form.text)
                .with_group(group_id)
                .with_image(image),
        )
        .await?;

    Ok(redirect(profile_url(&identity.username)))
}

/// GET /posts/{post_id}/edit/
pub async fn post_edit_form(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;

    if !post.is_authored_by(identity.user_id) {
        return Ok(redirect(post_url(post_id)));
    }

    let form = PostFormView {
        text: post.text,
        group: post.group_id.map(|id| id.to_string()),
        image_url: post.image.as_deref().map(media_url),
        errors: FormErrors::new(),
    };
    let groups = state.groups.list_all().await?;
    render_page(
        &state,
        Some(&identity),
        FORM_TEMPLATE,
        &form_context(form, groups, Some(post_id)),
    )
}

/// POST /posts/{post_id}/edit/
pub async fn post_edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let mut post = state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;

    if !post.is_authored_by(identity.user_id) {
        tracing::warn!(post_id, user_id = %identity.user_id, "Edit attempt by non-author");
        return Ok(redirect(post_url(post_id)));
    }

    let submission = read_post_form(payload).await?;
    let groups = state.groups.list_all().await?;
    let (group_id, errors) = validate_submission(&submission, &groups);

    if !errors.is_empty() {
        let mut form = PostFormView::from_form(&submission.form, errors);
        form.image_url = post.image.as_deref().map(media_url);
        return render_page(
            &state,
            Some(&identity),
            FORM_TEMPLATE,
            &form_context(form, groups, Some(post_id)),
        );
    }

    if let Some(upload) = submission.image {
        post.image = Some(state.media.store(&upload.extension, upload.bytes).await?);
    }
    post.text = submission.form.text;
    post.group_id = group_id;
    state.posts.update(post).await?;

    Ok(redirect(post_url(post_id)))
}

/// POST /posts/{post_id}/comment/
pub async fn add_comment(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<i64>,
    form: web::Form<CommentForm>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    state
        .posts
        .find_by_id(post_id)
        .await?
        .ok_or_else(|| DomainError::not_found("Post", post_id))?;

    let form = form.into_inner().normalized();
    if form.validate().is_ok() {
        state
            .comments
            .create(NewComment {
                post_id,
                author_id: identity.user_id,
                text: form.text,
            })
            .await?;
    } else {
        tracing::debug!(post_id, "Empty comment ignored");
    }

    Ok(redirect(post_url(post_id)))
}
