//! Session extractors.
//!
//! The session token lives in the HTTP-only [`SESSION_COOKIE`]; a Bearer
//! `Authorization` header is accepted as well.

use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, http::header, web};
use futures::future::LocalBoxFuture;
use std::sync::Arc;

use yatube_core::error::RepoError;
use yatube_core::ports::{AuthError, TokenClaims, TokenService};

use crate::middleware::error::AppError;
use crate::state::AppState;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "access_token";

/// Login page that anonymous users are sent to.
pub const LOGIN_URL: &str = "/auth/login/";

/// Authenticated user identity extractor.
///
/// Handlers taking an `Identity` are only reachable while logged in as a
/// user that still exists:
/// ```ignore
/// async fn post_create(identity: Identity) -> impl Responder {
///     format!("Hello, {}!", identity.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: uuid::Uuid,
    pub username: String,
}

/// Authentication failure. Responds by redirecting to the login page,
/// remembering where the user was going.
#[derive(Debug)]
pub struct AuthenticationError {
    pub cause: AuthError,
    pub next: String,
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cause)
    }
}

impl actix_web::ResponseError for AuthenticationError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        actix_web::http::StatusCode::FOUND
    }

    fn error_response(&self) -> HttpResponse {
        tracing::debug!(cause = %self.cause, next = %self.next, "Redirecting to login");

        HttpResponse::Found()
            .insert_header((header::LOCATION, login_redirect(&self.next)))
            .finish()
    }
}

/// Login URL that comes back to `next` afterwards.
pub fn login_redirect(next: &str) -> String {
    format!("{}?next={}", LOGIN_URL, urlencoding::encode(next))
}

fn session_token(req: &HttpRequest) -> Result<String, AuthError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        return Ok(cookie.value().to_string());
    }

    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingAuth)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid authorization header".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(str::to_string)
        .ok_or_else(|| AuthError::InvalidToken("Expected Bearer token".to_string()))
}

/// Why a request carries no usable session.
enum SessionError {
    Rejected(AuthError),
    Store(RepoError),
}

impl From<AuthError> for SessionError {
    fn from(err: AuthError) -> Self {
        Self::Rejected(err)
    }
}

impl From<RepoError> for SessionError {
    fn from(err: RepoError) -> Self {
        Self::Store(err)
    }
}

fn token_claims(req: &HttpRequest) -> Result<TokenClaims, AuthError> {
    let token_service = match req.app_data::<web::Data<Arc<dyn TokenService>>>() {
        Some(service) => service,
        None => {
            tracing::error!("TokenService not found in app data");
            return Err(AuthError::InvalidToken(
                "Server configuration error".to_string(),
            ));
        }
    };

    let token = session_token(req)?;
    token_service.validate_token(&token)
}

/// Resolve the session to a user that still exists in the store.
async fn authenticate(req: &HttpRequest) -> Result<Identity, SessionError> {
    let claims = token_claims(req)?;

    let Some(state) = req.app_data::<web::Data<AppState>>() else {
        tracing::error!("AppState not found in app data");
        return Err(AuthError::InvalidToken("Server configuration error".to_string()).into());
    };

    match state.users.find_by_id(claims.user_id).await? {
        Some(user) => Ok(Identity {
            user_id: user.id,
            username: user.username,
        }),
        None => {
            tracing::debug!(user_id = %claims.user_id, "Session names an unknown user");
            Err(AuthError::InvalidToken("Unknown user".to_string()).into())
        }
    }
}

fn requested_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.path().to_string())
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match authenticate(&req).await {
                Ok(identity) => Ok(identity),
                Err(SessionError::Rejected(cause)) => Err(AuthenticationError {
                    cause,
                    next: requested_path(&req),
                }
                .into()),
                Err(SessionError::Store(err)) => Err(AppError::from(err).into()),
            }
        })
    }
}

/// Optional identity extractor - doesn't fail if not authenticated.
pub struct OptionalIdentity(pub Option<Identity>);

impl OptionalIdentity {
    pub fn user_id(&self) -> Option<uuid::Uuid> {
        self.0.as_ref().map(|i| i.user_id)
    }
}

impl FromRequest for OptionalIdentity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            match authenticate(&req).await {
                Ok(identity) => Ok(OptionalIdentity(Some(identity))),
                Err(SessionError::Rejected(_)) => Ok(OptionalIdentity(None)),
                Err(SessionError::Store(err)) => Err(AppError::from(err).into()),
            }
        })
    }
}
