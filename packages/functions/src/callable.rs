//! # HTTPS callable endpoints
//!
//! Callables follow the managed platform's wire protocol:
//!
//! - request: `POST` with a JSON body `{"data": ...}` and, for authenticated
//!   calls, `Authorization: Bearer <idToken>`;
//! - success: `200` with `{"result": ...}`;
//! - failure: `{"error": {"status": "...", "message": "..."}}` with the HTTP
//!   status matching the error status.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /deleteUser` | Admin-only removal of a member, their identity record and houses |
//! | `GET /health` | Liveness probe |

use std::sync::Arc;

use api::models::User;
use api::{delete_user_cascade, IdentityProvider};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use store::{DocumentStore, Repository};
use tower_http::trace::TraceLayer;

/// Shared handles for every callable.
pub struct AppState<I, S> {
    pub identity: Arc<I>,
    pub repo: Repository<S>,
}

impl<I, S: Clone> Clone for AppState<I, S> {
    fn clone(&self) -> Self {
        Self {
            identity: Arc::clone(&self.identity),
            repo: self.repo.clone(),
        }
    }
}

/// A callable failure and its protocol status.
#[derive(Debug, thiserror::Error)]
pub enum CallableError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl CallableError {
    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "UNAUTHENTICATED"),
            Self::PermissionDenied(_) => (StatusCode::FORBIDDEN, "PERMISSION_DENIED"),
            Self::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }
}

impl From<api::Error> for CallableError {
    fn from(e: api::Error) -> Self {
        match e {
            api::Error::Authentication(m) => Self::Unauthenticated(m),
            api::Error::PermissionDenied(_) | api::Error::AccountPending => {
                Self::PermissionDenied(e.to_string())
            }
            api::Error::NotFound { .. } => Self::NotFound(e.to_string()),
            e if e.is_user_input() => Self::InvalidArgument(e.to_string()),
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for CallableError {
    fn into_response(self) -> Response {
        let (code, status) = self.status();
        if code.is_server_error() {
            tracing::error!(error = %self, "callable failed");
        } else {
            tracing::warn!(status, error = %self, "callable refused");
        }
        let body = Json(json!({
            "error": {
                "status": status,
                "message": self.to_string(),
            }
        }));
        (code, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct CallRequest<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct CallResponse<T> {
    result: T,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteUserData {
    #[serde(default)]
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct DeleteUserResult {
    success: bool,
    message: String,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the caller and require an admin profile.
async fn require_admin_caller<I, S>(
    state: &AppState<I, S>,
    headers: &HeaderMap,
) -> Result<String, CallableError>
where
    I: IdentityProvider,
    S: DocumentStore,
{
    let unauthenticated =
        || CallableError::Unauthenticated("The function must be called while authenticated.".into());
    let token = bearer_token(headers).ok_or_else(unauthenticated)?;
    let uid = state
        .identity
        .verify_token(token)
        .await
        .map_err(|_| unauthenticated())?;

    let caller = state.repo.get::<User>(&uid).await.map_err(api::Error::from)?;
    match caller {
        Some(profile) if profile.role.is_admin() => Ok(uid),
        _ => Err(CallableError::PermissionDenied(
            "Only admins can delete users.".into(),
        )),
    }
}

async fn delete_user<I, S>(
    State(state): State<AppState<I, S>>,
    headers: HeaderMap,
    body: Result<Json<CallRequest<DeleteUserData>>, JsonRejection>,
) -> Result<Json<CallResponse<DeleteUserResult>>, CallableError>
where
    I: IdentityProvider,
    S: DocumentStore,
{
    let caller = require_admin_caller(&state, &headers).await?;

    let data = match body {
        Ok(Json(request)) => request.data,
        Err(rejection) => return Err(CallableError::InvalidArgument(rejection.body_text())),
    };
    let Some(user_id) = data.user_id.filter(|id| !id.trim().is_empty()) else {
        return Err(CallableError::InvalidArgument(
            "The function must be called with a userId.".into(),
        ));
    };

    tracing::info!(%caller, %user_id, "deleteUser called");
    let report = delete_user_cascade(state.identity.as_ref(), &state.repo, &user_id).await?;
    if !report.identity_removed && !report.profile_removed && report.houses_removed == 0 {
        return Err(CallableError::NotFound(format!("User {} not found", user_id)));
    }

    Ok(Json(CallResponse {
        result: DeleteUserResult {
            success: true,
            message: "User deleted successfully".into(),
        },
    }))
}

async fn health() -> &'static str {
    "OK"
}

/// Build the callable router.
pub fn router<I, S>(state: AppState<I, S>) -> Router
where
    I: IdentityProvider + 'static,
    S: DocumentStore + Clone + 'static,
{
    Router::new()
        .route("/deleteUser", post(delete_user::<I, S>))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
