//! Authentication Middleware and Entry Points
//! Mission: Guard routes with JWT validation and uniform error bodies

use crate::auth::jwt::{strip_bearer, TokenError, TokenProvider};
use crate::auth::models::AuthContext;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

/// Shown when a request carries no usable credentials. The wording
/// dates back to the original portal and is kept for client
/// compatibility; the binding contract is the 401 status code.
pub const FORBIDDEN_MESSAGE: &str = "You need to login to access this page";

/// Shown when an authenticated principal lacks the required authority.
pub const ACCESS_DENIED_MESSAGE: &str = "You do not have permission to access this page";

/// Structured error/status body returned to clients. Field names and
/// order are a stable wire contract.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponseBody {
    pub http_status_code: u16,
    pub http_status: String,
    pub reason: String,
    pub message: String,
}

impl HttpResponseBody {
    pub fn new(status: StatusCode, message: &str) -> Self {
        let reason = status.canonical_reason().unwrap_or_default().to_uppercase();
        Self {
            http_status_code: status.as_u16(),
            // Status name with underscores, reason phrase with spaces:
            // "BAD_REQUEST" vs "BAD REQUEST".
            http_status: reason.replace(' ', "_"),
            reason,
            message: message.to_string(),
        }
    }

    pub fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

/// Boundary failures translated by the entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// No token, or a header without the bearer scheme.
    Unauthenticated,
    TokenExpired,
    TokenInvalidSignature,
    TokenMalformed,
    /// Valid principal, insufficient authority.
    AccessDenied,
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::InvalidSignature => AuthError::TokenInvalidSignature,
            TokenError::Malformed => AuthError::TokenMalformed,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        // Every unauthenticated-class failure gets the same uniform
        // body; only access denial reads differently.
        let message = match self {
            AuthError::AccessDenied => ACCESS_DENIED_MESSAGE,
            _ => FORBIDDEN_MESSAGE,
        };
        HttpResponseBody::new(StatusCode::UNAUTHORIZED, message).into_response()
    }
}

/// Middleware that validates the bearer token and attaches an
/// [`AuthContext`] to the request.
pub async fn auth_middleware(
    State(provider): State<Arc<TokenProvider>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(strip_bearer)
        .ok_or(AuthError::Unauthenticated)?;

    let claims = provider.verify_token(token).map_err(|e| {
        warn!(error = %e, "Rejected bearer token");
        AuthError::from(e)
    })?;

    req.extensions_mut().insert(AuthContext {
        username: claims.sub,
        authorities: claims.authorities,
    });

    Ok(next.run(req).await)
}

/// Extract the verified identity from a request (use after
/// [`auth_middleware`]).
pub fn extract_context(req: &Request) -> Option<&AuthContext> {
    req.extensions().get::<AuthContext>()
}

/// Authorization guard: the context must hold the given authority.
pub fn require_authority(ctx: &AuthContext, authority: &str) -> Result<(), AuthError> {
    if ctx.has_authority(authority) {
        Ok(())
    } else {
        warn!(
            username = %ctx.username,
            authority,
            "Access denied: missing authority"
        );
        Err(AuthError::AccessDenied)
    }
}
