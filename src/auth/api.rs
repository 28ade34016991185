//! User API Endpoints
//! Mission: Expose registration, login, and account administration

use crate::auth::jwt::{TokenProvider, JWT_TOKEN_HEADER};
use crate::auth::middleware::{auth_middleware, require_authority, AuthError, HttpResponseBody};
use crate::auth::models::{
    AddUserRequest, AuthContext, LoginRequest, RegisterRequest, UpdateUserRequest, UserResponse,
};
use crate::auth::service::{ServiceError, UserService};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{self, get, post},
    Extension, Json, Router,
};
use std::sync::Arc;
use tracing::error;

pub const USER_DELETED_MESSAGE: &str = "USER DELETED SUCCESSFULLY";
pub const EMAIL_SENT_MESSAGE: &str = "An email with a new password was sent to: ";

/// Shared state for the user API.
#[derive(Clone)]
pub struct AuthState {
    pub service: Arc<UserService>,
    pub token_provider: Arc<TokenProvider>,
}

impl AuthState {
    pub fn new(service: Arc<UserService>, token_provider: Arc<TokenProvider>) -> Self {
        Self {
            service,
            token_provider,
        }
    }
}

/// API failure envelope: service and authorization errors rendered as
/// the structured body clients expect.
#[derive(Debug)]
pub enum ApiError {
    Service(ServiceError),
    Auth(AuthError),
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        ApiError::Auth(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Auth(e) => return e.into_response(),
            ApiError::Service(ServiceError::InvalidCredentials) => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password".to_string())
            }
            ApiError::Service(ServiceError::AccountDisabled) => {
                (StatusCode::UNAUTHORIZED, "Account is disabled".to_string())
            }
            ApiError::Service(ServiceError::AccountLocked) => (
                StatusCode::UNAUTHORIZED,
                "Your account has been locked. Please try again later".to_string(),
            ),
            ApiError::Service(ServiceError::UsernameExists) => {
                (StatusCode::BAD_REQUEST, "Username already exists".to_string())
            }
            ApiError::Service(ServiceError::EmailExists) => {
                (StatusCode::BAD_REQUEST, "Email already exists".to_string())
            }
            ApiError::Service(ServiceError::UserNotFound(name)) => (
                StatusCode::NOT_FOUND,
                format!("No user found by username: {}", name),
            ),
            ApiError::Service(ServiceError::EmailNotFound(email)) => (
                StatusCode::BAD_REQUEST,
                format!("No user found by email: {}", email),
            ),
            ApiError::Service(ServiceError::UnknownRole(role)) => {
                (StatusCode::BAD_REQUEST, format!("Unknown role: {}", role))
            }
            ApiError::Service(ServiceError::Internal(e)) => {
                error!(error = %e, "Internal error handling user request");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        HttpResponseBody::new(status, &message).into_response()
    }
}

/// POST /user/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let created = state.service.register(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from_record(&created))))
}

/// POST /user/login
///
/// On success the fresh bearer token rides back in the `Jwt-Token`
/// response header next to the user body.
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<UserResponse>), ApiError> {
    let principal = state
        .service
        .authenticate(&payload.username, &payload.password)?;

    let token = state
        .token_provider
        .generate_token(&principal)
        .map_err(|e| ApiError::Service(ServiceError::Internal(e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        JWT_TOKEN_HEADER,
        HeaderValue::from_str(&token)
            .map_err(|e| ApiError::Service(ServiceError::Internal(e.into())))?,
    );

    let record = state.service.find_by_username(&payload.username)?;
    Ok((headers, Json(UserResponse::from_record(&record))))
}

/// GET /user/find/{username}
pub async fn find_user(
    State(state): State<AuthState>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let record = state.service.find_by_username(&username)?;
    Ok(Json(UserResponse::from_record(&record)))
}

/// GET /user/list
pub async fn list_users(
    State(state): State<AuthState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.service.list()?;
    Ok(Json(users.iter().map(UserResponse::from_record).collect()))
}

/// POST /user/add (requires user:create)
pub async fn add_user(
    State(state): State<AuthState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<AddUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    require_authority(&ctx, "user:create")?;
    let created = state.service.add_user(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from_record(&created))))
}

/// POST /user/update (requires user:update)
pub async fn update_user(
    State(state): State<AuthState>,
    Extension(ctx): Extension<AuthContext>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_authority(&ctx, "user:update")?;
    let updated = state.service.update_user(payload)?;
    Ok(Json(UserResponse::from_record(&updated)))
}

/// GET /user/reset-password/{email}
pub async fn reset_password(
    State(state): State<AuthState>,
    Path(email): Path<String>,
) -> Result<Response, ApiError> {
    state.service.reset_password(&email).await?;
    let message = format!("{}{}", EMAIL_SENT_MESSAGE, email);
    Ok(HttpResponseBody::new(StatusCode::OK, &message).into_response())
}

/// DELETE /user/delete/{username} (requires user:delete)
pub async fn delete_user(
    State(state): State<AuthState>,
    Extension(ctx): Extension<AuthContext>,
    Path(username): Path<String>,
) -> Result<Response, ApiError> {
    require_authority(&ctx, "user:delete")?;
    state.service.delete(&username)?;
    Ok(HttpResponseBody::new(StatusCode::NO_CONTENT, USER_DELETED_MESSAGE).into_response())
}

/// Build the user API router: public registration/login/reset plus the
/// token-guarded account routes.
pub fn router(state: AuthState) -> Router {
    let public_routes = Router::new()
        .route("/user/register", post(register))
        .route("/user/login", post(login))
        .route("/user/reset-password/:email", get(reset_password));

    let protected_routes = Router::new()
        .route("/user/find/:username", get(find_user))
        .route("/user/list", get(list_users))
        .route("/user/add", post(add_user))
        .route("/user/update", post(update_user))
        .route("/user/delete/:username", routing::delete(delete_user))
        .route_layer(axum::middleware::from_fn_with_state(
            state.token_provider.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
