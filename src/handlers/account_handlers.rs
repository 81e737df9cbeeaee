use crate::config::session::{SESSION_EMAIL_KEY, SESSION_USER_ID_KEY};
use crate::error::AppError;
use crate::models::user::{Role, UserResponse};
use crate::services::{
    account_service::{AccountError, RegisterRequest, ResetPasswordRequest},
    auth_service::{AuthServiceError, LoginRequest},
    user_service::UserServiceError,
};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tower_sessions::Session;

#[derive(Debug, Deserialize)]
pub struct TokenPayload {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct EmailPayload {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterPayload {
    pub email: String,
    pub user_name: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub mobile_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordPayload {
    pub token: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Malformed bodies are a 400 on every endpoint.
fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

fn internal(err: impl std::fmt::Display) -> AppError {
    tracing::error!("Unexpected account failure: {}", err);
    AppError::InternalError
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

fn verification_error(err: AccountError) -> AppError {
    match err {
        AccountError::TokenNotFound => AppError::unauthorized("Invalid token"),
        AccountError::TokenExpired => AppError::unauthorized("Token expired"),
        other => internal(other),
    }
}

fn activation_error(err: AccountError) -> AppError {
    match err {
        AccountError::TokenNotFound => AppError::bad_request("Invalid token"),
        AccountError::TokenExpired => AppError::bad_request("Token expired"),
        other => internal(other),
    }
}

fn register_error(err: AccountError) -> AppError {
    match err {
        AccountError::User(
            e @ (UserServiceError::InvalidEmail
            | UserServiceError::WeakPassword
            | UserServiceError::MissingUserName
            | UserServiceError::EmailTaken),
        ) => AppError::bad_request(e.to_string()),
        other => internal(other),
    }
}

fn token_request_error(err: AccountError) -> AppError {
    match err {
        AccountError::UserNotFound => {
            AppError::unauthorized("No account is registered with this email")
        }
        other => internal(other),
    }
}

fn reset_password_error(err: AccountError) -> AppError {
    match err {
        AccountError::TokenNotFound => AppError::bad_request("Invalid token"),
        AccountError::TokenExpired => AppError::bad_request("Token expired"),
        AccountError::User(e @ UserServiceError::WeakPassword) => {
            AppError::bad_request(e.to_string())
        }
        other => internal(other),
    }
}

fn login_error(err: AuthServiceError) -> AppError {
    match err {
        AuthServiceError::InvalidCredentials => AppError::bad_request("Invalid email or password"),
        AuthServiceError::Inactive => {
            AppError::bad_request("Please activate your account before logging in")
        }
        other => internal(other),
    }
}

pub async fn verification_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<TokenPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = parse(payload)?;
    let user = app_state
        .account_service
        .verify_token(&payload.token)
        .await
        .map_err(verification_error)?;

    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Token is valid", "email": user.email })),
    )
        .into_response())
}

pub async fn activate_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<TokenPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = parse(payload)?;
    let user = app_state
        .account_service
        .activate(&payload.token)
        .await
        .map_err(activation_error)?;

    Ok((StatusCode::OK, Json(UserResponse::from(&user))).into_response())
}

pub async fn register_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<RegisterPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = parse(payload)?;
    let request = RegisterRequest {
        email: payload.email,
        user_name: payload.user_name,
        password: payload.password,
        role: payload.role.unwrap_or_default(),
        mobile_number: payload.mobile_number,
    };

    let user = app_state
        .account_service
        .register(request)
        .await
        .map_err(register_error)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))).into_response())
}

pub async fn forgot_password_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<EmailPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = parse(payload)?;
    app_state
        .account_service
        .forgot_password(&payload.email)
        .await
        .map_err(token_request_error)?;

    Ok(message(StatusCode::OK, "Password reset link sent"))
}

pub async fn reset_password_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<ResetPasswordPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = parse(payload)?;
    app_state
        .account_service
        .reset_password(ResetPasswordRequest {
            token: payload.token,
            password: payload.password,
        })
        .await
        .map_err(reset_password_error)?;

    Ok(message(StatusCode::OK, "Password has been reset"))
}

pub async fn resend_activation_token_handler(
    State(app_state): State<AppState>,
    payload: Result<Json<EmailPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = parse(payload)?;
    app_state
        .account_service
        .resend_activation_token(&payload.email)
        .await
        .map_err(token_request_error)?;

    Ok(message(StatusCode::OK, "Activation link sent"))
}

pub async fn login_handler(
    State(app_state): State<AppState>,
    session: Session,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<Response, AppError> {
    let payload = parse(payload)?;
    let user = app_state
        .auth_service
        .authenticate(LoginRequest {
            email: payload.email,
            password: payload.password,
        })
        .await
        .map_err(login_error)?;

    // Rotate the session id on privilege change.
    session.cycle_id().await.map_err(internal)?;
    session
        .insert(SESSION_USER_ID_KEY, user.id)
        .await
        .map_err(internal)?;
    session
        .insert(SESSION_EMAIL_KEY, &user.email)
        .await
        .map_err(internal)?;

    tracing::info!(user_id = user.id, "user logged in");

    Ok((StatusCode::OK, Json(UserResponse::from(&user))).into_response())
}

pub async fn logout_handler(session: Session) -> Result<Response, AppError> {
    session.flush().await.map_err(internal)?;
    Ok(message(StatusCode::OK, "Logged out"))
}

/// Returns the user recorded in the session by `login_handler`.
pub async fn me_handler(
    State(app_state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    let user_id: i64 = session
        .get(SESSION_USER_ID_KEY)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::unauthorized("Not logged in"))?;

    let user = app_state
        .auth_service
        .get_user_by_id(user_id)
        .await
        .map_err(|e| match e {
            AuthServiceError::UserNotFound => AppError::unauthorized("Not logged in"),
            other => internal(other),
        })?;

    Ok((StatusCode::OK, Json(UserResponse::from(&user))).into_response())
}
