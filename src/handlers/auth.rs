use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    error::Result,
    models::identity::Identity,
    services::auth as auth_service,
    state::AppState,
    validation::auth::*,
};

/// The cookie carrying the access token.
const SESSION_COOKIE: &str = "session";

/// The request payload for account creation.
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub username: String,
}

/// The request payload for user login.
#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The request payload for email verification.
#[derive(Deserialize, Debug)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// A plain message response.
#[derive(Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// The user summary returned on login.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub username: String,
    pub role: String,
    pub email_verified: bool,
}

/// The response payload for a successful login.
#[derive(Serialize)]
pub struct LoginResponse {
    pub user: UserSummary,
}

/// Creates the session cookie carrying the access token.
fn create_session_cookie(value: String, max_age_secs: i64) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, value);

    let is_production = std::env::var("APP_ENV")
        .unwrap_or_else(|_| "development".to_string()) == "production";

    cookie.set_http_only(true);
    if is_production {
        cookie.set_secure(true);
    }
    cookie.set_same_site(tower_cookies::cookie::SameSite::Lax);
    cookie.set_max_age(Duration::seconds(max_age_secs));
    cookie.set_path("/");

    cookie
}

/// Handles account creation.
#[axum::debug_handler]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse> {
    tracing::info!("Signup attempt for username: {}", payload.username);

    validate_email(&payload.email)?;
    validate_username(&payload.username)?;
    validate_password(&payload.password)?;

    auth_service::signup(
        &state,
        &payload.email,
        &payload.password,
        &payload.display_name,
        &payload.username,
    )
    .await?;

    let response = MessageResponse {
        message: "Account created successfully. Please check your email to verify your account."
            .to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// Handles user login: password check, token minting, session recording.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    cookies: Cookies,
    Json(payload): Json<LoginRequest>,
) -> Result<Response> {
    validate_email(&payload.email)?;

    let user = auth_service::authenticate(&state, &payload.email, &payload.password).await?;
    let tokens = auth_service::establish_session(&state, &user).await?;

    let max_age_secs = (tokens.expires_at - chrono::Utc::now()).num_seconds();
    cookies.add(create_session_cookie(tokens.access_token, max_age_secs));

    tracing::info!("User logged in: {}", user.id);

    let response = LoginResponse {
        user: UserSummary {
            id: user.id.to_string(),
            email: user.email,
            display_name: user.display_name,
            username: user.username,
            role: user.role,
            email_verified: user.email_verified_at.is_some(),
        },
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Returns the current authenticated user's identity context.
#[axum::debug_handler]
pub async fn me(Extension(identity): Extension<Identity>) -> Json<Identity> {
    Json(identity)
}

/// Handles email verification via the mailed opaque token.
///
/// Reachable logged in or out; authentication is attempted but optional.
#[axum::debug_handler]
pub async fn verify_email(
    State(state): State<AppState>,
    Extension(identity): Extension<Option<Identity>>,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<Response> {
    if let Some(ref identity) = identity {
        tracing::debug!("Email verification requested by user: {}", identity.user_id);
    }

    auth_service::verify_email(&state, &payload.token).await?;

    let response = MessageResponse {
        message: "Email verified successfully".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}

/// Handles user logout.
///
/// Clears the client-side cookie only; the session row stays until it
/// expires and previously issued tokens remain signature-valid.
#[axum::debug_handler]
pub async fn logout(
    Extension(identity): Extension<Identity>,
    cookies: Cookies,
) -> Result<Response> {
    let mut session_cookie = Cookie::new(SESSION_COOKIE, "");
    session_cookie.set_max_age(Duration::seconds(0));
    session_cookie.set_path("/");
    cookies.remove(session_cookie);

    tracing::info!("User logged out: {}", identity.user_id);

    let response = MessageResponse {
        message: "Logout successful".to_string(),
    };

    Ok((StatusCode::OK, Json(response)).into_response())
}
