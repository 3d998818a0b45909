use crate::error::{AppError, Result};
use crate::models::session::SessionRecord;
use crate::models::user::User;
use crate::repositories::{session as session_repo, user as user_repo, verification as verification_repo};
use crate::services::email;
use crate::state::AppState;
use crate::token::authority::{self, REFRESH_TOKEN_TTL_SECS};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder,
};
use chrono::{Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use uuid::Uuid;
use zeroize::Zeroize;

/// The memory cost for Argon2 in MB.
const ARGON2_MEMORY_MB: u32 = 19;
/// The number of iterations for Argon2.
const ARGON2_ITERATIONS: u32 = 3;
/// The parallelism factor for Argon2.
const ARGON2_PARALLELISM: u32 = 4;

/// Verification links expire after 24 hours.
const VERIFICATION_TTL_HOURS: i64 = 24;

/// Hashes a password using Argon2id.
fn hash_password(password: &str) -> Result<String> {
    let mut password_bytes = password.as_bytes().to_vec();

    let mut salt_bytes = [0u8; 16];
    OsRng.fill_bytes(&mut salt_bytes);

    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|e| AppError::Crypto(format!("Salt encoding error: {}", e)))?;

    let argon2 = Argon2::new(
        argon2::Algorithm::Argon2id,
        argon2::Version::V0x13,
        ParamsBuilder::new()
            .m_cost(ARGON2_MEMORY_MB * 1024)
            .t_cost(ARGON2_ITERATIONS)
            .p_cost(ARGON2_PARALLELISM)
            .build()
            .map_err(|e| AppError::Crypto(format!("Argon2 params: {}", e)))?,
    );

    let password_hash = argon2
        .hash_password(&password_bytes, &salt)
        .map_err(|e| AppError::Crypto(format!("Argon2 hash error: {}", e)))?
        .to_string();

    password_bytes.zeroize();
    Ok(password_hash)
}

/// Verifies a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let mut password_bytes = password.as_bytes().to_vec();
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Crypto(format!("Hash parse error: {}", e)))?;
    let argon2 = Argon2::default();
    let result = argon2
        .verify_password(&password_bytes, &parsed_hash)
        .is_ok();

    password_bytes.zeroize();
    Ok(result)
}

/// Creates a new user account and dispatches the verification email.
///
/// The caller is responsible for syntactic validation of the fields; this
/// function enforces uniqueness and persistence.
pub async fn signup(
    state: &AppState,
    email_addr: &str,
    password: &str,
    display_name: &str,
    username: &str,
) -> Result<()> {
    if user_repo::email_or_username_exists(&state.db, email_addr, username).await? {
        return Err(AppError::AlreadyExists(
            "Email or username already exists".to_string(),
        ));
    }

    let password_hash = hash_password(password)?;

    let user = user_repo::insert(
        &state.db,
        Uuid::new_v4(),
        email_addr,
        &password_hash,
        display_name,
        username,
    )
    .await?;

    tracing::info!("User created: {}", user.id);

    // Opaque verification token: only its hash is stored.
    let token = authority::generate_secure_token();
    let token_hash = authority::hash_token(&token);
    let expires_at = Utc::now() + Duration::hours(VERIFICATION_TTL_HOURS);

    verification_repo::insert(&state.db, &user.id, &token_hash, &expires_at).await?;

    email::send_verification_email(&state.config.app_base_url, email_addr, &token).await;

    Ok(())
}

/// Authenticates a user by email and password.
///
/// Both the unknown-email and wrong-password legs fail with the same
/// message, so callers cannot probe which emails have accounts.
pub async fn authenticate(state: &AppState, email_addr: &str, password: &str) -> Result<User> {
    let user = user_repo::find_by_email(&state.db, email_addr)
        .await?
        .ok_or_else(|| AppError::Unauthenticated("Invalid email or password".to_string()))?;

    if !verify_password(password, &user.password_hash)? {
        return Err(AppError::Unauthenticated(
            "Invalid email or password".to_string(),
        ));
    }

    tracing::info!("User authenticated: {}", user.id);
    Ok(user)
}

/// The result of a successful login: the access token the cookie carries,
/// plus the session expiry the cookie should mirror.
pub struct LoginTokens {
    pub access_token: String,
    pub expires_at: chrono::DateTime<Utc>,
}

/// Mints both token classes for `user` and durably records the refresh
/// token's issuance.
///
/// The refresh token itself never leaves this function: only its SHA-256
/// hash is persisted, keyed by a fresh per-login client id. Concurrent
/// logins simply produce independent session rows.
pub async fn establish_session(state: &AppState, user: &User) -> Result<LoginTokens> {
    let user_id = user.id.to_string();

    let access_token = state
        .tokens
        .issue_access(&user_id)
        .map_err(|e| AppError::Crypto(format!("Token signing error: {}", e)))?;
    let refresh_token = state
        .tokens
        .issue_refresh(&user_id)
        .map_err(|e| AppError::Crypto(format!("Token signing error: {}", e)))?;

    let now = Utc::now();
    let record = SessionRecord {
        user_id: user.id,
        client_id: Uuid::new_v4(),
        refresh_token_hash: authority::hash_token(&refresh_token),
        created_at: now,
        expires_at: now + Duration::seconds(REFRESH_TOKEN_TTL_SECS),
    };

    session_repo::insert_session(&state.db, &record).await?;
    tracing::debug!("Session recorded for user {} client {}", user.id, record.client_id);

    Ok(LoginTokens {
        access_token,
        expires_at: record.expires_at,
    })
}

/// Consumes an email verification token and stamps the user as verified.
pub async fn verify_email(state: &AppState, token: &str) -> Result<()> {
    let token_hash = authority::hash_token(token);

    let record = verification_repo::find_by_hash(&state.db, &token_hash)
        .await?
        .ok_or_else(|| AppError::Validation("Invalid verification token".to_string()))?;

    if record.used_at.is_some() {
        return Err(AppError::Validation(
            "Verification token already used".to_string(),
        ));
    }

    if Utc::now() > record.expires_at {
        return Err(AppError::Validation(
            "Verification token expired".to_string(),
        ));
    }

    verification_repo::mark_used(&state.db, &token_hash).await?;
    user_repo::mark_email_verified(&state.db, &record.user_id).await?;

    tracing::info!("Email verified for user: {}", record.user_id);
    Ok(())
}
