use crate::auth_middleware::Claims;
use crate::error::AppResult;
use crate::models::AppState;
use argon2::Argon2;
use axum::{Extension, Json, extract::State, http::StatusCode};
use jsonwebtoken::{Algorithm, Header, encode};
use password_hash::{PasswordHash, PasswordVerifier};
use serde::{Deserialize, Serialize};

/// Single-user deployment: every token is issued to this owner.
pub const OWNER_ID: i64 = 1;

const TOKEN_TTL_SECS: u64 = 7 * 24 * 3600;

#[derive(Deserialize)]
pub struct LoginReq {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResp {
    pub token: String,
}

#[derive(Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    pub user_id: i64,
}

fn now_ts() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Authenticate with the configured password and return a JWT token.
///
/// # Errors
/// Returns an error if:
/// - No password hash is configured.
/// - The provided password is invalid.
/// - Parsing the password hash or encoding the JWT fails.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> AppResult<Json<LoginResp>> {
    let stored_hash = state
        .config
        .password_hash
        .as_ref()
        .ok_or(StatusCode::SERVICE_UNAVAILABLE)?;

    let parsed = PasswordHash::new(stored_hash).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    if Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed)
        .is_err()
    {
        tracing::warn!("login rejected: wrong password");
        return Err(StatusCode::UNAUTHORIZED.into());
    }

    let token = encode(
        &Header::new(Algorithm::HS256),
        &Claims {
            sub: OWNER_ID,
            exp: now_ts() + TOKEN_TTL_SECS,
        },
        &state.jwt_encoding,
    )
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

    Ok(Json(LoginResp { token }))
}

/// GET /auth/status -> reachable only with a valid token.
pub async fn auth_status(Extension(claims): Extension<Claims>) -> Json<AuthStatus> {
    Json(AuthStatus {
        authenticated: true,
        user_id: claims.sub,
    })
}
