//! Authentication API endpoints
//!
//! The passwordless login flow: request an OTP, exchange it for a session
//! (access + refresh cookies), refresh the access token, and log out.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Deserialize;
use serde_json::{Value, json};
use validator::Validate;

use crate::api::auth::{AuthManager, OtpService};
use crate::api::extractors::ValidatedJson;
use crate::api::types::ApiError;
use crate::core::constants::{
    ACCESS_TOKEN_COOKIE, MSG_INVALID_OTP, MSG_USER_NOT_FOUND, REFRESH_TOKEN_COOKIE,
};
use crate::data::TransactionalService;

#[derive(Debug, Deserialize, Validate)]
pub struct RequestOtpRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits"))]
    pub otp: String,
}

/// Shared state for auth endpoints
#[derive(Clone)]
pub struct AuthRoutesState {
    pub auth_manager: Arc<AuthManager>,
    pub otp: Arc<OtpService>,
    pub database: Arc<TransactionalService>,
}

/// Create auth routes (mounted without the auth middleware)
pub fn routes(
    auth_manager: Arc<AuthManager>,
    otp: Arc<OtpService>,
    database: Arc<TransactionalService>,
) -> Router {
    let state = AuthRoutesState {
        auth_manager,
        otp,
        database,
    };

    Router::new()
        .route("/request-otp", post(request_otp))
        .route("/verify-otp", post(verify_otp))
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
        .with_state(state)
}

fn session_cookie(name: &'static str, value: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(time::Duration::seconds(0))
        .build()
}

/// Request a one-time password for an email.
///
/// First contact lazily materializes a temporary user stub, so the login
/// flow works for brand-new emails without a separate signup step.
pub async fn request_otp(
    State(state): State<AuthRoutesState>,
    ValidatedJson(request): ValidatedJson<RequestOtpRequest>,
) -> Result<Json<Value>, ApiError> {
    let repo = state.database.repository();

    let existing = repo
        .get_user_by_email(&request.email)
        .await
        .map_err(ApiError::from_data)?;
    if existing.is_none() {
        repo.create_temporary_user(&request.email)
            .await
            .map_err(ApiError::from_data)?;
    }

    let code = OtpService::generate_otp();
    state.otp.store_otp(&request.email, &code).await?;

    Ok(Json(json!({ "message": "OTP sent to your email." })))
}

/// Check an OTP without consuming a session (the code itself is still
/// single-use on success).
pub async fn verify_otp(
    State(state): State<AuthRoutesState>,
    ValidatedJson(request): ValidatedJson<VerifyOtpRequest>,
) -> Result<Json<Value>, ApiError> {
    let is_valid = state.otp.verify_otp(&request.email, &request.otp).await?;
    Ok(Json(json!({ "isValid": is_valid })))
}

/// Log in with an email and OTP; sets both session cookies.
pub async fn login(
    State(state): State<AuthRoutesState>,
    jar: CookieJar,
    ValidatedJson(request): ValidatedJson<VerifyOtpRequest>,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let is_valid = state.otp.verify_otp(&request.email, &request.otp).await?;
    if !is_valid {
        return Err(ApiError::unauthorized("INVALID_OTP", MSG_INVALID_OTP));
    }

    let user = state
        .database
        .repository()
        .get_user_by_email(&request.email)
        .await
        .map_err(ApiError::from_data)?
        .ok_or_else(|| ApiError::unauthorized("USER_NOT_FOUND", MSG_USER_NOT_FOUND))?;

    let tokens = state.auth_manager.issue_session(&user.email, &user.id).await?;

    let jar = jar
        .add(session_cookie(
            ACCESS_TOKEN_COOKIE,
            tokens.access_token,
            state.auth_manager.access_ttl_secs(),
        ))
        .add(session_cookie(
            REFRESH_TOKEN_COOKIE,
            tokens.refresh_token,
            state.auth_manager.refresh_ttl_secs(),
        ));

    tracing::info!(email = %user.email, "Login successful");
    Ok((jar, Json(json!({ "message": "Login successful" }))))
}

/// Mint a new access token from the refresh cookie.
pub async fn refresh_token(
    State(state): State<AuthRoutesState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), ApiError> {
    let refresh = jar.get(REFRESH_TOKEN_COOKIE).ok_or_else(|| {
        ApiError::unauthorized("TOKEN_REQUIRED", "Refresh token not provided")
    })?;

    let access_token = state
        .auth_manager
        .refresh_access_token(refresh.value())
        .await?;

    let jar = jar.add(session_cookie(
        ACCESS_TOKEN_COOKIE,
        access_token,
        state.auth_manager.access_ttl_secs(),
    ));

    Ok((jar, Json(json!({ "message": "Token refreshed successfully" }))))
}

/// Log out: clear both cookies unconditionally and revoke the refresh token
/// when one is present. Revocation is best-effort; a structurally broken
/// token still yields a clean logout.
pub async fn logout(
    State(state): State<AuthRoutesState>,
    jar: CookieJar,
) -> (CookieJar, Json<Value>) {
    if let Some(access) = jar.get(ACCESS_TOKEN_COOKIE) {
        match state.auth_manager.validate_access_token(access.value()) {
            Ok(claims) => tracing::info!(email = %claims.email(), "Logout"),
            Err(e) => tracing::debug!(error = %e, "Logout with invalid access token"),
        }
    }

    if let Some(refresh) = jar.get(REFRESH_TOKEN_COOKIE) {
        let token = refresh.value().to_string();
        if let Some(claims) = state.auth_manager.verify_refresh_token(&token) {
            state
                .auth_manager
                .revoke_refresh_token(&token, claims.email())
                .await;
        }
    }

    let jar = jar
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE))
        .remove(removal_cookie(REFRESH_TOKEN_COOKIE));

    (jar, Json(json!({ "message": "Logged out successfully" })))
}
