//! Authentication middleware

use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::CookieJar;
use serde_json::json;

use super::context::{OwnershipService, TokenPrincipal};
use super::jwt::JwtError;
use super::manager::AuthManager;
use crate::core::constants::ACCESS_TOKEN_COOKIE;
use crate::data::TransactionalService;

/// Authentication error response
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub error: &'static str,
    pub code: &'static str,
    pub message: String,
}

impl AuthError {
    pub fn required() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "TOKEN_REQUIRED",
            message: "Access token is missing".to_string(),
        }
    }

    pub fn expired() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "TOKEN_EXPIRED",
            message: "Access token has expired".to_string(),
        }
    }

    pub fn invalid() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: "unauthorized",
            code: "TOKEN_INVALID",
            message: "Invalid access token".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.error,
            "code": self.code,
            "message": self.message,
        });
        (self.status, Json(body)).into_response()
    }
}

/// Shared auth state for middleware
#[derive(Clone)]
pub struct AuthState {
    pub auth_manager: Arc<AuthManager>,
    pub database: Arc<TransactionalService>,
}

/// Authentication middleware for resource routes.
///
/// Reads the access token cookie and validates it. On success the token
/// principal and an `OwnershipService` are injected into request extensions
/// for the guard extractors; identity and ownership resolution happen there,
/// after this check, never before.
pub async fn require_auth(
    State(state): State<AuthState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let ownership = Arc::new(OwnershipService::new(state.database.clone()));
    request.extensions_mut().insert(ownership);

    let cookie = jar.get(ACCESS_TOKEN_COOKIE).ok_or_else(AuthError::required)?;

    let claims = state
        .auth_manager
        .validate_access_token(cookie.value())
        .map_err(|e| {
            tracing::debug!(error = %e, "Access token rejected");
            match e {
                JwtError::Expired => AuthError::expired(),
                _ => AuthError::invalid(),
            }
        })?;

    request.extensions_mut().insert(TokenPrincipal {
        email: claims.sub,
        user_id: claims.uid,
    });

    Ok(next.run(request).await)
}
