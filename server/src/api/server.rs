//! Router assembly
//!
//! Auth routes are mounted without the auth middleware; every resource
//! route sits behind `require_auth`, and the per-route guard extractors
//! take over from there.

use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Router, middleware};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::auth::{AuthManager, AuthState, OtpService, require_auth};
use crate::api::routes;
use crate::core::config::AppConfig;
use crate::data::TransactionalService;

/// Shared application state handed to the router builder
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub database: Arc<TransactionalService>,
    pub auth_manager: Arc<AuthManager>,
    pub otp: Arc<OtpService>,
}

fn cors_layer(origin: &str) -> CorsLayer {
    let mut cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(origin) {
        Ok(value) => {
            cors = cors.allow_origin(value);
        }
        Err(_) => {
            tracing::warn!(%origin, "Invalid CORS origin, cross-origin requests disabled");
        }
    }

    cors
}

/// Build the complete application router
pub fn build_router(state: &AppState) -> Router {
    let auth_routes = routes::auth::routes(
        state.auth_manager.clone(),
        state.otp.clone(),
        state.database.clone(),
    );

    let auth_state = AuthState {
        auth_manager: state.auth_manager.clone(),
        database: state.database.clone(),
    };

    let protected = Router::new()
        .merge(routes::users::routes(state.database.clone()))
        .merge(routes::companies::routes(state.database.clone()))
        .merge(routes::customers::routes(state.database.clone()))
        .merge(routes::invoices::routes(state.database.clone()))
        .merge(routes::invoice_items::routes(state.database.clone()))
        .layer(middleware::from_fn_with_state(auth_state, require_auth));

    Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api/v1/auth", auth_routes)
        .nest("/api/v1", protected)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.server.cors_origin))
}
