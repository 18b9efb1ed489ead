//! API server and routes

pub mod auth;
pub mod extractors;
pub mod routes;
pub mod server;
pub mod types;

pub use auth::{AuthManager, OtpService};
pub use server::{AppState, build_router};
