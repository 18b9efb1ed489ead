//! Core application infrastructure

pub mod cli;
pub mod config;
pub mod constants;

pub use crate::app::CoreApp;
pub use cli::{CliConfig, Commands};
pub use config::{AppConfig, AuthConfig, DatabaseConfig, EmailConfig, ServerConfig};

pub use crate::data::{SqliteService, TransactionalService};
