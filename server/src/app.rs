//! Core application

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::api::auth::{AuthManager, OtpService};
use crate::api::server::{AppState, build_router};
use crate::core::cli::{self, Commands};
use crate::core::config::AppConfig;
use crate::core::constants::{APP_NAME, ENV_LOG};
use crate::data::TransactionalService;
use crate::email::build_mailer;

pub struct CoreApp {
    pub config: Arc<AppConfig>,
    pub database: Arc<TransactionalService>,
    pub auth_manager: Arc<AuthManager>,
    pub otp: Arc<OtpService>,
}

impl CoreApp {
    /// Run the application with CLI argument parsing
    pub async fn run() -> Result<()> {
        dotenvy::dotenv().ok();
        Self::init_logging();

        tracing::debug!("{} starting", APP_NAME);

        let (cli_config, command) = cli::parse();
        match command {
            Some(Commands::Start) | None => {}
        }

        let config = AppConfig::load(&cli_config)?;
        let app = Self::init(config).await?;
        app.start_server().await
    }

    fn init_logging() {
        let filter = EnvFilter::try_from_env(ENV_LOG)
            .unwrap_or_else(|_| EnvFilter::new("quickbill_server=info,tower_http=warn"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    /// Wire up services from a resolved configuration
    pub async fn init(config: AppConfig) -> Result<Self> {
        let config = Arc::new(config);

        let database = Arc::new(
            TransactionalService::init(&config.database)
                .await
                .context("Failed to initialize database")?,
        );

        let mailer = build_mailer(&config.email).context("Failed to initialize mailer")?;
        tracing::debug!(backend = %config.email.backend, "Mailer initialized");

        let auth_manager = Arc::new(AuthManager::new(database.clone(), config.auth.clone()));
        let otp = Arc::new(OtpService::new(
            database.clone(),
            mailer,
            config.auth.otp_ttl_minutes,
        ));

        Ok(Self {
            config,
            database,
            auth_manager,
            otp,
        })
    }

    async fn start_server(self) -> Result<()> {
        let state = AppState {
            config: self.config.clone(),
            database: self.database.clone(),
            auth_manager: self.auth_manager.clone(),
            otp: self.otp.clone(),
        };
        let router = build_router(&state);

        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;

        tracing::info!(%addr, "Server listening");

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .context("Server error")?;

        self.database.close().await;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
