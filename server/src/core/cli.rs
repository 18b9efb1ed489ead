use clap::{Parser, Subcommand};

use super::constants::{ENV_DATABASE_PATH, ENV_HOST, ENV_PORT};

#[derive(Parser)]
#[command(name = "quickbill")]
#[command(version, about = "Multi-tenant invoicing backend", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// SQLite database path (`:memory:` for an in-memory database)
    #[arg(long, global = true, env = ENV_DATABASE_PATH)]
    pub database: Option<String>,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        database: cli.database,
    };
    (config, cli.command)
}
