use clap::{ArgAction, Parser, Subcommand};
use std::{net::SocketAddr, path::PathBuf};

#[derive(Parser, Debug)]
#[command(name = "setlog", version, about = "HTTP API server for setlog")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub config: Config,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate an Argon2 password hash for authentication
    HashPassword,
    /// Parse a workout description and print the exercises as JSON
    Parse {
        /// e.g. "10x4 pushup, 10,10,8,6 pull ups between"
        text: String,
    },
}

/// setlog server configuration
#[derive(Parser, Debug, Clone)]
pub struct Config {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease verbosity (-q, -qq, -qqq)
    #[arg(short = 'q', action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Address to bind the HTTP server to
    #[arg(long, env = "SETLOG_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind: SocketAddr,

    /// Database path
    #[arg(long, env = "SETLOG_DATABASE_PATH", default_value = "setlog.sqlite")]
    pub database_path: String,

    /// Log file path (logs are written to stdout + this file)
    #[arg(long, env = "SETLOG_LOG_FILE", default_value = "setlog.logs")]
    pub log_file: PathBuf,

    /// CORS allowed origin (e.g., <https://setlog.yourdomain.com>)
    /// If not set, allows all origins
    #[arg(long, env = "SETLOG_CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// JWT secret for authentication (if not set, generates a random one)
    #[arg(long, env = "SETLOG_JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Argon2 password hash for authentication (required for login)
    /// Generate with: setlog hash-password
    #[arg(long, env = "SETLOG_PASSWORD_HASH")]
    pub password_hash: Option<String>,
}

impl Config {
    #[must_use]
    pub fn verbosity_delta(&self) -> i16 {
        i16::from(self.verbose) - i16::from(self.quiet)
    }
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        match self.verbosity_delta() {
            d if d <= -2 => "error",
            -1 => "warn",
            0 => "info,setlog=info,axum=info,tower_http=info",
            1 => "debug,setlog=debug,axum=info,tower_http=info,sqlx=warn",
            2 => "trace,setlog=trace,axum=debug,tower_http=trace,sqlx=info,hyper=info",
            _ => "trace,setlog=trace,axum=trace,tower_http=trace,sqlx=debug,hyper=debug",
        }
    }
}
