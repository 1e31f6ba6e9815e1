//! Configuration for the toyshop backend
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;

/// Toyshop - toy catalog REST backend with chat relay
#[derive(Parser, Debug, Clone)]
#[command(name = "toyshop")]
#[command(about = "Toy catalog backend: REST API over MongoDB plus a WebSocket chat relay")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:3030")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "toyshop")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "86400")]
    pub jwt_expiry_seconds: u64,

    /// Enable development mode (insecure default JWT secret)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Seed an admin account on startup if one does not exist
    #[arg(long, env = "SEED_ADMIN", default_value = "true")]
    pub seed_admin: bool,

    /// Password for the seeded admin account
    #[arg(long, env = "ADMIN_PASSWORD", default_value = "admin123")]
    pub admin_password: String,
}

impl Args {
    /// Get effective JWT secret (uses a fixed default in dev mode)
    pub fn jwt_secret(&self) -> Result<String, String> {
        if let Some(ref secret) = self.jwt_secret {
            return Ok(secret.clone());
        }
        if self.dev_mode {
            Ok("dev-only-insecure-secret".to_string())
        } else {
            Err("JWT_SECRET is required in production mode".to_string())
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode && self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required in production mode".to_string());
        }

        Ok(())
    }
}
