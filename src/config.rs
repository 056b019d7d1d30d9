//! Process-wide configuration, parsed once at startup.
//!
//! Every option can come from the command line or the environment (a `.env`
//! file is loaded first by `main`).

use crate::auth::jwt::{DEFAULT_EXPIRATION_HOURS, MAX_EXPIRATION_HOURS};
use clap::Parser;
use tracing::warn;

/// Used when `JWT_SECRET` is not set. Fine for local development only.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

#[derive(Parser, Debug, Clone)]
#[command(name = "jobboard")]
#[command(about = "Job board admin API - users, universities and role-scoped job postings")]
pub struct Config {
    /// Address to bind the HTTP server to
    #[arg(long, env = "JOBBOARD_BIND", default_value = "0.0.0.0:5000")]
    pub bind: String,

    /// SQLite database file
    #[arg(long, env = "DATABASE_PATH", default_value = "./jobboard.db")]
    pub database_path: String,

    /// HMAC secret for signing bearer tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Token lifetime in hours
    #[arg(
        long,
        env = "JWT_EXPIRATION_HOURS",
        default_value_t = DEFAULT_EXPIRATION_HOURS,
        value_parser = clap::value_parser!(i64).range(1..=MAX_EXPIRATION_HOURS)
    )]
    pub jwt_expiration_hours: i64,

    /// bcrypt work factor
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST)]
    pub bcrypt_cost: u32,

    /// Username of the super_admin to create when none exists
    #[arg(long, env = "ADMIN_USERNAME")]
    pub admin_username: Option<String>,

    /// Password of the bootstrap super_admin
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    pub admin_password: Option<String>,

    /// Insert a few demo universities and postings on startup
    #[arg(long, env = "SEED_DEMO", default_value_t = false)]
    pub seed_demo: bool,
}

impl Config {
    /// Signing secret, falling back to the development secret with a warning
    pub fn jwt_secret(&self) -> &str {
        match self.jwt_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ => {
                warn!("JWT_SECRET not set - using development secret. CHANGE IN PRODUCTION!");
                DEV_JWT_SECRET
            }
        }
    }

    /// Bootstrap credentials when both halves are present
    pub fn admin_credentials(&self) -> Option<(&str, &str)> {
        match (self.admin_username.as_deref(), self.admin_password.as_deref()) {
            (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => Some((user, pass)),
            _ => None,
        }
    }
}
