//! Job Board Admin API
//! Mission: Serve users, universities and role-scoped job postings to the dashboard

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jobboard_backend::{
    api::{create_router, AppState},
    auth::{JwtHandler, PasswordHasher},
    bootstrap,
    config::Config,
    store::Store,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize environment and logging
    load_env();
    init_tracing();

    let config = Config::parse();

    info!("Job board API starting");

    let store = Arc::new(
        Store::new(&config.database_path)
            .with_context(|| format!("Failed to open database at {}", config.database_path))?,
    );
    info!("Credential store opened at: {}", config.database_path);

    let hasher = PasswordHasher::new(config.bcrypt_cost);
    let jwt_handler =
        Arc::new(JwtHandler::new(config.jwt_secret()).with_expiration_hours(config.jwt_expiration_hours));

    if let Some((username, password)) = config.admin_credentials() {
        bootstrap::ensure_super_admin(&store, &hasher, username, password)?;
    }

    if config.seed_demo {
        bootstrap::seed_demo_catalog(&store)?;
    }

    let state = AppState {
        store,
        jwt_handler,
        hasher,
    };

    let app = create_router(state).layer(CorsLayer::permissive());

    // Start server
    let listener = TcpListener::bind(&config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("API server listening on {}", config.bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobboard_backend=debug,jobboard=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // Also try the crate root when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
