//! AMS Server
//!
//! Careers portal and admin console with Axum backend.

use ams_database::Database;
use clap::Parser;
use tower_sessions::{cookie::time::Duration, session_store::ExpiredDeletion, Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing::{info, instrument};

mod auth;
mod config;
mod routes;
mod state;
mod templates;

use config::Config;
use state::AppState;

/// Idle time after which a console session expires
const SESSION_IDLE_HOURS: i64 = 8;

/// AMS Server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8080")]
    addr: String,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
#[instrument]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ams_server=debug".into()),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    // Parse CLI args
    let args = Args::parse();

    // Load configuration
    let config = Config::load(args.config.as_deref())?;
    info!(addr = %args.addr, "Starting AMS server");

    // Database
    let database = Database::new(&config.database_url).await?;
    database.migrate().await?;

    // Initialize application state
    let state = AppState::new(config, database)?;

    if let Some(admin) = state.config.admin.as_ref() {
        auth::ensure_admin(&state.pool, admin).await?;
    } else {
        info!("No bootstrap admin configured");
    }

    // Sessions live in the same SQLite database
    let session_store = SqliteStore::new(state.pool.clone());
    session_store.migrate().await?;
    session_store.delete_expired().await?;

    let sessions = SessionManagerLayer::new(session_store)
        .with_secure(state.config.secure_cookies)
        .with_expiry(Expiry::OnInactivity(Duration::hours(SESSION_IDLE_HOURS)));

    // Build Axum router
    let app = routes::app(state, sessions)
        // Add middleware
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                }),
        )
        .layer(tower_http::compression::CompressionLayer::new())
        .layer(tower_http::cors::CorsLayer::permissive());

    // Start server
    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    info!(addr = %args.addr, "Server listening");

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
