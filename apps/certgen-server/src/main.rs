//! Certificate Generation Server
//!
//! Stamps a list of names onto a PDF template, one page per name, and
//! returns the whole batch as a single PDF. Provides REST API endpoints for:
//!
//! - CSV name preview
//! - Certificate bundle generation
//!
//! Configuration comes from command-line flags, environment variables and
//! an optional `.env` file.

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use clap::Parser;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod state;
#[cfg(test)]
mod tests;

use api::{handle_generate_certificates, handle_health, handle_names_preview};
pub use state::AppState;

/// Command-line arguments for the certificate server
#[derive(Parser, Debug)]
#[command(name = "certgen-server")]
#[command(about = "Batch certificate generation server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "CERTGEN_PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "CERTGEN_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Directory the decorative font path is resolved against
    #[arg(long, env = "CERTGEN_FONT_DIR", default_value = "public")]
    font_dir: PathBuf,

    /// Fetch fonts over HTTP from this base URL instead of the font directory
    #[arg(long, env = "CERTGEN_FONT_BASE_URL")]
    font_base_url: Option<String>,

    /// Maximum request body size in megabytes
    #[arg(long, env = "CERTGEN_MAX_UPLOAD_MB", default_value = "25")]
    max_upload_mb: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Build the application router
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handle_health))
        // API endpoints
        .route("/api/names/preview", post(handle_names_preview))
        .route("/api/certificates", post(handle_generate_certificates))
        // Apply middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(max_body_bytes)),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting certificate server on {}:{}", args.host, args.port);

    let state = AppState::from_config(args.font_dir, args.font_base_url);
    let app = router(state, args.max_upload_mb * 1024 * 1024);

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Max upload size: {} MB", args.max_upload_mb);

    axum::serve(listener, app).await?;

    Ok(())
}
