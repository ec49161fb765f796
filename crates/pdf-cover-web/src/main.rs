//! PDF Cover Web - Web server for adding covers and a logo watermark to PDF documents.

mod helpers;
mod routes;
mod state;
mod templates;


use anyhow::{Context, Result};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header},
    routing::{get, post},
};
use clap::Parser;
use pdf_cover_core::{AppConfig, CoverStamper};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use state::AppState;

#[derive(Parser, Debug)]
#[command(name = "pdf-cover-web")]
#[command(author, version, about = "PDF Cover Web Server", long_about = None)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind to
    #[arg(short, long, default_value = "3000")]
    port: u16,

    /// Directory holding front_cover.pdf, back_cover.pdf and logo.png
    #[arg(short, long, env = "PDF_COVER_ASSETS")]
    assets: Option<PathBuf>,

    /// Config file path
    #[arg(short, long, env = "PDF_COVER_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum request body size in megabytes
    #[arg(long, env = "MAX_UPLOAD_MB", default_value = "100")]
    max_upload_mb: usize,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Build the application router.
fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes();

    Router::new()
        // Pages
        .route("/", get(routes::index))
        .route("/health", get(routes::health))
        // API endpoints - binary responses
        .route("/api/process", post(routes::process_pdfs))
        // Middleware
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before parsing args so env vars are available)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Setup logging
    let default_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{default_level},lopdf=warn")));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load or create config
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path).context("Failed to load config file")?
    } else {
        AppConfig::load()
    };
    if let Some(dir) = &args.assets {
        config.assets.dir.clone_from(dir);
    }

    // Load assets once (fails fast if any is missing)
    let stamper = CoverStamper::new(config).context("Failed to load cover assets")?;
    let state = Arc::new(AppState::new(stamper, args.max_upload_mb));

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
