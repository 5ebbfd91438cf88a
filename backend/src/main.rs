//! Klang backend server.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{fmt, EnvFilter};

use klang::storage::{JsonFileStorage, Storage};
use klang::{config::Config, create_app_with_state, state::AppState};
use klang_types::Document;

/// Klang - configuration editor for an audio DSP router
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding the configuration document
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Path to the configuration document
    #[arg(short, long)]
    document: Option<PathBuf>,

    /// Milliseconds of quiet before edits are written to disk
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Create a default configuration document if none exists
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration before logging is up; the log level may come from it
    let config = Config::from_figment(args.port, args.data_dir, args.document, args.debounce_ms)?;

    // Initialize logging - config log_level wins over RUST_LOG, default is info
    let filter = match config.log_level.as_deref() {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    // The guard must stay alive for the lifetime of the process
    let _guard = match config.log_file.as_ref() {
        Some(path) => {
            let directory = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            let file_name = path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("klang.log"));
            let appender = tracing_appender::rolling::never(directory, file_name);
            let (file_writer, guard) = tracing_appender::non_blocking(appender);
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .compact()
                .with_writer(file_writer.and(std::io::stdout))
                .init();
            Some(guard)
        }
        None => {
            fmt()
                .with_env_filter(filter)
                .with_target(false)
                .compact()
                .init();
            None
        }
    };

    info!("Starting klang server...");
    info!("Configuration document: {}", config.document_path.display());

    // Create or require the configuration document
    let storage = JsonFileStorage::new(&config.document_path);
    if !config.document_path.exists() {
        if args.init {
            info!("No configuration found, writing a default document");
            storage.save(&Document::default()).await?;
        } else {
            anyhow::bail!(
                "Configuration file not found: {}. Run with --init to create a default configuration.",
                config.document_path.display()
            );
        }
    }

    // Create application state and load the document
    let state = AppState::new(storage, config.debounce);
    state.load_from_storage().await?;

    let app = create_app_with_state(state.clone());

    // Start server - bind to 0.0.0.0 to be accessible from all interfaces (Docker, network, etc.)
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Set up graceful shutdown handler
    let shutdown_signal = async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down gracefully...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    // Write any edit still sitting in the debounce window
    state.flush().await;
    info!("Server shutting down");

    Ok(())
}
