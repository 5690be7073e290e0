//! curtain-pipeline - order pipeline service
//!
//! Serves the role endpoints over HTTP, or manages role access codes from the
//! command line.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use curtain_common::api::{load_credential_gate, set_role_credential, OpenGate, Role, RoleGate};
use curtain_common::config::{database_path, load_toml_config, resolve_root_folder, ROOT_FOLDER_ENV};
use curtain_common::db::init_database;
use curtain_pipeline::{build_router, AppState, Pipeline};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for curtain-pipeline
#[derive(Parser, Debug)]
#[command(name = "curtain-pipeline")]
#[command(about = "Custom curtain order pipeline service")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Folder holding curtain.db
    #[arg(short, long, global = true, env = "CURTAIN_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Port to listen on (overrides config)
    #[arg(short, long, global = true, env = "CURTAIN_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Set the access code for a role
    SetCredential {
        #[arg(long)]
        role: Role,
        #[arg(long)]
        code: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_toml_config(args.config.as_deref()).context("Failed to load config")?;

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{},tower_http=debug", config.logging.level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting curtain-pipeline v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = resolve_root_folder(
        args.root_folder.as_deref(),
        ROOT_FOLDER_ENV,
        config.root_folder.as_deref(),
    );
    let db_path = database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path, &config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    if let Some(Command::SetCredential { role, code }) = args.command {
        set_role_credential(&pool, role, &code)
            .await
            .with_context(|| format!("Failed to set access code for role '{}'", role))?;
        pool.close().await;
        return Ok(());
    }

    let gate: Arc<dyn RoleGate> = if config.auth.enabled {
        Arc::new(
            load_credential_gate(&pool)
                .await
                .context("Failed to load role credentials")?,
        )
    } else {
        warn!("Role gate disabled (auth.enabled = false): every request is allowed");
        Arc::new(OpenGate)
    };

    let pipeline = Pipeline::new(pool.clone(), gate, config.database.max_lock_wait_ms);
    let app = build_router(AppState::new(pipeline));

    let port = args.port.unwrap_or(config.port);
    let addr: SocketAddr = format!("{}:{}", config.bind_address, port)
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.bind_address))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("curtain-pipeline listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
