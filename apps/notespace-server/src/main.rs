mod config;
mod error;
mod handlers;
mod identity;
mod metrics;
mod routes;
mod server;
mod token;

use std::sync::Arc;

use axum::{extract::State, routing::get, Router};
use clap::{Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use notespace_storage::{Store, WorkspaceId};
use notespace_store_sqlite::SqliteStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::ServerConfig;
use server::NotespaceServer;

// ────────────────────────────────────── CLI Types ──────────────────────────────────────

#[derive(Parser)]
#[command(name = "notespace-server")]
#[command(about = "Notespace collaboration server CLI for administration and serving")]
struct Cli {
    /// Database URL (sqlite://path/to/db.db)
    #[arg(
        long,
        global = true,
        env = "DATABASE_URL",
        default_value = "sqlite://notespace.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve {
        /// API server address
        #[arg(long, default_value = "0.0.0.0:8000")]
        addr: String,

        /// Health check and metrics HTTP server address
        #[arg(long, default_value = "0.0.0.0:8080")]
        health_addr: String,
    },
    /// Workspace administration commands
    Workspace {
        #[command(subcommand)]
        workspace_cmd: WorkspaceCommand,
    },
}

#[derive(Subcommand)]
enum WorkspaceCommand {
    /// Print a workspace record
    Show {
        /// Workspace ID
        id: String,
    },
    /// Rotate the invitation code, invalidating every outstanding invitation link
    RotateCode {
        /// Workspace ID
        id: String,
        /// Output only the new code (for scripts)
        #[arg(long)]
        plain: bool,
    },
}

// ────────────────────────────────────── CLI Commands ──────────────────────────────────────

fn parse_workspace_id(raw: &str) -> Result<WorkspaceId, Box<dyn std::error::Error>> {
    raw.parse::<WorkspaceId>()
        .map_err(|e| format!("invalid workspace id {raw}: {e}").into())
}

async fn cmd_workspace_show(db_url: &str, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open(db_url).await?;
    let workspace_id = parse_workspace_id(id)?;

    let ws = store.get_workspace(&workspace_id).await?;
    let members = store.list_members(&workspace_id).await?;
    let notes = store.list_notes(&workspace_id).await?;

    println!("ID:          {}", ws.id);
    println!("Name:        {}", ws.name);
    println!("Description: {}", ws.description);
    println!("Created by:  {}", ws.created_by);
    println!("Created at:  {}", ws.created_at);
    println!(
        "Settings:    allowPublicRead={} requireApproval={}",
        ws.settings.allow_public_read, ws.settings.require_approval
    );
    println!("Notes:       {}", notes.len());
    println!("\nMembers:");
    for m in members {
        println!(
            "  {:<36} {:<10} joined {}",
            m.membership.user_id, m.membership.role, m.membership.joined_at
        );
    }

    Ok(())
}

async fn cmd_workspace_rotate_code(
    db_url: &str,
    id: &str,
    plain: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = SqliteStore::open(db_url).await?;
    let workspace_id = parse_workspace_id(id)?;

    let code = token::generate_invitation_code();
    store.set_invitation_code(&workspace_id, &code).await?;
    info!(workspace_id = %workspace_id, "invitation code rotated by operator");

    if plain {
        println!("{}", code);
    } else {
        println!("✓ Invitation code rotated\n");
        println!("Code: {}", code);
        println!("\nAll previously issued invitation links are now invalid.");
    }

    Ok(())
}

async fn cmd_serve(
    database_url: &str,
    addr: &str,
    health_addr: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr: std::net::SocketAddr = addr.parse()?;
    let health_addr: std::net::SocketAddr = health_addr.parse()?;

    // Fail on bad configuration before touching the database
    let config = ServerConfig::from_env()?;

    let store = SqliteStore::open(database_url).await?;
    let server = NotespaceServer::new(Arc::new(store), config);

    let metrics_handle = metrics::init_metrics();

    // Create a channel for HTTP readiness probe signaling
    let (readiness_tx, readiness_rx) = tokio::sync::watch::channel(false);

    // /healthz - liveness, /readyz - readiness, /metrics - Prometheus scrape
    let health_router = Router::new()
        .route("/healthz", get(health_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(HealthState {
            ready: readiness_rx,
            metrics: metrics_handle,
        });

    let api_listener = tokio::net::TcpListener::bind(addr).await?;
    let health_listener = tokio::net::TcpListener::bind(health_addr).await?;

    info!(addr = %api_listener.local_addr()?, "notespace API listening");
    info!(addr = %health_listener.local_addr()?, "health checks listening");

    let _ = readiness_tx.send(true);

    // Create a broadcast channel for shutdown signaling
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);
    let shutdown_tx_clone = shutdown_tx.clone();

    // Spawn a task to wait for shutdown signal and mark not-ready
    tokio::spawn(async move {
        shutdown_signal(Some(readiness_tx)).await;
        let _ = shutdown_tx_clone.send(());
    });

    let mut shutdown_rx1 = shutdown_tx.subscribe();
    let health_server =
        axum::serve(health_listener, health_router).with_graceful_shutdown(async move {
            let _ = shutdown_rx1.recv().await;
        });

    let api_router = routes::router(server);
    let mut shutdown_rx2 = shutdown_tx.subscribe();
    let api_server =
        axum::serve(api_listener, api_router).with_graceful_shutdown(async move {
            let _ = shutdown_rx2.recv().await;
        });

    // Run both servers concurrently - ensure both complete their shutdown sequences
    let (api_result, health_result) = tokio::join!(api_server, health_server);

    api_result?;
    health_result?;

    Ok(())
}

#[derive(Clone)]
struct HealthState {
    ready: tokio::sync::watch::Receiver<bool>,
    metrics: PrometheusHandle,
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn readiness_handler(
    State(state): State<HealthState>,
) -> Result<&'static str, axum::http::StatusCode> {
    if *state.ready.borrow() {
        Ok("ok")
    } else {
        Err(axum::http::StatusCode::SERVICE_UNAVAILABLE)
    }
}

async fn metrics_handler(State(state): State<HealthState>) -> String {
    state.metrics.render()
}

async fn shutdown_signal(readiness_tx: Option<tokio::sync::watch::Sender<bool>>) {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGTERM handler");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "failed to install SIGINT handler");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down gracefully");
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down gracefully");
        }
    }

    // Mark not ready on shutdown for clean traffic drain
    if let Some(tx) = readiness_tx {
        let _ = tx.send(false);
    }
}

// ────────────────────────────────────── Main ──────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve { addr, health_addr } => {
            cmd_serve(&cli.database_url, &addr, &health_addr).await?;
        }
        Command::Workspace { workspace_cmd } => match workspace_cmd {
            WorkspaceCommand::Show { id } => {
                cmd_workspace_show(&cli.database_url, &id).await?;
            }
            WorkspaceCommand::RotateCode { id, plain } => {
                cmd_workspace_rotate_code(&cli.database_url, &id, plain).await?;
            }
        },
    }

    Ok(())
}
