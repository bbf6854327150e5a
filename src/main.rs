use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use batch_admin::api::ApiClient;
use batch_admin::auth::AuthClient;
use batch_admin::config;
use batch_admin::gate::AccessGate;
use batch_admin::web::{self, AppState};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let endpoints = cfg.endpoints()?;
    let addr = cfg.listen_addr()?;

    let api = ApiClient::new(endpoints.clone(), cfg.api_timeout())?;
    let auth = AuthClient::new(
        endpoints.validate_token.clone(),
        cfg.auth.method,
        cfg.auth_timeout(),
    )?;
    let gate = AccessGate::new(Arc::new(auth), cfg.auth.on_unreachable);
    let state = Arc::new(AppState::new(Arc::new(api), gate));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, collection = %endpoints.collection, "starting batch admin console");
    axum::serve(listener, web::router(state.clone()))
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal(state: Arc<AppState>) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(?err, "failed to listen for shutdown signal");
    }
    info!("shutting down");
    state.console.lock().await.detach();
}
