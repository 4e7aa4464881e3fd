//! examsweep server binary.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use examsweep_judge::{HttpJudgeClient, JudgeConfig, JudgeModel};
use examsweep_pipeline::CancelSignal;
use examsweep_server::{router, AppState};
use examsweep_storage::SqliteStorage;

#[derive(Debug, Parser)]
#[command(name = "examsweep", about = "Exam content quality-assurance sweep server")]
struct Args {
    /// Address to bind the HTTP server on
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: String,

    /// Path to the SQLite content database
    #[arg(long, default_value = "examsweep.db")]
    database: String,

    /// Judge endpoint URL (overrides EXAMSWEEP_JUDGE_URL)
    #[arg(long)]
    judge_url: Option<String>,

    /// Judge model identifier (overrides EXAMSWEEP_JUDGE_MODEL)
    #[arg(long)]
    judge_model: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let storage = SqliteStorage::new(&args.database)
        .await
        .with_context(|| format!("opening database {}", args.database))?;

    let judge = build_judge(&args)?;
    if judge.is_none() {
        warn!("no judge configured; sweeps run precheck-only and the fix phase is unavailable");
    }

    let cancel = CancelSignal::new();
    let state = AppState {
        storage: Arc::new(storage),
        judge,
        cancel: cancel.clone(),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("binding {}", args.bind))?;
    info!(addr = %args.bind, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown(cancel))
        .await
        .context("server error")?;

    Ok(())
}

fn build_judge(args: &Args) -> anyhow::Result<Option<Arc<dyn JudgeModel>>> {
    let mut config = match JudgeConfig::from_env() {
        Some(config) => config,
        None if args.judge_url.is_some() => {
            anyhow::bail!("--judge-url set but EXAMSWEEP_JUDGE_KEY is missing")
        }
        None => return Ok(None),
    };

    if let Some(url) = &args.judge_url {
        config.endpoint = url.clone();
    }
    if let Some(model) = &args.judge_model {
        config.model = model.clone();
    }

    let client = HttpJudgeClient::new(config).context("building judge client")?;
    Ok(Some(Arc::new(client)))
}

/// Resolve on ctrl-c, flipping the cancel signal first so in-flight
/// sweeps finish as partial DONE runs.
async fn shutdown(cancel: CancelSignal) {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "could not install ctrl-c handler");
        return;
    }
    info!("shutdown requested, cancelling in-flight sweeps");
    cancel.cancel();
}
