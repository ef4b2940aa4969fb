use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use spoiler_core::{
    ChatCompletionsClient, Config, JobQueue, Pipeline, TaskRegistry, VideoDbClient,
};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::routes::{AppState, router};

mod error;
mod routes;

#[derive(Parser)]
#[command(name = "spoiler-server")]
#[command(about = "Serve the spoiler highlight pipeline over HTTP")]
struct Cli {
    /// Config file (defaults to $SPOILER_CONFIG or ~/.config/spoiler/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Periodically forget tasks that finished more than `ttl` ago.
fn spawn_task_sweeper(registry: TaskRegistry, ttl: Duration) -> JoinHandle<()> {
    let period = (ttl / 4).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let evicted = registry.evict_finished(ttl);
            if evicted > 0 {
                debug!("Evicted {evicted} finished tasks");
            }
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_env_overrides();

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;
    let video = VideoDbClient::new(http.clone(), &config.video)?;
    let llm = ChatCompletionsClient::new(
        http.clone(),
        &config.llm.provider,
        config.llm.model.as_deref(),
    )?;

    let server = config.server.clone();
    let pipeline = Pipeline::new(Arc::new(video), Arc::new(llm), config);
    let queue = JobQueue::start(
        Arc::new(pipeline),
        Default::default(),
        server.workers,
        server.queue_capacity,
    );
    let queue = Arc::new(queue);
    let state = AppState {
        registry: queue.registry().clone(),
        queue: Arc::clone(&queue),
        http,
    };

    let sweeper = spawn_task_sweeper(
        state.registry.clone(),
        Duration::from_secs(server.task_ttl_secs),
    );

    let addr = format!("{}:{}", server.bind, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await?;
    sweeper.abort();

    match Arc::try_unwrap(queue) {
        Ok(queue) => queue.shutdown().await,
        Err(_) => warn!("Job queue still shared at exit; skipping worker drain"),
    }
    Ok(())
}
