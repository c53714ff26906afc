mod config;
mod dataset;
mod server;

use anyhow::{Context, Result};
use config::{parse_args, AgentConfig};
use server::BroadcastAdapter;
use std::path::PathBuf;
use std::sync::Arc;
use sustaingraph_layout::util::config as layout_config;
use sustaingraph_layout::{FrameLoop, KeywordOracle, LayoutConfig, LayoutController, SimilarityOracle};
use tokio::net::UnixListener;
use tokio::sync::broadcast;

fn init_tracing() {
    let _ = tracing_subscriber::fmt::try_init();
}

fn runtime_sock_path() -> PathBuf {
    // Wayland-friendly: prefer XDG_RUNTIME_DIR
    match std::env::var("XDG_RUNTIME_DIR") {
        Ok(dir) => PathBuf::from(dir).join("sustaingraph.sock"),
        Err(_) => PathBuf::from("/tmp/sustaingraph.sock"),
    }
}

fn resolve_config(args: &AgentConfig) -> Result<LayoutConfig> {
    let mut cfg = match &args.config {
        Some(path) => layout_config::load_from_path(path)?,
        None => layout_config::load_or_default(),
    };
    if let Some(seed) = args.seed {
        cfg.seed = seed;
    }
    if let Some(threshold) = args.threshold {
        cfg.threshold = threshold;
    }
    Ok(cfg)
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = parse_args()?;
    let cfg = resolve_config(&args)?;
    let data = dataset::load_or_demo(args.dataset.as_deref())?;

    let oracle: Arc<dyn SimilarityOracle> =
        Arc::new(KeywordOracle::with_jitter(args.jitter.unwrap_or(0), cfg.seed));
    let mut controller =
        LayoutController::from_entities(cfg, data.locals, data.standards, oracle)?;

    if let Some(ticks) = args.ticks {
        controller.start();
        for _ in 0..ticks {
            controller.frame();
        }
        controller.stop();
        tracing::info!(
            ticks,
            energy = controller.kinetic_energy(),
            settled = controller.is_settled(),
            "headless run finished"
        );
        println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
        return Ok(());
    }

    let sock_path = args.socket.clone().unwrap_or_else(runtime_sock_path);
    // Clean stale socket
    let _ = std::fs::remove_file(&sock_path);
    let listener = UnixListener::bind(&sock_path)
        .with_context(|| format!("binding {}", sock_path.display()))?;
    tracing::info!(path = %sock_path.display(), "sustaingraph-agent listening");

    // Broadcast so multiple viewers can subscribe
    let (frames_tx, _frames_rx) = broadcast::channel(64);
    let mut frames = FrameLoop::new(
        controller,
        Box::new(BroadcastAdapter::new(frames_tx.clone())),
    );
    let handle = frames.handle();
    frames.start().await?;

    tokio::select! {
        served = server::run(listener, handle, frames_tx) => served?,
        _ = tokio::signal::ctrl_c() => tracing::info!("interrupted, shutting down"),
    }

    let (controller, _) = frames.shutdown().await?;
    tracing::info!(ticks = controller.tick_count(), "layout stopped");
    let _ = std::fs::remove_file(&sock_path);
    Ok(())
}
