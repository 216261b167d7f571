use anyhow::{Context, Result};
use armory_watch::{
    create_router, AppState, Config, SessionController, SessionRunner, SocketIoTransport,
    SoundPlayerFactory, Transport,
};
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Watch a remote weapon-detection job and raise alerts as frames arrive
#[derive(Debug, Parser)]
#[command(name = "armory-watch", version)]
struct Args {
    /// Config file path (extension optional)
    #[arg(short, long, default_value = "config/armory-watch")]
    config: String,

    /// Detection server base URL
    #[arg(long)]
    server: Option<String>,

    /// Room to join; must match the session_id sent with the upload
    #[arg(long)]
    session_id: Option<String>,

    /// Start with alert sounds muted (builds without the `playback` feature are always silent)
    #[arg(long)]
    mute: bool,

    /// Save JPEGs of alerted frames into this directory
    #[arg(long)]
    frames_dir: Option<PathBuf>,

    /// Disable the local HTTP API
    #[arg(long)]
    no_http: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .init();

    let mut cfg = Config::load(&args.config)?;
    if let Some(url) = args.server {
        cfg.server.url = url;
    }
    if let Some(id) = args.session_id {
        cfg.session.session_id = Some(id);
    }
    if args.mute {
        cfg.session.muted = true;
    }
    if let Some(dir) = args.frames_dir {
        cfg.alerts.frames_dir = Some(dir);
    }
    if args.no_http {
        cfg.http.enabled = false;
    }

    info!("Armory Watch v{}", env!("CARGO_PKG_VERSION"));
    info!("Detection server: {}", cfg.server.url);

    let session_config = cfg.session_config();
    info!("Session ID: {} (send this with the upload)", session_config.session_id);

    let player = SoundPlayerFactory::create(cfg.sound_config());
    let controller = SessionController::new(session_config, player);
    let runner = SessionRunner::new(controller);
    let handle = runner.handle();

    let mut transport = SocketIoTransport::new(cfg.socket_config());
    let channels = transport
        .start()
        .await
        .with_context(|| format!("Failed to start {} transport", transport.name()))?;

    let runner_task = tokio::spawn(runner.run(channels));

    if cfg.http.enabled {
        let addr = format!("{}:{}", cfg.http.bind, cfg.http.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind HTTP API on {}", addr))?;
        info!("HTTP API listening on http://{}", addr);

        let app = create_router(AppState::new(handle.clone()));
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("HTTP server error: {}", e);
            }
        });
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("Shutting down");

    transport.stop().await?;
    let last = runner_task.await.context("Session runner panicked")??;

    info!(
        "Session {} ended: progress {}%, {} frame(s) in history, result: {}",
        last.session_id,
        last.progress_percent,
        last.history_len,
        last.result
            .as_ref()
            .and_then(|r| r.result_url.as_deref())
            .unwrap_or("<none>")
    );
    if let Some(err) = &last.last_error {
        error!("Last processing error: {}", err);
    }

    Ok(())
}
