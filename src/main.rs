use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ephemeral_audio::audio::{write_tone, ToneSpec};
use ephemeral_audio::{
    create_router, AppState, Config, JsonFileStore, Library, PlayLedger, RegionLocks,
    ServiceInfo, StreamService,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ephemeral-audio", version, about = "Audio streaming that wears recordings out as they are played")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the streaming server
    Serve {
        /// Config file (extension optional)
        #[arg(long, default_value = "config/ephemeral-audio")]
        config: String,

        /// Override the configured HTTP port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Write a sine test tone as 16-bit PCM WAV
    Tone {
        path: PathBuf,

        #[arg(long, default_value_t = 5.0)]
        duration: f64,

        #[arg(long, default_value_t = 44100)]
        sample_rate: u32,

        #[arg(long, default_value_t = 1)]
        channels: u16,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Serve { config, port } => serve(&config, port).await,
        Command::Tone {
            path,
            duration,
            sample_rate,
            channels,
        } => {
            let tone = ToneSpec {
                duration_secs: duration,
                sample_rate,
                channels,
                ..ToneSpec::default()
            };
            write_tone(&path, &tone)?;
            Ok(())
        }
    }
}

async fn serve(config_path: &str, port: Option<u16>) -> Result<()> {
    let cfg = Config::load(config_path)?;
    let port = port.unwrap_or(cfg.service.http.port);

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Audio directory: {}", cfg.storage.audio_dir);
    info!("Metadata directory: {}", cfg.storage.metadata_dir);
    info!(
        "Regions of {}s, {}% dropout per play",
        cfg.degradation.segment_duration, cfg.degradation.decay_rate
    );

    std::fs::create_dir_all(&cfg.storage.audio_dir)
        .with_context(|| format!("Failed to create {}", cfg.storage.audio_dir))?;
    let store = JsonFileStore::new(&cfg.storage.metadata_dir)
        .with_context(|| format!("Failed to create {}", cfg.storage.metadata_dir))?;

    let ledger = Arc::new(PlayLedger::new(
        Arc::new(store),
        cfg.degradation.segment_duration,
    ));
    let library = Arc::new(Library::new(
        &cfg.storage.audio_dir,
        cfg.degradation.segment_duration,
    ));

    // A failed scan leaves the server up with whatever it could load
    match library.scan(&ledger).await {
        Ok(report) => {
            for name in &report.added {
                info!("  - {}", name);
            }
        }
        Err(e) => warn!("Initial catalog scan failed: {}", e),
    }

    let service = StreamService::new(
        Arc::clone(&library),
        RegionLocks::new(),
        Arc::clone(&ledger),
        cfg.degradation.stream_config(),
    );

    for track in service.listing() {
        info!(
            "  {} ({:.1}% degraded, {} sessions)",
            track.filename, track.overall_degradation, track.total_streams
        );
    }

    if cfg.storage.rescan_interval_secs > 0 {
        let library = Arc::clone(&library);
        let ledger = Arc::clone(&ledger);
        let every = Duration::from_secs(cfg.storage.rescan_interval_secs);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = library.scan(&ledger).await {
                    warn!("Catalog rescan failed: {}", e);
                }
            }
        });
    }

    let state = AppState::new(
        service,
        ServiceInfo {
            name: cfg.service.name.clone(),
            audio_dir: cfg.storage.audio_dir.clone(),
            metadata_dir: cfg.storage.metadata_dir.clone(),
            decay_rate: cfg.degradation.decay_rate,
        },
    );
    let app = create_router(state, &cfg.service.cors_origin);

    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
