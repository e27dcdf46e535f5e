use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use voice_drop::{
    trigger, Config, CpalInput, EndpointProbe, Indicator, LogPixel, SessionController,
    SessionParts, SystemMemory, TriggerSource, WebhookDelivery,
};

/// Button-triggered recorder that uploads each clip to a webhook
#[derive(Debug, Parser)]
#[command(version)]
struct Args {
    /// Configuration file, without extension
    #[arg(long, default_value = "config/voice-drop")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Voice Drop v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Recording {}s at {}Hz to {}",
        cfg.recording.duration_secs,
        cfg.recording.sample_rate,
        cfg.recording.wav_path.display()
    );
    if cfg.delivery.endpoint.is_empty() {
        warn!("delivery.endpoint is not set; recordings will be kept but every upload fails");
    }

    let trigger = Arc::new(TriggerSource::new(Duration::from_millis(cfg.timing.debounce_ms)));
    let _edge_sources = trigger::spawn_edge_sources(Arc::clone(&trigger));

    let parts = SessionParts {
        indicator: Indicator::new(Box::new(LogPixel::default()), cfg.timing.settle()),
        input: Box::new(CpalInput::new()),
        memory: Box::new(SystemMemory),
        network: Box::new(EndpointProbe::new(cfg.delivery.endpoint.clone(), &cfg.network)),
        delivery: Box::new(
            WebhookDelivery::new(&cfg.delivery).context("Failed to build HTTP client")?,
        ),
    };

    let mut controller = SessionController::new(cfg, trigger, parts);

    if !controller.startup().await {
        controller.blink_offline().await;
    }

    controller.run().await;

    Ok(())
}
