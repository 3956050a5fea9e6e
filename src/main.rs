mod prompt;
mod router;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use router::Router;

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("pesticide.json"));

    if let Err(e) = run(config_path) {
        eprintln!("pesticide: {e:#}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn run(config_path: PathBuf) -> Result<()> {
    init_logging()?;

    let config = pesticide_config::load_config(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    info!(
        "loaded {} adapter configuration(s) from {}",
        config.adapters.len(),
        config_path.display()
    );

    let (input_tx, input_rx) = mpsc::channel(64);
    let (output_tx, output_rx) = mpsc::channel(64);

    let router = Router::new(input_rx, input_tx.clone(), output_tx, config);
    let router_task = tokio::spawn(router.run());

    prompt::run(input_tx, output_rx).await?;
    router_task.await.context("router task panicked")?;

    info!("pesticide exited cleanly");
    Ok(())
}

/// Direct tracing output to a log file in the platform state directory so
/// it never bleeds into the prompt.
fn init_logging() -> Result<()> {
    let state_dir = dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(std::env::temp_dir);
    std::fs::create_dir_all(&state_dir).ok();
    let log_file = std::fs::File::create(state_dir.join("pesticide.log"))
        .context("failed to create log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}
