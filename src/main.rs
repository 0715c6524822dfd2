//! persona-bot entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config (fatal on malformed values)
//!   3. Init logger at the configured level
//!   4. Start comms channels; Ctrl-C shuts them down

use persona_bot::{comms, config, error::AppError, logger};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present: ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level)?;

    info!(
        persona = %config.persona.name,
        provider = %config.llm.provider,
        substyle = %config.llm.substyle,
        timeout_secs = config.llm.response_timeout.as_secs(),
        throbber = %config.throbber.style,
        "config loaded"
    );

    let shutdown = CancellationToken::new();
    let channels = comms::start(&config, shutdown.clone())?;

    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrl_c_token.cancel();
        }
    });

    channels.join().await
}
