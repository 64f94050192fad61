//! askbot: single-page question answering front end.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger once at the configured level
//!   4. Build the LLM provider (fails without a credential for hosted models)
//!   5. Spawn Ctrl-C → shutdown signal watcher
//!   6. Run the configured channel until shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use askbot::comms::{self, AskState};
use askbot::error::AppError;
use askbot::{config, llm, logger};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let config = config::load()?;
    logger::init(&config.log_level, config.log_file.as_deref())?;

    info!(
        title = %config.title,
        provider = %config.llm.provider,
        channel = ?config.ui.channel,
        log_level = %config.log_level,
        "config loaded"
    );

    let provider = llm::providers::build(&config.llm, config.llm_api_key.clone())?;
    if config.llm.ping_on_start {
        match provider.ping().await {
            Ok(()) => info!(provider = provider.name(), "llm endpoint reachable"),
            Err(e) => warn!(provider = provider.name(), error = %e, "llm endpoint unreachable"),
        }
    }

    let state = Arc::new(AskState::from_config(&config, provider));
    let shutdown = CancellationToken::new();

    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, shutting down");
            ctrlc_token.cancel();
        }
    });

    let channel = comms::build(&config, state)?;
    comms::run(channel, shutdown).await
}
