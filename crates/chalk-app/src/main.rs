//! Chalk application binary - composition root.
//!
//! 1. Load `.env`, install tracing, then read the TOML configuration and
//!    environment overrides
//! 2. Validate the completion-service credentials
//! 3. Build the OpenAI client and the chat orchestrator
//! 4. Serve the HTTP API, run the terminal chat, or extract a document

mod cli;
mod logging;
mod repl;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use chalk_api::routes;
use chalk_api::state::AppState;
use chalk_chat::{AssistantSettings, ChatOrchestrator, OpenAiResponsesClient};
use chalk_core::ChalkConfig;
use chalk_document::{extract_text, DocumentError, DocumentKind};

use cli::{CliArgs, Command};

/// How often idle sessions are swept from the registry.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

fn build_orchestrator(config: &ChalkConfig) -> Result<ChatOrchestrator, Box<dyn std::error::Error>> {
    let client = OpenAiResponsesClient::from_config(&config.openai)?;
    let settings = AssistantSettings::from_config(config)?;
    tracing::info!(
        model = %client.model(),
        vector_store = %settings.vector_store_id,
        "Completion client ready"
    );
    Ok(ChatOrchestrator::new(Arc::new(client), settings))
}

async fn serve(config: ChalkConfig) -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = build_orchestrator(&config)?;
    let state = AppState::new(config.clone(), orchestrator);

    let registry = Arc::clone(&state.registry);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = registry.purge_expired() {
                tracing::warn!(error = %e, "Session purge failed");
            }
        }
    });

    tracing::info!(
        "Chat at http://{}:{}/",
        config.server.host,
        config.server.port
    );
    routes::start_server(&config, state).await?;
    Ok(())
}

fn extract(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let filename = path.to_string_lossy();
    let kind = DocumentKind::detect(None, Some(&*filename), &bytes)
        .ok_or_else(|| DocumentError::UnsupportedFormat(filename.to_string()))?;
    let text = extract_text(kind, &bytes)?;
    println!("{}", text);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();

    // Tracing first, so config warnings are not lost.
    let log = logging::init(args.log_level.as_deref());
    tracing::info!("Starting Chalk v{}", env!("CARGO_PKG_VERSION"));

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = ChalkConfig::load_or_default(&config_file);
    config.apply_env();
    if let Err(e) = log.apply_config_level(&config.general.log_level) {
        tracing::warn!(error = %e, "Could not apply configured log level");
    }

    let command = args.command();
    if let Command::Extract { path } = &command {
        return extract(path);
    }

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Cannot start without completion-service credentials");
        return Err(e.into());
    }

    match command {
        Command::Serve { port, host } => {
            if let Some(p) = port {
                config.server.port = p;
            }
            if let Some(h) = host {
                config.server.host = h;
            }
            serve(config).await
        }
        Command::Chat { document } => {
            let orchestrator = build_orchestrator(&config)?;
            repl::run(&orchestrator, document).await
        }
        Command::Extract { .. } => Ok(()),
    }
}
