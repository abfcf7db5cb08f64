use anyhow::{Context, Result};
use aura_core::config::{get_default_config_dir, get_default_config_file, AuraConfig, APP_NAME};
use aura_core::{GeminiClient, Session};
use clap::Parser;
use colored::*;
use std::sync::Arc;
use tracing::info;

mod app;
mod cli;
mod logging;
mod output;
mod terminal;

use crate::cli::Args;
use crate::output::print_banner;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before anything reads them
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_default_config_file(APP_NAME)?,
    };
    let file_config = AuraConfig::load_from_file(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    let config = file_config.merge(&args.overrides());

    if args.save_config {
        config
            .save_to_file(&config_path)
            .with_context(|| format!("Failed to save config to {}", config_path.display()))?;
        println!("Saved configuration to {}", config_path.display());
        return Ok(());
    }

    let log_file = match &args.log_file {
        Some(path) => path.clone(),
        None => get_default_config_dir(APP_NAME)?.join("aura.log"),
    };
    logging::init(&log_file, config.log_level.as_deref())?;
    info!(config = %config_path.display(), model = config.model_name(), "Starting Aura");

    let client = match GeminiClient::new(&config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{}", format!("Cannot start Aura: {}", e).red());
            return Err(e).context("Failed to create Gemini client");
        }
    };
    let session = Session::from_config(&config, Arc::new(client))
        .context("Failed to prepare chat session")?
        .with_bootstrap(!args.no_welcome);
    let face_cues = session.bundle().face_cues.clone();

    print_banner(config.model_name());
    terminal::install_panic_hook();

    let transcript = app::run_chat(session.spawn(), face_cues, args.avatar.clone()).await?;
    info!(messages = transcript.len(), "Chat ended");
    println!("{}", format!("Bye! ({} messages)", transcript.len()).dimmed());

    Ok(())
}
