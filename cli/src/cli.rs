use aura_core::config::AuraConfig;
use clap::Parser;
use std::path::PathBuf;

/// Chat with Aura, an emotive desk companion, in your terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the config file (defaults to ~/.config/aura/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Gemini model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Gemini API key (otherwise GEMINI_API_KEY or API_KEY)
    #[arg(long)]
    pub api_key: Option<String>,

    /// JSON file overriding the built-in idle/typing responses
    #[arg(long)]
    pub bundle: Option<PathBuf>,

    /// Mirror the avatar to this SVG file on every emotion change
    #[arg(long)]
    pub avatar: Option<PathBuf>,

    /// Seed for random choices, for reproducible sessions
    #[arg(long)]
    pub seed: Option<u64>,

    /// Where to write logs (defaults to ~/.config/aura/aura.log)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Skip the wake-up animation and welcome message
    #[arg(long, default_value_t = false)]
    pub no_welcome: bool,

    /// Write the effective configuration back to the config file and exit
    #[arg(long, default_value_t = false)]
    pub save_config: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    /// Config values given on the command line; these win over the file.
    pub fn overrides(&self) -> AuraConfig {
        AuraConfig {
            api_key: self.api_key.clone(),
            model_name: self.model.clone(),
            bundle_path: self.bundle.clone(),
            rng_seed: self.seed,
            log_level: match self.verbose {
                0 => None,
                1 => Some("debug".to_string()),
                _ => Some("trace".to_string()),
            },
            ..Default::default()
        }
    }
}
