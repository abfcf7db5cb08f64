//! The live chat session.
//!
//! One task owns the conversation, the emotion machine, the idle scheduler
//! and every timer. Callers talk to it through a [`SessionHandle`] and
//! observe it through [`SessionEvent`]s.

pub mod events;
pub mod runtime;

pub use events::{Command, SessionEvent};
pub use runtime::{RunningSession, Session, SessionHandle};

use std::time::Duration;

use crate::config::AuraConfig;

pub const DEFAULT_TYPING_IDLE: Duration = Duration::from_millis(1500);
pub const DEFAULT_WAKE_DELAY: Duration = Duration::from_millis(800);
pub const DEFAULT_WELCOME_DELAY: Duration = Duration::from_millis(2200);
pub const DEFAULT_WELCOME_MESSAGE: &str =
    "Hello! I'm Aura, your desk companion. How can I help you today?";

/// Timing and startup behaviour of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    /// Quiet time after the last keystroke before typing is considered stopped.
    pub typing_idle: Duration,
    pub wake_delay: Duration,
    pub welcome_delay: Duration,
    pub welcome_message: String,
    /// Run the wake-up and welcome sequence. When off, idle nudges arm immediately.
    pub bootstrap: bool,
    /// Fixed seed for the random choices; entropy when `None`.
    pub rng_seed: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            typing_idle: DEFAULT_TYPING_IDLE,
            wake_delay: DEFAULT_WAKE_DELAY,
            welcome_delay: DEFAULT_WELCOME_DELAY,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            bootstrap: true,
            rng_seed: None,
        }
    }
}

impl From<&AuraConfig> for SessionSettings {
    fn from(config: &AuraConfig) -> Self {
        let millis = |value: Option<u64>, default: Duration| {
            value.map(Duration::from_millis).unwrap_or(default)
        };
        Self {
            typing_idle: millis(config.typing_idle_ms, DEFAULT_TYPING_IDLE),
            wake_delay: millis(config.wake_delay_ms, DEFAULT_WAKE_DELAY),
            welcome_delay: millis(config.welcome_delay_ms, DEFAULT_WELCOME_DELAY),
            welcome_message: config
                .welcome_message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_WELCOME_MESSAGE.to_string()),
            bootstrap: true,
            rng_seed: config.rng_seed,
        }
    }
}
