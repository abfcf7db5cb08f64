//! Canned responses served without a network call.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::conversation::{Action, AgentReply};
use crate::emotion::{EmotionLabel, EmotionState};
use crate::errors::{AuraError, AuraResult};

const EMBEDDED_BUNDLE: &str = include_str!("../assets/local_bundle.json");
const IDLE_PREFIX: &str = "::idle::";
const TYPING_PREFIX: &str = "::typing::";

/// A canned message and the emotion it carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalResponse {
    pub message: String,
    pub emotion: EmotionState,
}

impl LocalResponse {
    pub fn to_reply(&self) -> AgentReply {
        AgentReply::local(self.message.clone(), self.emotion)
    }
}

/// Which phase of typing a cue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingCue {
    Start,
    Stop,
}

impl TypingCue {
    pub fn key(&self) -> &'static str {
        match self {
            TypingCue::Start => "::typing::start",
            TypingCue::Stop => "::typing::stop",
        }
    }
}

/// One entry of the idle table, ordered by `offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct IdleNudge {
    pub offset: Duration,
    pub response: LocalResponse,
}

/// Static tables loaded once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalBundle {
    pub idle_tokens: HashMap<String, LocalResponse>,
    pub typing_tokens: HashMap<String, LocalResponse>,
    #[serde(default)]
    pub face_cues: HashMap<String, String>,
    #[serde(default)]
    pub default_actions: Vec<Action>,
}

impl LocalBundle {
    /// The bundle compiled into the binary.
    pub fn embedded() -> AuraResult<Self> {
        Self::from_json(EMBEDDED_BUNDLE)
    }

    pub fn from_json(json: &str) -> AuraResult<Self> {
        let bundle: Self = serde_json::from_str(json).map_err(|e| {
            AuraError::ConfigError(format!("Failed to parse local bundle: {}", e))
        })?;
        bundle.validate()?;
        Ok(bundle)
    }

    /// Loads a bundle override. Unlike the config file, a missing override is an error.
    pub fn load_from_file(path: &Path) -> AuraResult<Self> {
        if !path.exists() {
            return Err(AuraError::ConfigError(format!(
                "Local bundle {} does not exist",
                path.display()
            )));
        }
        let content = fs::read_to_string(path).map_err(|e| {
            AuraError::ConfigError(format!(
                "Failed to read local bundle {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    fn validate(&self) -> AuraResult<()> {
        for key in self.idle_tokens.keys() {
            parse_idle_offset(key)?;
        }
        for key in self.typing_tokens.keys() {
            if !key.starts_with(TYPING_PREFIX) {
                return Err(AuraError::ConfigError(format!(
                    "Typing token '{}' must start with '{}'",
                    key, TYPING_PREFIX
                )));
            }
        }
        Ok(())
    }

    /// Idle nudges sorted by their numeric offset.
    pub fn idle_schedule(&self) -> Vec<IdleNudge> {
        let mut nudges: Vec<IdleNudge> = self
            .idle_tokens
            .iter()
            .filter_map(|(key, response)| {
                parse_idle_offset(key).ok().map(|offset| IdleNudge {
                    offset,
                    response: response.clone(),
                })
            })
            .collect();
        nudges.sort_by_key(|nudge| nudge.offset);
        nudges
    }

    pub fn typing(&self, cue: TypingCue) -> Option<&LocalResponse> {
        self.typing_tokens.get(cue.key())
    }

    pub fn face_cue(&self, label: EmotionLabel) -> Option<&str> {
        self.face_cues.get(label.as_str()).map(String::as_str)
    }
}

fn parse_idle_offset(key: &str) -> AuraResult<Duration> {
    key.strip_prefix(IDLE_PREFIX)
        .and_then(|secs| secs.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .ok_or_else(|| {
            AuraError::ConfigError(format!(
                "Idle token '{}' must look like '{}<seconds>'",
                key, IDLE_PREFIX
            ))
        })
}
