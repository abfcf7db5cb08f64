// Core of the Aura chat companion:
// - Gemini client and request/response types
// - Reply schema, local rules and the dispatcher
// - Emotion state machine and avatar rendering
// - Idle nudges and the session runtime
// - Configuration loading and shared error types

pub mod avatar;
pub mod bundle;
pub mod client;
pub mod config;
pub mod conversation;
pub mod dispatcher;
pub mod emotion;
pub mod errors;
pub mod idle;
pub mod local_rules;
pub mod reply;
pub mod retry;
pub mod session;
pub mod types;

pub use avatar::render_svg;
pub use bundle::{LocalBundle, LocalResponse, TypingCue};
pub use client::{GeminiClient, LanguageModel};
pub use config::*;
pub use conversation::{Action, AgentReply, ChatMessage, Conversation, ResponseMode, Sender};
pub use dispatcher::{Dispatcher, FailureKind, Route};
pub use emotion::{AnimationHint, EmotionLabel, EmotionMachine, EmotionState};
pub use errors::*;
pub use retry::RetryPolicy;
pub use session::{Command, RunningSession, Session, SessionEvent, SessionHandle, SessionSettings};
