use crate::conversation::{Action, ChatMessage};
use crate::emotion::EmotionState;

/// Inputs accepted by a running session.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Submit a user message.
    Send(String),
    /// A keystroke in the input line.
    Typing,
    /// An action button was pressed; its payload is sent as a user message.
    Click(Action),
    Shutdown,
}

/// What the session reports back to the front end.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    MessageAppended(ChatMessage),
    EmotionChanged {
        current: EmotionState,
        previous: Option<EmotionState>,
    },
    LoadingChanged(bool),
    TypingChanged {
        typing: bool,
        caption: Option<String>,
    },
}
