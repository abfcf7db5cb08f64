use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::emotion::EmotionState;

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Agent,
}

impl Sender {
    /// Role name expected by the Gemini API.
    pub fn api_role(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Agent => "model",
        }
    }
}

/// How a reply was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseMode {
    Local,
    Query,
}

/// Suggested follow-up: clicking it sends `payload` as a user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Action {
    pub title: String,
    pub payload: String,
}

impl Action {
    pub fn new(title: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            payload: payload.into(),
        }
    }
}

/// Agent reply content before it is stamped into the conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentReply {
    pub message: String,
    pub emotion: EmotionState,
    pub mode: ResponseMode,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl AgentReply {
    pub fn local(message: impl Into<String>, emotion: EmotionState) -> Self {
        Self {
            message: message.into(),
            emotion,
            mode: ResponseMode::Local,
            actions: Vec::new(),
            query: None,
        }
    }

    pub fn with_actions(mut self, actions: Vec<Action>) -> Self {
        self.actions = actions;
        self
    }

    /// The deferred lookup this reply asks for, if any.
    pub fn pending_query(&self) -> Option<&str> {
        match (self.mode, self.query.as_deref()) {
            (ResponseMode::Query, Some(query)) if !query.trim().is_empty() => Some(query.trim()),
            _ => None,
        }
    }
}

/// One entry of the conversation. Never modified after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: i64,
    pub sender: Sender,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<ResponseMode>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

/// Hands out unique, increasing message ids derived from the wall clock.
#[derive(Debug, Default, Clone)]
pub struct MessageIdGen {
    last: i64,
}

impl MessageIdGen {
    pub fn next_id(&mut self) -> i64 {
        self.next_at(Utc::now().timestamp_millis())
    }

    fn next_at(&mut self, now_millis: i64) -> i64 {
        let id = now_millis.max(self.last + 1);
        self.last = id;
        id
    }
}

/// Append-only message history for one session.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    ids: MessageIdGen,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> &ChatMessage {
        let message = ChatMessage {
            id: self.ids.next_id(),
            sender: Sender::User,
            text: text.into(),
            emotion: None,
            mode: None,
            actions: Vec::new(),
            query: None,
        };
        self.push(message)
    }

    pub fn push_agent(&mut self, reply: AgentReply) -> &ChatMessage {
        let message = ChatMessage {
            id: self.ids.next_id(),
            sender: Sender::Agent,
            text: reply.message,
            emotion: Some(reply.emotion),
            mode: Some(reply.mode),
            actions: reply.actions,
            query: reply.query,
        };
        self.push(message)
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        // just pushed, never empty
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<ChatMessage> {
        self.messages
    }
}
