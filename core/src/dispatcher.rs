//! Turns a user utterance into agent replies.
//!
//! Local rules answer without touching the network. Everything else goes to
//! the language model with rate-limit retry; a `query` reply triggers a second,
//! deferred lookup. Failures never escape: they become apology replies.

use rand::Rng;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::client::LanguageModel;
use crate::conversation::{AgentReply, ChatMessage};
use crate::emotion::{AnimationHint, EmotionLabel, EmotionState};
use crate::errors::AuraError;
use crate::local_rules::LocalRules;
use crate::reply::parse_reply;
use crate::retry::RetryPolicy;

pub const DEFAULT_LOCAL_DELAY: Duration = Duration::from_millis(750);

/// Where an utterance will be answered.
#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    Local { rule: &'static str, reply: AgentReply },
    Remote,
}

/// A reply for the session to append. The session answers on `shown` once
/// the message is in the conversation.
#[derive(Debug)]
pub struct DispatchStep {
    pub reply: AgentReply,
    pub shown: oneshot::Sender<()>,
}

/// Why a remote turn produced an apology instead of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Transport,
    Malformed,
    Empty,
    Lookup,
}

impl FailureKind {
    pub fn from_error(error: &AuraError) -> Self {
        if error.is_rate_limit() {
            FailureKind::RateLimited
        } else if error.is_malformed() {
            FailureKind::Malformed
        } else if matches!(error, AuraError::EmptyResponse) {
            FailureKind::Empty
        } else {
            FailureKind::Transport
        }
    }

    pub fn fallback_reply(&self) -> AgentReply {
        let (message, label) = match self {
            FailureKind::RateLimited => (
                "I'm feeling a little overwhelmed right now. Please wait a moment before trying again.",
                EmotionLabel::Worried,
            ),
            FailureKind::Transport => (
                "I'm sorry, I encountered a technical glitch. Please try again shortly.",
                EmotionLabel::Sad,
            ),
            FailureKind::Malformed => (
                "I seem to be having trouble forming my thoughts right now. Could you please try rephrasing your question?",
                EmotionLabel::Confused,
            ),
            FailureKind::Empty => (
                "I'm sorry, I received an empty response. Could you try again?",
                EmotionLabel::Sad,
            ),
            FailureKind::Lookup => (
                "I'm sorry, I couldn't find an answer to that. There might have been a problem with the search.",
                EmotionLabel::Sad,
            ),
        };
        AgentReply::local(message, EmotionState::new(label, AnimationHint::Shake))
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Transport => "transport",
            FailureKind::Malformed => "malformed",
            FailureKind::Empty => "empty",
            FailureKind::Lookup => "lookup",
        };
        f.write_str(name)
    }
}

#[derive(Clone)]
pub struct Dispatcher {
    model: Arc<dyn LanguageModel>,
    rules: Arc<LocalRules>,
    retry: RetryPolicy,
    local_delay: Duration,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("retry", &self.retry)
            .field("local_delay", &self.local_delay)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(model: Arc<dyn LanguageModel>, retry: RetryPolicy, local_delay: Duration) -> Self {
        Self {
            model,
            rules: Arc::new(LocalRules::default()),
            retry,
            local_delay,
        }
    }

    pub fn route<R: Rng + ?Sized>(&self, utterance: &str, rng: &mut R) -> Route {
        match self.rules.lookup(utterance, rng) {
            Some((rule, reply)) => Route::Local { rule, reply },
            None => Route::Remote,
        }
    }

    /// Produce the replies for one send, in order.
    ///
    /// `history` already ends with the user's message. Each reply waits for
    /// the session's acknowledgement before the next step starts.
    pub async fn run(&self, route: Route, history: Vec<ChatMessage>, steps: mpsc::Sender<DispatchStep>) {
        match route {
            Route::Local { rule, reply } => {
                debug!(rule, delay_ms = self.local_delay.as_millis() as u64, "Answering locally");
                tokio::time::sleep(self.local_delay).await;
                deliver(&steps, reply).await;
            }
            Route::Remote => self.run_remote(history, &steps).await,
        }
    }

    async fn run_remote(&self, history: Vec<ChatMessage>, steps: &mpsc::Sender<DispatchStep>) {
        let history = &history;
        let turn = self
            .retry
            .run("converse", |_| async move {
                let raw = self.model.converse(history).await?;
                parse_reply(&raw)
            })
            .await;

        let reply = match turn {
            Ok(reply) => reply,
            Err(e) => {
                let kind = FailureKind::from_error(&e);
                error!(failure = %kind, error = %e, "Chat turn failed");
                deliver(steps, kind.fallback_reply()).await;
                return;
            }
        };

        let Some(query) = reply.pending_query().map(str::to_string) else {
            deliver(steps, reply).await;
            return;
        };

        info!(query = %query, "Reply deferred to lookup");
        if !deliver(steps, reply).await {
            return;
        }

        let query = query.as_str();
        let lookup = self
            .retry
            .run("lookup", |_| async move { self.model.lookup(query).await })
            .await;

        let follow_up = match lookup {
            Ok(text) if !text.trim().is_empty() => {
                AgentReply::local(text.trim(), EmotionState::neutral())
            }
            Ok(_) => {
                warn!(failure = %FailureKind::Lookup, "Lookup returned no text");
                FailureKind::Lookup.fallback_reply()
            }
            Err(e) => {
                error!(failure = %FailureKind::Lookup, error = %e, "Lookup failed");
                FailureKind::Lookup.fallback_reply()
            }
        };
        deliver(steps, follow_up).await;
    }
}

/// Hand a reply to the session and wait until it has been appended.
/// Returns false once the session is gone.
async fn deliver(steps: &mpsc::Sender<DispatchStep>, reply: AgentReply) -> bool {
    let (shown, appended) = oneshot::channel();
    if steps.send(DispatchStep { reply, shown }).await.is_err() {
        debug!("Session closed before reply could be delivered");
        return false;
    }
    appended.await.is_ok()
}
