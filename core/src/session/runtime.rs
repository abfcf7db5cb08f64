use rand::rngs::StdRng;
use rand::SeedableRng;
use std::future::pending;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::events::{Command, SessionEvent};
use super::SessionSettings;
use crate::bundle::{LocalBundle, TypingCue};
use crate::client::LanguageModel;
use crate::config::AuraConfig;
use crate::conversation::{Action, AgentReply, ChatMessage, Conversation};
use crate::dispatcher::{DispatchStep, Dispatcher, FailureKind, DEFAULT_LOCAL_DELAY};
use crate::emotion::{AnimationHint, EmotionLabel, EmotionMachine, EmotionState, Transition};
use crate::errors::{AuraError, AuraResult};
use crate::idle::IdleScheduler;
use crate::retry::RetryPolicy;

const COMMAND_BUFFER: usize = 32;
const STEP_BUFFER: usize = 4;

/// Cloneable sender side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: Uuid,
    commands: mpsc::Sender<Command>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn send(&self, text: impl Into<String>) -> AuraResult<()> {
        self.command(Command::Send(text.into())).await
    }

    pub async fn typing(&self) -> AuraResult<()> {
        self.command(Command::Typing).await
    }

    pub async fn click(&self, action: Action) -> AuraResult<()> {
        self.command(Command::Click(action)).await
    }

    pub async fn shutdown(&self) -> AuraResult<()> {
        self.command(Command::Shutdown).await
    }

    pub async fn command(&self, command: Command) -> AuraResult<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| AuraError::SessionClosed)
    }
}

/// A spawned session: commands in, events out, transcript on exit.
#[derive(Debug)]
pub struct RunningSession {
    pub handle: SessionHandle,
    pub events: mpsc::UnboundedReceiver<SessionEvent>,
    pub task: JoinHandle<Vec<ChatMessage>>,
}

impl RunningSession {
    /// Stop the session and return the final transcript.
    pub async fn shutdown(self) -> AuraResult<Vec<ChatMessage>> {
        // already stopped is fine, the task still yields the transcript
        let _ = self.handle.shutdown().await;
        self.task.await.map_err(|e| {
            error!(error = %e, "Session task failed");
            AuraError::SessionClosed
        })
    }
}

#[derive(Debug)]
pub struct Session {
    settings: SessionSettings,
    bundle: LocalBundle,
    dispatcher: Dispatcher,
}

impl Session {
    pub fn new(settings: SessionSettings, bundle: LocalBundle, dispatcher: Dispatcher) -> Self {
        Self {
            settings,
            bundle,
            dispatcher,
        }
    }

    /// Build a session from configuration, loading the bundle override if one is set.
    pub fn from_config(config: &AuraConfig, model: Arc<dyn LanguageModel>) -> AuraResult<Self> {
        let bundle = match &config.bundle_path {
            Some(path) => LocalBundle::load_from_file(path)?,
            None => LocalBundle::embedded()?,
        };
        let local_delay = config
            .local_reply_delay_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(DEFAULT_LOCAL_DELAY);
        let dispatcher = Dispatcher::new(model, RetryPolicy::from(config), local_delay);
        Ok(Self::new(SessionSettings::from(config), bundle, dispatcher))
    }

    /// Turn the wake-up and welcome sequence on or off.
    pub fn with_bootstrap(mut self, enabled: bool) -> Self {
        self.settings.bootstrap = enabled;
        self
    }

    pub fn bundle(&self) -> &LocalBundle {
        &self.bundle
    }

    /// Start the session task on the current runtime.
    pub fn spawn(self) -> RunningSession {
        let id = Uuid::new_v4();
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let span = info_span!("session", id = %id);
        let state = SessionLoop::new(self, event_tx);
        let task = tokio::spawn(state.run(command_rx).instrument(span));

        RunningSession {
            handle: SessionHandle {
                id,
                commands: command_tx,
            },
            events: event_rx,
            task,
        }
    }
}

/// Wake-up then welcome, counted from session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bootstrap {
    Pending {
        wake_at: Option<Instant>,
        welcome_at: Instant,
    },
    Done,
}

impl Bootstrap {
    fn deadline(&self) -> Option<Instant> {
        match self {
            Bootstrap::Pending { wake_at, welcome_at } => Some(wake_at.unwrap_or(*welcome_at)),
            Bootstrap::Done => None,
        }
    }
}

struct SessionLoop {
    settings: SessionSettings,
    bundle: LocalBundle,
    dispatcher: Dispatcher,
    events: mpsc::UnboundedSender<SessionEvent>,
    conversation: Conversation,
    emotions: EmotionMachine,
    idle: IdleScheduler,
    rng: StdRng,
    bootstrap: Bootstrap,
    typing_until: Option<Instant>,
    steps: Option<mpsc::Receiver<DispatchStep>>,
    in_flight: Option<JoinHandle<()>>,
}

impl SessionLoop {
    fn new(session: Session, events: mpsc::UnboundedSender<SessionEvent>) -> Self {
        let rng = match session.settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let idle = IdleScheduler::new(session.bundle.idle_schedule());
        Self {
            settings: session.settings,
            bundle: session.bundle,
            dispatcher: session.dispatcher,
            events,
            conversation: Conversation::new(),
            emotions: EmotionMachine::default(),
            idle,
            rng,
            bootstrap: Bootstrap::Done,
            typing_until: None,
            steps: None,
            in_flight: None,
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) -> Vec<ChatMessage> {
        let started = Instant::now();
        info!("Session started");
        self.emit(SessionEvent::EmotionChanged {
            current: *self.emotions.current(),
            previous: None,
        });

        if self.settings.bootstrap {
            self.bootstrap = Bootstrap::Pending {
                wake_at: Some(started + self.settings.wake_delay),
                welcome_at: started + self.settings.welcome_delay,
            };
        } else {
            self.idle.start(started);
        }

        loop {
            let idle_at = self.idle.deadline();
            let typing_at = self.typing_until;
            let bootstrap_at = self.bootstrap.deadline();

            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                Some(step) = next_step(&mut self.steps) => self.append_step(step),
                joined = join_dispatch(&mut self.in_flight) => self.finish_dispatch(joined),
                _ = sleep_until_opt(bootstrap_at) => self.advance_bootstrap(),
                _ = sleep_until_opt(typing_at) => self.typing_timed_out(),
                _ = sleep_until_opt(idle_at) => self.fire_idle(),
            }
        }

        if self.in_flight.is_some() {
            debug!("Leaving in-flight reply to finish on its own");
        }
        info!(messages = self.conversation.len(), "Session ended");
        self.conversation.into_messages()
    }

    fn emit(&self, event: SessionEvent) {
        // a closed receiver only means nobody is watching
        let _ = self.events.send(event);
    }

    fn emit_transition(&self, transition: Transition) {
        self.emit(SessionEvent::EmotionChanged {
            current: transition.current,
            previous: transition.previous,
        });
    }

    fn set_emotion(&mut self, next: EmotionState) {
        if self.typing_until.is_some() {
            debug!(label = %next.label, "Typing, holding emotion until it stops");
            self.emotions.set_behind_typing(next);
            return;
        }
        let transition = self.emotions.set(next);
        self.emit_transition(transition);
    }

    fn append_agent(&mut self, reply: AgentReply) {
        let emotion = reply.emotion;
        let message = self.conversation.push_agent(reply).clone();
        self.emit(SessionEvent::MessageAppended(message));
        self.set_emotion(emotion);
    }

    fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Send(text) => self.send(text),
            Command::Click(action) => {
                debug!(title = %action.title, "Action clicked");
                self.send(action.payload)
            }
            Command::Typing => self.keystroke(),
            Command::Shutdown => {}
        }
    }

    fn send(&mut self, text: String) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if self.is_loading() {
            warn!("Reply still in flight, message rejected");
            return;
        }
        let now = Instant::now();

        if self.bootstrap != Bootstrap::Done {
            debug!("Send during bootstrap, skipping welcome");
            self.bootstrap = Bootstrap::Done;
        }
        if self.typing_until.take().is_some() {
            self.emit(SessionEvent::TypingChanged {
                typing: false,
                caption: None,
            });
        }
        self.emotions.clear_snapshot();
        self.idle.user_activity(now);

        let message = self.conversation.push_user(text).clone();
        self.emit(SessionEvent::MessageAppended(message));

        let route = self.dispatcher.route(text, &mut self.rng);
        let history = self.conversation.messages().to_vec();
        let (step_tx, step_rx) = mpsc::channel(STEP_BUFFER);
        let dispatcher = self.dispatcher.clone();
        let task = tokio::spawn(
            async move { dispatcher.run(route, history, step_tx).await }.in_current_span(),
        );
        self.steps = Some(step_rx);
        self.in_flight = Some(task);

        self.idle.suspend();
        self.emit(SessionEvent::LoadingChanged(true));
        self.set_emotion(EmotionState::thinking());
    }

    fn keystroke(&mut self) {
        let now = Instant::now();
        self.idle.user_activity(now);
        // the input is disabled while a reply is loading
        if self.is_loading() {
            return;
        }

        let was_typing = self.typing_until.replace(now + self.settings.typing_idle).is_some();
        if was_typing {
            return;
        }
        if let Some(transition) = self.emotions.typing_started() {
            self.emit_transition(transition);
        }
        self.emit(SessionEvent::TypingChanged {
            typing: true,
            caption: self.typing_caption(TypingCue::Start),
        });
    }

    fn typing_timed_out(&mut self) {
        self.typing_until = None;
        if let Some(transition) = self.emotions.typing_stopped() {
            self.emit_transition(transition);
        }
        self.emit(SessionEvent::TypingChanged {
            typing: false,
            caption: self.typing_caption(TypingCue::Stop),
        });
    }

    fn typing_caption(&self, cue: TypingCue) -> Option<String> {
        self.bundle
            .typing(cue)
            .map(|response| response.message.clone())
            .filter(|caption| !caption.is_empty())
    }

    fn append_step(&mut self, step: DispatchStep) {
        self.append_agent(step.reply);
        if step.shown.send(()).is_err() {
            debug!("Dispatcher gone before acknowledgement");
        }
    }

    fn finish_dispatch(&mut self, joined: Result<(), JoinError>) {
        self.in_flight = None;
        self.steps = None;
        if let Err(e) = joined {
            error!(failure = %FailureKind::Transport, error = %e, "Dispatcher task failed");
            self.append_agent(FailureKind::Transport.fallback_reply());
        }
        self.emit(SessionEvent::LoadingChanged(false));
        self.idle.resume(Instant::now());
    }

    fn advance_bootstrap(&mut self) {
        let Bootstrap::Pending { wake_at, welcome_at } = self.bootstrap else {
            return;
        };
        if wake_at.is_some() {
            debug!("Waking up");
            self.bootstrap = Bootstrap::Pending {
                wake_at: None,
                welcome_at,
            };
            self.set_emotion(EmotionState::new(EmotionLabel::Curious, AnimationHint::Recoil));
            return;
        }

        self.bootstrap = Bootstrap::Done;
        let welcome = AgentReply::local(
            self.settings.welcome_message.clone(),
            EmotionState::new(EmotionLabel::Happy, AnimationHint::Bounce).with_confidence(0.9),
        )
        .with_actions(self.bundle.default_actions.clone());
        self.append_agent(welcome);
        self.idle.start(Instant::now());
    }

    fn fire_idle(&mut self) {
        if let Some(nudge) = self.idle.fire(Instant::now()) {
            debug!(message = %nudge.message, "Idle nudge");
            self.append_agent(nudge.to_reply());
        }
    }
}

async fn next_step(steps: &mut Option<mpsc::Receiver<DispatchStep>>) -> Option<DispatchStep> {
    match steps {
        Some(rx) => rx.recv().await,
        None => pending().await,
    }
}

async fn join_dispatch(task: &mut Option<JoinHandle<()>>) -> Result<(), JoinError> {
    match task {
        Some(handle) => handle.await,
        None => pending().await,
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => pending().await,
    }
}
