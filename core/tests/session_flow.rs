use async_trait::async_trait;
use aura_core::bundle::LocalBundle;
use aura_core::dispatcher::DEFAULT_LOCAL_DELAY;
use aura_core::{
    AnimationHint, AuraError, AuraResult, ChatMessage, Dispatcher, EmotionLabel, EmotionState,
    LanguageModel, ResponseMode, RetryPolicy, RunningSession, Sender, Session, SessionEvent,
    SessionSettings,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::sleep;

/// Scripted model that records every call it receives.
#[derive(Default)]
struct StubModel {
    turns: Mutex<VecDeque<AuraResult<String>>>,
    lookups: Mutex<VecDeque<AuraResult<String>>>,
    calls: Mutex<Vec<String>>,
    panic_on_converse: bool,
}

impl StubModel {
    fn scripted(turns: Vec<AuraResult<String>>, lookups: Vec<AuraResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            turns: Mutex::new(turns.into()),
            lookups: Mutex::new(lookups.into()),
            ..Default::default()
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn converse(&self, history: &[ChatMessage]) -> AuraResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("converse:{}", history.len()));
        if self.panic_on_converse {
            panic!("model exploded");
        }
        self.turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AuraError::EmptyResponse))
    }

    async fn lookup(&self, query: &str) -> AuraResult<String> {
        self.calls.lock().unwrap().push(format!("lookup:{}", query));
        self.lookups
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AuraError::EmptyResponse))
    }
}

fn start(model: Arc<StubModel>) -> RunningSession {
    let settings = SessionSettings {
        bootstrap: false,
        rng_seed: Some(42),
        ..Default::default()
    };
    let dispatcher = Dispatcher::new(model, RetryPolicy::default(), DEFAULT_LOCAL_DELAY);
    Session::new(settings, LocalBundle::embedded().unwrap(), dispatcher).spawn()
}

fn drain(events: &mut UnboundedReceiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        out.push(event);
    }
    out
}

fn agent_messages(events: &[SessionEvent]) -> Vec<ChatMessage> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::MessageAppended(m) if m.sender == Sender::Agent => Some(m.clone()),
            _ => None,
        })
        .collect()
}

fn current_emotions(events: &[SessionEvent]) -> Vec<EmotionLabel> {
    events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::EmotionChanged { current, .. } => Some(current.label),
            _ => None,
        })
        .collect()
}

fn rate_limited() -> AuraError {
    AuraError::HttpError {
        status_code: 429,
        message: "{\"error\":{\"status\":\"RESOURCE_EXHAUSTED\"}}".to_string(),
    }
}

#[tokio::test(start_paused = true)]
async fn greeting_is_answered_locally_after_delay() {
    let model = StubModel::scripted(vec![], vec![]);
    let mut running = start(model.clone());
    running.handle.send("Hi!").await.unwrap();

    sleep(Duration::from_millis(700)).await;
    let events = drain(&mut running.events);
    assert!(agent_messages(&events).is_empty());
    assert_eq!(current_emotions(&events).last(), Some(&EmotionLabel::Thinking));
    assert!(events.contains(&SessionEvent::LoadingChanged(true)));

    sleep(Duration::from_millis(100)).await;
    let events = drain(&mut running.events);
    let replies = agent_messages(&events);
    assert_eq!(replies.len(), 1);
    let emotion = replies[0].emotion.unwrap();
    assert_eq!(emotion.label, EmotionLabel::Happy);
    assert_eq!(emotion.animation_hint, AnimationHint::Bounce);
    assert_eq!(replies[0].mode, Some(ResponseMode::Local));
    assert_eq!(events.last(), Some(&SessionEvent::LoadingChanged(false)));

    assert!(model.calls().is_empty());
    let transcript = running.shutdown().await.unwrap();
    assert_eq!(transcript.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn query_reply_triggers_lookup_with_neutral_follow_up() {
    let model = StubModel::scripted(
        vec![Ok(r#"{"mode":"query","message":"Let me check that for you.","emotion":{"label":"thinking","animation_hint":"none"},"query":"current weather in Paris"}"#.to_string())],
        vec![Ok("It's 18°C and cloudy in Paris right now.".to_string())],
    );
    let mut running = start(model.clone());
    running
        .handle
        .send("What's the weather in Paris today?")
        .await
        .unwrap();

    sleep(Duration::from_millis(50)).await;
    let events = drain(&mut running.events);
    let replies = agent_messages(&events);

    assert_eq!(
        model.calls(),
        vec!["converse:1", "lookup:current weather in Paris"]
    );
    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0].text, "Let me check that for you.");
    assert_eq!(replies[0].mode, Some(ResponseMode::Query));
    assert_eq!(replies[1].text, "It's 18°C and cloudy in Paris right now.");
    assert_eq!(replies[1].emotion, Some(EmotionState::neutral()));
    assert!(replies[0].id < replies[1].id);
    assert_eq!(current_emotions(&events).last(), Some(&EmotionLabel::Neutral));
    assert_eq!(events.last(), Some(&SessionEvent::LoadingChanged(false)));

    running.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn exhausted_rate_limit_falls_back_to_worried() {
    let model = StubModel::scripted((0..4).map(|_| Err(rate_limited())).collect(), vec![]);
    let mut running = start(model.clone());
    running.handle.send("Tell me the news").await.unwrap();

    // attempts at 0s, 5s, 15s and 35s
    sleep(Duration::from_secs(34)).await;
    assert_eq!(model.calls().len(), 3);
    assert!(agent_messages(&drain(&mut running.events)).is_empty());

    sleep(Duration::from_secs(2)).await;
    let replies = agent_messages(&drain(&mut running.events));
    assert_eq!(replies.len(), 1);
    let emotion = replies[0].emotion.unwrap();
    assert_eq!(emotion.label, EmotionLabel::Worried);
    assert_eq!(emotion.animation_hint, AnimationHint::Shake);
    assert_eq!(model.calls().len(), 4);

    running.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn single_transport_failure_is_sad_without_retry() {
    let model = StubModel::scripted(
        vec![Err(AuraError::HttpError {
            status_code: 503,
            message: "Service Unavailable".to_string(),
        })],
        vec![],
    );
    let mut running = start(model.clone());
    running.handle.send("Explain monads").await.unwrap();

    // well past any backoff, before the first idle nudge
    sleep(Duration::from_secs(10)).await;
    let replies = agent_messages(&drain(&mut running.events));
    assert_eq!(model.calls().len(), 1);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].emotion.unwrap().label, EmotionLabel::Sad);

    running.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn panicking_dispatch_still_clears_loading() {
    let model = Arc::new(StubModel {
        panic_on_converse: true,
        ..Default::default()
    });
    let mut running = start(model);
    running.handle.send("Explain monads").await.unwrap();

    sleep(Duration::from_millis(50)).await;
    let events = drain(&mut running.events);
    let replies = agent_messages(&events);
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].emotion.unwrap().label, EmotionLabel::Sad);
    assert_eq!(events.last(), Some(&SessionEvent::LoadingChanged(false)));

    // the session is still usable afterwards
    running.handle.send("Hi!").await.unwrap();
    sleep(Duration::from_secs(1)).await;
    let replies = agent_messages(&drain(&mut running.events));
    assert_eq!(replies[0].emotion.unwrap().label, EmotionLabel::Happy);

    running.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn send_while_loading_is_rejected() {
    let model = StubModel::scripted(vec![], vec![]);
    let running = start(model);
    running.handle.send("Hi!").await.unwrap();
    running.handle.send("Thanks").await.unwrap();

    sleep(Duration::from_secs(2)).await;
    let transcript = running.shutdown().await.unwrap();
    let texts: Vec<_> = transcript.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0], "Hi!");
}

#[tokio::test(start_paused = true)]
async fn idle_nudges_fire_in_offset_order() {
    let model = StubModel::scripted(vec![], vec![]);
    let mut running = start(model);

    sleep(Duration::from_millis(19_900)).await;
    assert!(agent_messages(&drain(&mut running.events)).is_empty());

    sleep(Duration::from_millis(41_000)).await;
    let nudges = agent_messages(&drain(&mut running.events));
    let labels: Vec<_> = nudges.iter().map(|m| m.emotion.unwrap().label).collect();
    assert_eq!(
        labels,
        vec![EmotionLabel::Sad, EmotionLabel::Surprised, EmotionLabel::Angry]
    );
    assert!(nudges.iter().all(|m| m.mode == Some(ResponseMode::Local)));

    running.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn send_restarts_idle_sequence() {
    let model = StubModel::scripted(vec![], vec![]);
    let mut running = start(model);

    // first nudge at 20s, then the user answers at 25s
    sleep(Duration::from_secs(25)).await;
    assert_eq!(agent_messages(&drain(&mut running.events)).len(), 1);
    running.handle.send("Hi!").await.unwrap();

    // local reply lands at ~25.75s and the countdown restarts from there
    sleep(Duration::from_secs(20)).await;
    let replies = agent_messages(&drain(&mut running.events));
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].emotion.unwrap().label, EmotionLabel::Happy);

    sleep(Duration::from_secs(1)).await;
    let nudges = agent_messages(&drain(&mut running.events));
    assert_eq!(nudges.len(), 1);
    assert_eq!(nudges[0].emotion.unwrap().label, EmotionLabel::Sad);

    running.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn typing_snapshot_is_restored_unless_a_send_intervenes() {
    let model = StubModel::scripted(vec![], vec![]);
    let mut running = start(model);

    running.handle.typing().await.unwrap();
    sleep(Duration::from_millis(1000)).await;
    running.handle.typing().await.unwrap();
    sleep(Duration::from_millis(1000)).await;
    // second keystroke extended the debounce
    assert_eq!(
        current_emotions(&drain(&mut running.events)),
        vec![EmotionLabel::Sleepy, EmotionLabel::Listening]
    );

    sleep(Duration::from_millis(600)).await;
    assert_eq!(
        current_emotions(&drain(&mut running.events)),
        vec![EmotionLabel::Sleepy]
    );

    // typing then sending drops the snapshot; the reply wins
    running.handle.typing().await.unwrap();
    running.handle.send("Hi!").await.unwrap();
    sleep(Duration::from_secs(3)).await;
    let events = drain(&mut running.events);
    assert_eq!(
        current_emotions(&events),
        vec![EmotionLabel::Listening, EmotionLabel::Thinking, EmotionLabel::Happy]
    );
    assert!(events.contains(&SessionEvent::TypingChanged {
        typing: false,
        caption: None,
    }));

    running.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn clicking_an_action_sends_its_payload() {
    let model = StubModel::scripted(vec![], vec![]);
    let mut running = start(model.clone());
    running
        .handle
        .click(aura_core::Action::new("Cheer me up", "Cheer me up"))
        .await
        .unwrap();

    sleep(Duration::from_secs(1)).await;
    let events = drain(&mut running.events);
    let user: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::MessageAppended(m) if m.sender == Sender::User => Some(m.text.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(user, vec!["Cheer me up"]);
    assert_eq!(
        agent_messages(&events)[0].emotion.unwrap().label,
        EmotionLabel::Excited
    );
    assert!(model.calls().is_empty());

    running.shutdown().await.unwrap();
}
