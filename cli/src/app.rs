use anyhow::{Context, Result};
use aura_core::{
    render_svg, Action, ChatMessage, EmotionState, RunningSession, Sender, SessionEvent,
    SessionHandle,
};
use crossterm::event::{Event, EventStream, KeyEvent, KeyEventKind};
use futures_util::StreamExt;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::output::{format_actions, format_face_cue, format_message, format_prompt};
use crate::terminal::{self, Edit, LineEditor, RawMode};

/// What to do with a submitted line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    Quit,
    Click(Action),
    Send(String),
    Nothing,
}

/// `/quit` and `/exit` leave; a bare number presses that action button.
pub fn interpret(line: &str, actions: &[Action]) -> Submission {
    let line = line.trim();
    if line.is_empty() {
        return Submission::Nothing;
    }
    if line.eq_ignore_ascii_case("/quit") || line.eq_ignore_ascii_case("/exit") {
        return Submission::Quit;
    }
    if let Ok(n) = line.parse::<usize>() {
        if let Some(action) = n.checked_sub(1).and_then(|i| actions.get(i)) {
            return Submission::Click(action.clone());
        }
    }
    Submission::Send(line.to_string())
}

struct ChatView {
    handle: SessionHandle,
    editor: LineEditor,
    emotion: EmotionState,
    loading: bool,
    caption: Option<String>,
    actions: Vec<Action>,
    face_cues: HashMap<String, String>,
    avatar: Option<PathBuf>,
}

impl ChatView {
    fn prompt(&self) -> String {
        format_prompt(
            &self.emotion,
            self.loading,
            self.caption.as_deref(),
            self.editor.buffer(),
        )
    }

    fn on_session_event(&mut self, event: SessionEvent) -> Result<()> {
        let mut lines = Vec::new();
        match event {
            SessionEvent::MessageAppended(message) => {
                lines.push(format_message(&message));
                if let Some(actions) = format_actions(&message.actions) {
                    lines.push(actions);
                }
                if message.sender == Sender::Agent {
                    self.actions = message.actions;
                }
            }
            SessionEvent::EmotionChanged { current, .. } => {
                self.emotion = current;
                self.mirror_avatar();
                if let Some(cue) = self.face_cues.get(current.label.as_str()) {
                    debug!(label = %current.label, cue = %cue, "Face cue");
                    if !self.loading && self.caption.is_none() {
                        lines.push(format_face_cue(&current, cue));
                    }
                }
            }
            SessionEvent::LoadingChanged(loading) => self.loading = loading,
            SessionEvent::TypingChanged { caption, .. } => self.caption = caption,
        }
        terminal::print_above(&lines, &self.prompt())
    }

    fn mirror_avatar(&self) {
        let Some(path) = &self.avatar else {
            return;
        };
        if let Err(e) = fs::write(path, render_svg(&self.emotion)) {
            warn!(path = %path.display(), error = %e, "Failed to write avatar");
        }
    }

    /// Returns false when the user wants to leave.
    async fn on_key(&mut self, key: KeyEvent) -> Result<bool> {
        match self.editor.handle(key) {
            Edit::Quit => return Ok(false),
            Edit::Unchanged => {}
            Edit::Changed => {
                self.handle.typing().await.context("Session ended")?;
                terminal::redraw_prompt(&self.prompt())?;
            }
            Edit::Submit(line) => match interpret(&line, &self.actions) {
                Submission::Quit => return Ok(false),
                Submission::Nothing => terminal::redraw_prompt(&self.prompt())?,
                Submission::Click(action) => {
                    info!(title = %action.title, "Action pressed");
                    self.handle.click(action).await.context("Session ended")?;
                }
                Submission::Send(text) => {
                    if self.loading {
                        // the input is disabled while loading; keep the text for later
                        self.editor.restore(text);
                        terminal::redraw_prompt(&self.prompt())?;
                    } else {
                        self.handle.send(text).await.context("Session ended")?;
                    }
                }
            },
        }
        Ok(true)
    }
}

/// Drive the terminal until the user quits; returns the transcript.
pub async fn run_chat(
    running: RunningSession,
    face_cues: HashMap<String, String>,
    avatar: Option<PathBuf>,
) -> Result<Vec<ChatMessage>> {
    let RunningSession {
        handle,
        mut events,
        task,
    } = running;

    let raw_mode = RawMode::enable()?;
    let mut keys = EventStream::new();
    let mut view = ChatView {
        handle: handle.clone(),
        editor: LineEditor::default(),
        emotion: EmotionState::sleepy(),
        loading: false,
        caption: None,
        actions: Vec::new(),
        face_cues,
        avatar,
    };
    terminal::redraw_prompt(&view.prompt())?;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => view.on_session_event(event)?,
                None => break,
            },
            key = keys.next() => match key {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if !view.on_key(key).await? {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("Failed to read terminal input"),
                None => break,
            },
        }
    }

    terminal::finish_line()?;
    drop(raw_mode);

    // the session may already be gone if its task ended first
    let _ = handle.shutdown().await;
    task.await.context("Session task failed")
}
