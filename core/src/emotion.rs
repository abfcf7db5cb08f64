//! Emotion labels, animation hints and the label → appearance mapping.
//!
//! The mapping functions are total over [`EmotionLabel`]; labels without a
//! dedicated arm share the `neutral` look.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::avatar;

/// Closed set of affects the avatar can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum EmotionLabel {
    Happy,
    Excited,
    Joyful,
    Ecstatic,
    Playful,
    Giggling,
    Proud,
    Relieved,
    Hopeful,
    Sad,
    Crying,
    Lonely,
    Guilty,
    Angry,
    Frustrated,
    Surprised,
    Amazed,
    Shy,
    Embarrassed,
    Bashful,
    Affectionate,
    Thinking,
    Curious,
    Determined,
    Worried,
    Nervous,
    Confused,
    Neutral,
    Sleepy,
    Mischievous,
    Listening,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 31] = [
        EmotionLabel::Happy,
        EmotionLabel::Excited,
        EmotionLabel::Joyful,
        EmotionLabel::Ecstatic,
        EmotionLabel::Playful,
        EmotionLabel::Giggling,
        EmotionLabel::Proud,
        EmotionLabel::Relieved,
        EmotionLabel::Hopeful,
        EmotionLabel::Sad,
        EmotionLabel::Crying,
        EmotionLabel::Lonely,
        EmotionLabel::Guilty,
        EmotionLabel::Angry,
        EmotionLabel::Frustrated,
        EmotionLabel::Surprised,
        EmotionLabel::Amazed,
        EmotionLabel::Shy,
        EmotionLabel::Embarrassed,
        EmotionLabel::Bashful,
        EmotionLabel::Affectionate,
        EmotionLabel::Thinking,
        EmotionLabel::Curious,
        EmotionLabel::Determined,
        EmotionLabel::Worried,
        EmotionLabel::Nervous,
        EmotionLabel::Confused,
        EmotionLabel::Neutral,
        EmotionLabel::Sleepy,
        EmotionLabel::Mischievous,
        EmotionLabel::Listening,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Happy => "happy",
            EmotionLabel::Excited => "excited",
            EmotionLabel::Joyful => "joyful",
            EmotionLabel::Ecstatic => "ecstatic",
            EmotionLabel::Playful => "playful",
            EmotionLabel::Giggling => "giggling",
            EmotionLabel::Proud => "proud",
            EmotionLabel::Relieved => "relieved",
            EmotionLabel::Hopeful => "hopeful",
            EmotionLabel::Sad => "sad",
            EmotionLabel::Crying => "crying",
            EmotionLabel::Lonely => "lonely",
            EmotionLabel::Guilty => "guilty",
            EmotionLabel::Angry => "angry",
            EmotionLabel::Frustrated => "frustrated",
            EmotionLabel::Surprised => "surprised",
            EmotionLabel::Amazed => "amazed",
            EmotionLabel::Shy => "shy",
            EmotionLabel::Embarrassed => "embarrassed",
            EmotionLabel::Bashful => "bashful",
            EmotionLabel::Affectionate => "affectionate",
            EmotionLabel::Thinking => "thinking",
            EmotionLabel::Curious => "curious",
            EmotionLabel::Determined => "determined",
            EmotionLabel::Worried => "worried",
            EmotionLabel::Nervous => "nervous",
            EmotionLabel::Confused => "confused",
            EmotionLabel::Neutral => "neutral",
            EmotionLabel::Sleepy => "sleepy",
            EmotionLabel::Mischievous => "mischievous",
            EmotionLabel::Listening => "listening",
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmotionLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        EmotionLabel::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == wanted)
            .ok_or_else(|| format!("unknown emotion label: {}", s))
    }
}

impl From<String> for EmotionLabel {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            warn!(label = %value, "Unknown emotion label, using neutral");
            EmotionLabel::Neutral
        })
    }
}

/// One-shot motion played when an emotion is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum AnimationHint {
    Bounce,
    Recoil,
    Shake,
    Giggle,
    #[default]
    None,
}

impl AnimationHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnimationHint::Bounce => "bounce",
            AnimationHint::Recoil => "recoil",
            AnimationHint::Shake => "shake",
            AnimationHint::Giggle => "giggle",
            AnimationHint::None => "none",
        }
    }

    pub fn motion(&self) -> Motion {
        match self {
            AnimationHint::Bounce => Motion::Bounce,
            AnimationHint::Recoil => Motion::Recoil,
            AnimationHint::Shake => Motion::Shake,
            AnimationHint::Giggle => Motion::Giggle,
            AnimationHint::None => Motion::None,
        }
    }
}

impl From<String> for AnimationHint {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "bounce" => AnimationHint::Bounce,
            "recoil" => AnimationHint::Recoil,
            "shake" => AnimationHint::Shake,
            "giggle" => AnimationHint::Giggle,
            "none" | "" => AnimationHint::None,
            other => {
                warn!(hint = other, "Unknown animation hint, using none");
                AnimationHint::None
            }
        }
    }
}

impl fmt::Display for AnimationHint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The affect currently displayed, replaced wholesale on every change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionState {
    pub label: EmotionLabel,
    pub animation_hint: AnimationHint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl EmotionState {
    pub fn new(label: EmotionLabel, animation_hint: AnimationHint) -> Self {
        Self {
            label,
            animation_hint,
            confidence: None,
        }
    }

    /// Attach a confidence, clamped into `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        });
        self
    }

    pub fn neutral() -> Self {
        Self::new(EmotionLabel::Neutral, AnimationHint::None)
    }

    /// Shown while a reply is being produced.
    pub fn thinking() -> Self {
        Self::new(EmotionLabel::Thinking, AnimationHint::None).with_confidence(1.0)
    }

    /// Shown while the user is typing.
    pub fn listening() -> Self {
        Self::new(EmotionLabel::Listening, AnimationHint::None).with_confidence(1.0)
    }

    /// Initial state at session start.
    pub fn sleepy() -> Self {
        Self::new(EmotionLabel::Sleepy, AnimationHint::None).with_confidence(1.0)
    }

    pub fn appearance(&self) -> Appearance {
        appearance(self)
    }
}

/// Background mood bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Sad,
    Angry,
    Surprised,
    Thinking,
    Sleepy,
    Neutral,
}

impl Mood {
    pub fn for_label(label: EmotionLabel) -> Mood {
        use EmotionLabel::*;
        match label {
            Happy | Excited | Joyful | Ecstatic | Playful | Giggling | Proud | Relieved
            | Hopeful | Affectionate => Mood::Happy,
            Sad | Crying | Lonely | Guilty => Mood::Sad,
            Angry | Frustrated => Mood::Angry,
            Surprised | Amazed => Mood::Surprised,
            Thinking | Curious | Determined | Listening | Nervous | Worried | Confused => {
                Mood::Thinking
            }
            Sleepy => Mood::Sleepy,
            _ => Mood::Neutral,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Mood::Happy => "mood-happy",
            Mood::Sad => "mood-sad",
            Mood::Angry => "mood-angry",
            Mood::Surprised => "mood-surprised",
            Mood::Thinking => "mood-thinking",
            Mood::Sleepy => "mood-sleepy",
            Mood::Neutral => "mood-neutral",
        }
    }
}

/// Motion classes understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Motion {
    Sway,
    Wiggle,
    Shake,
    Breathe,
    Bounce,
    Giggle,
    Recoil,
    None,
}

impl Motion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Motion::Sway => "sway",
            Motion::Wiggle => "wiggle",
            Motion::Shake => "shake",
            Motion::Breathe => "breathe",
            Motion::Bounce => "bounce",
            Motion::Giggle => "giggle",
            Motion::Recoil => "recoil",
            Motion::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Repeat {
    Infinite,
    Times(u32),
}

/// Looping body motion for a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BodyMotion {
    pub motion: Motion,
    pub period_ms: u32,
    pub repeat: Repeat,
}

impl BodyMotion {
    const fn looping(motion: Motion, period_ms: u32) -> Self {
        Self {
            motion,
            period_ms,
            repeat: Repeat::Infinite,
        }
    }

    pub fn for_label(label: EmotionLabel) -> BodyMotion {
        use EmotionLabel::*;
        match label {
            Happy | Playful | Giggling | Proud | Relieved | Hopeful | Affectionate => {
                BodyMotion::looping(Motion::Sway, 6000)
            }
            Excited | Joyful | Amazed | Ecstatic => BodyMotion::looping(Motion::Wiggle, 2500),
            Angry | Frustrated => BodyMotion::looping(Motion::Shake, 100),
            Nervous => BodyMotion::looping(Motion::Shake, 300),
            Confused | Shy | Bashful | Embarrassed => BodyMotion::looping(Motion::Wiggle, 5000),
            // quick startle, then still
            Surprised => BodyMotion {
                motion: Motion::Shake,
                period_ms: 200,
                repeat: Repeat::Times(3),
            },
            Sad | Sleepy | Lonely | Guilty | Crying => BodyMotion::looping(Motion::Breathe, 10000),
            _ => BodyMotion::looping(Motion::Breathe, 8000),
        }
    }
}

/// Two-stop radial gradient used for the orb and the background tint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Gradient {
    pub from: &'static str,
    pub to: &'static str,
}

impl Gradient {
    const fn new(from: &'static str, to: &'static str) -> Self {
        Self { from, to }
    }

    pub fn for_label(label: EmotionLabel) -> Gradient {
        use EmotionLabel::*;
        match label {
            Happy => Gradient::new("#fef08a", "#fde047"),
            Excited => Gradient::new("#fb923c", "#f97316"),
            Joyful => Gradient::new("#f87171", "#ef4444"),
            Ecstatic => Gradient::new("#e879f9", "#d946ef"),
            Playful => Gradient::new("#f9a8d4", "#f472b6"),
            Giggling => Gradient::new("#f0abfc", "#ec4899"),
            Proud => Gradient::new("#fbbf24", "#f59e0b"),
            Relieved => Gradient::new("#bef264", "#a3e635"),
            Hopeful => Gradient::new("#86efac", "#4ade80"),
            Sad => Gradient::new("#93c5fd", "#60a5fa"),
            Crying => Gradient::new("#60a5fa", "#3b82f6"),
            Lonely => Gradient::new("#a5b4fc", "#6366f1"),
            Guilty => Gradient::new("#c4b5fd", "#818cf8"),
            Angry => Gradient::new("#f87171", "#dc2626"),
            Frustrated => Gradient::new("#ef4444", "#b91c1c"),
            Surprised => Gradient::new("#d8b4fe", "#c084fc"),
            Amazed => Gradient::new("#c084fc", "#a855f7"),
            Shy => Gradient::new("#fce7f3", "#fbcfe8"),
            Embarrassed => Gradient::new("#fecdd3", "#fda4af"),
            Bashful => Gradient::new("#fee2e2", "#fecaca"),
            Affectionate => Gradient::new("#fda4af", "#fb7185"),
            Thinking => Gradient::new("#bae6fd", "#7dd3fc"),
            Curious => Gradient::new("#67e8f9", "#22d3ee"),
            Determined => Gradient::new("#5eead4", "#14b8a6"),
            Worried => Gradient::new("#fef08a", "#facc15"),
            Nervous => Gradient::new("#fde047", "#eab308"),
            Confused => Gradient::new("#c4b5fd", "#a78bfa"),
            Sleepy => Gradient::new("#cbd5e1", "#94a3b8"),
            Mischievous => Gradient::new("#a78bfa", "#8b5cf6"),
            Listening => Gradient::new("#99f6e4", "#2dd4bf"),
            _ => Gradient::new("#f3f4f6", "#e5e7eb"),
        }
    }
}

/// Decoration drawn around the orb, outside the body motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Halo {
    Pulse,
    Earmuffs,
}

/// Everything a renderer needs to draw one emotion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appearance {
    pub label: EmotionLabel,
    pub mood: Mood,
    pub gradient: Gradient,
    pub body: BodyMotion,
    pub accent: Motion,
    pub face: &'static str,
    pub halo: Option<Halo>,
}

/// Map an emotion onto its visual treatment.
pub fn appearance(state: &EmotionState) -> Appearance {
    let label = state.label;
    Appearance {
        label,
        mood: Mood::for_label(label),
        gradient: Gradient::for_label(label),
        body: BodyMotion::for_label(label),
        accent: state.animation_hint.motion(),
        face: avatar::face_markup(label),
        halo: match label {
            EmotionLabel::Thinking => Some(Halo::Pulse),
            EmotionLabel::Listening => Some(Halo::Earmuffs),
            _ => None,
        },
    }
}

/// Result of a state change: the new current state and what it replaced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub current: EmotionState,
    pub previous: Option<EmotionState>,
}

/// Holds the current and previous emotion plus the typing snapshot.
#[derive(Debug, Clone)]
pub struct EmotionMachine {
    current: EmotionState,
    previous: Option<EmotionState>,
    typing_snapshot: Option<EmotionState>,
}

impl Default for EmotionMachine {
    fn default() -> Self {
        Self::new(EmotionState::sleepy())
    }
}

impl EmotionMachine {
    pub fn new(initial: EmotionState) -> Self {
        Self {
            current: initial,
            previous: None,
            typing_snapshot: None,
        }
    }

    pub fn current(&self) -> &EmotionState {
        &self.current
    }

    pub fn previous(&self) -> Option<&EmotionState> {
        self.previous.as_ref()
    }

    pub fn typing_snapshot(&self) -> Option<&EmotionState> {
        self.typing_snapshot.as_ref()
    }

    /// Replace the current state.
    pub fn set(&mut self, next: EmotionState) -> Transition {
        self.previous = Some(self.current);
        self.current = next;
        Transition {
            current: self.current,
            previous: self.previous,
        }
    }

    /// User started typing. Snapshots the prior state unless already listening.
    pub fn typing_started(&mut self) -> Option<Transition> {
        if self.current.label == EmotionLabel::Listening {
            return None;
        }
        self.typing_snapshot = Some(self.current);
        Some(self.set(EmotionState::listening()))
    }

    /// User stopped typing. Restores the snapshot if we are still listening.
    pub fn typing_stopped(&mut self) -> Option<Transition> {
        if self.current.label != EmotionLabel::Listening {
            return None;
        }
        let snapshot = self.typing_snapshot.take()?;
        Some(self.set(snapshot))
    }

    /// While typing the face stays on listening; `next` replaces the snapshot instead.
    pub fn set_behind_typing(&mut self, next: EmotionState) {
        self.typing_snapshot = Some(next);
    }

    /// Drop the typing snapshot; a send supersedes it.
    pub fn clear_snapshot(&mut self) {
        self.typing_snapshot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip_through_strings() {
        for label in EmotionLabel::ALL {
            assert_eq!(label.as_str().parse::<EmotionLabel>().unwrap(), label);
        }
        assert!("grumpy".parse::<EmotionLabel>().is_err());
    }

    #[test]
    fn test_unknown_label_deserializes_to_neutral() {
        let state: EmotionState =
            serde_json::from_str(r#"{"label":"grumpy","animation_hint":"wobble"}"#).unwrap();
        assert_eq!(state.label, EmotionLabel::Neutral);
        assert_eq!(state.animation_hint, AnimationHint::None);
        assert_eq!(state.confidence, None);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let state = EmotionState::neutral().with_confidence(1.7);
        assert_eq!(state.confidence, Some(1.0));
        let state = EmotionState::neutral().with_confidence(-0.2);
        assert_eq!(state.confidence, Some(0.0));
    }

    #[test]
    fn test_every_label_has_an_appearance() {
        for label in EmotionLabel::ALL {
            let look = appearance(&EmotionState::new(label, AnimationHint::None));
            assert_eq!(look.label, label);
            assert!(look.gradient.from.starts_with('#'));
            assert!(!look.face.is_empty());
        }
    }

    #[test]
    fn test_unmapped_labels_share_neutral_look() {
        let neutral = appearance(&EmotionState::neutral());
        let shy = appearance(&EmotionState::new(EmotionLabel::Shy, AnimationHint::None));
        assert_eq!(shy.mood, neutral.mood);
        let mischievous = appearance(&EmotionState::new(
            EmotionLabel::Mischievous,
            AnimationHint::None,
        ));
        assert_eq!(mischievous.body, neutral.body);
    }

    #[test]
    fn test_specific_mappings() {
        let happy = appearance(&EmotionState::new(EmotionLabel::Happy, AnimationHint::Bounce));
        assert_eq!(happy.mood, Mood::Happy);
        assert_eq!(happy.body.motion, Motion::Sway);
        assert_eq!(happy.accent, Motion::Bounce);
        assert_eq!(happy.gradient, Gradient::new("#fef08a", "#fde047"));

        let angry = appearance(&EmotionState::new(EmotionLabel::Angry, AnimationHint::Shake));
        assert_eq!(angry.mood, Mood::Angry);
        assert_eq!(angry.body.motion, Motion::Shake);

        let surprised = BodyMotion::for_label(EmotionLabel::Surprised);
        assert_eq!(surprised.repeat, Repeat::Times(3));

        let thinking = appearance(&EmotionState::thinking());
        assert_eq!(thinking.halo, Some(Halo::Pulse));
        assert_eq!(thinking.mood, Mood::Thinking);
    }

    #[test]
    fn test_typing_snapshot_and_restore() {
        let happy = EmotionState::new(EmotionLabel::Happy, AnimationHint::Bounce);
        let mut machine = EmotionMachine::new(happy);

        let entered = machine.typing_started().expect("should enter listening");
        assert_eq!(entered.current.label, EmotionLabel::Listening);
        assert_eq!(entered.previous, Some(happy));
        assert_eq!(machine.typing_snapshot(), Some(&happy));

        let restored = machine.typing_stopped().expect("should restore");
        assert_eq!(restored.current, happy);
        assert_eq!(machine.typing_snapshot(), None);
    }

    #[test]
    fn test_typing_twice_keeps_first_snapshot() {
        let sad = EmotionState::new(EmotionLabel::Sad, AnimationHint::None);
        let mut machine = EmotionMachine::new(sad);

        assert!(machine.typing_started().is_some());
        assert!(machine.typing_started().is_none());
        assert_eq!(machine.typing_snapshot(), Some(&sad));

        machine.typing_stopped();
        assert_eq!(machine.current(), &sad);
    }

    #[test]
    fn test_cleared_snapshot_is_not_restored() {
        let mut machine = EmotionMachine::new(EmotionState::neutral());
        machine.typing_started();
        machine.clear_snapshot();
        assert!(machine.typing_stopped().is_none());
        assert_eq!(machine.current().label, EmotionLabel::Listening);
    }

    #[test]
    fn test_state_set_behind_typing_is_restored() {
        let mut machine = EmotionMachine::default();
        machine.typing_started();
        let curious = EmotionState::new(EmotionLabel::Curious, AnimationHint::Recoil);
        machine.set_behind_typing(curious);
        assert_eq!(machine.current().label, EmotionLabel::Listening);

        let restored = machine.typing_stopped().expect("should restore");
        assert_eq!(restored.current, curious);
    }

    #[test]
    fn test_set_tracks_previous() {
        let mut machine = EmotionMachine::default();
        assert_eq!(machine.current().label, EmotionLabel::Sleepy);
        let t = machine.set(EmotionState::thinking());
        assert_eq!(t.previous.map(|p| p.label), Some(EmotionLabel::Sleepy));
        assert_eq!(machine.previous().map(|p| p.label), Some(EmotionLabel::Sleepy));
    }
}
