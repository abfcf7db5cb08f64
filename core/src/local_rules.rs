//! Small talk answered from a fixed table instead of the model.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::conversation::{Action, AgentReply};
use crate::emotion::{AnimationHint, EmotionLabel, EmotionState};

/// Greetings may be followed by a few words ("hi there aura") and still count.
const MAX_GREETING_WORDS: usize = 4;

const GREETINGS: &[&str] = &[
    "good morning",
    "good afternoon",
    "good evening",
    "greetings",
    "hello",
    "howdy",
    "hiya",
    "heya",
    "hey",
    "hi",
    "yo",
];

const GRATITUDE: &[&str] = &[
    "thanks",
    "thank you",
    "thank you so much",
    "thanks a lot",
    "thx",
    "ty",
];

const FAREWELLS: &[&str] = &[
    "bye",
    "bye bye",
    "goodbye",
    "see you",
    "see you later",
    "see ya",
    "good night",
    "goodnight",
];

const WELL_BEING: &[&str] = &[
    "how are you",
    "how are you doing",
    "how's it going",
    "how are things",
    "what's up",
    "sup",
];

const CHEER_ME_UP: &str = "cheer me up";
const SURPRISE_ME: &str = "surprise me";

#[derive(Debug, Clone)]
enum Matcher {
    /// Utterance starts with one of these at a word boundary.
    Prefix(&'static [&'static str]),
    /// Utterance is exactly one of these.
    Exact(&'static [&'static str]),
}

impl Matcher {
    fn matches(&self, normalized: &str) -> bool {
        match self {
            Matcher::Exact(phrases) => phrases.contains(&normalized),
            Matcher::Prefix(prefixes) => {
                if normalized.split_whitespace().count() > MAX_GREETING_WORDS {
                    return false;
                }
                prefixes.iter().any(|prefix| {
                    normalized
                        .strip_prefix(prefix)
                        .map(|rest| rest.chars().next().map_or(true, ends_word))
                        .unwrap_or(false)
                })
            }
        }
    }
}

/// Whitespace or sentence punctuation; hyphens and apostrophes continue a word.
fn ends_word(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | '.' | '!' | '?' | ';' | ':')
}

#[derive(Debug, Clone)]
enum Answer {
    Fixed(AgentReply),
    /// One of these, picked uniformly at random.
    OneOf(Vec<AgentReply>),
}

#[derive(Debug, Clone)]
struct LocalRule {
    name: &'static str,
    matcher: Matcher,
    answer: Answer,
}

/// Ordered rule table; the first matching rule wins.
#[derive(Debug, Clone)]
pub struct LocalRules {
    rules: Vec<LocalRule>,
}

impl Default for LocalRules {
    fn default() -> Self {
        let emotion = |label, hint, confidence| EmotionState::new(label, hint).with_confidence(confidence);

        let rules = vec![
            LocalRule {
                name: "greeting",
                matcher: Matcher::Prefix(GREETINGS),
                answer: Answer::Fixed(
                    AgentReply::local(
                        "Hi there! 👋 I'm so happy to see you!",
                        emotion(EmotionLabel::Happy, AnimationHint::Bounce, 0.9),
                    )
                    .with_actions(vec![
                        Action::new("Cheer me up", "Cheer me up"),
                        Action::new("Surprise me", "Surprise me"),
                    ]),
                ),
            },
            LocalRule {
                name: "gratitude",
                matcher: Matcher::Exact(GRATITUDE),
                answer: Answer::Fixed(AgentReply::local(
                    "Aww, you're welcome! 😊",
                    emotion(EmotionLabel::Affectionate, AnimationHint::Giggle, 0.9),
                )),
            },
            LocalRule {
                name: "farewell",
                matcher: Matcher::Exact(FAREWELLS),
                answer: Answer::Fixed(AgentReply::local(
                    "Bye bye! Come back soon, okay? 👋",
                    emotion(EmotionLabel::Sad, AnimationHint::None, 0.8),
                )),
            },
            LocalRule {
                name: "well-being",
                matcher: Matcher::Exact(WELL_BEING),
                answer: Answer::Fixed(
                    AgentReply::local(
                        "I'm feeling bouncy and bright! Thanks for asking 💛 How about you?",
                        emotion(EmotionLabel::Joyful, AnimationHint::Bounce, 0.9),
                    )
                    .with_actions(vec![Action::new("Cheer me up", "Cheer me up")]),
                ),
            },
            LocalRule {
                name: "cheer-me-up",
                matcher: Matcher::Exact(&[CHEER_ME_UP]),
                answer: Answer::Fixed(
                    AgentReply::local(
                        "You're doing better than you think! 🌟 Here's a virtual high-five ✋",
                        emotion(EmotionLabel::Excited, AnimationHint::Bounce, 1.0),
                    )
                    .with_actions(vec![
                        Action::new("Surprise me", "Surprise me"),
                        Action::new("Tell me a fun fact", "Tell me a fun fact."),
                    ]),
                ),
            },
            LocalRule {
                name: "surprise-me",
                matcher: Matcher::Exact(&[SURPRISE_ME]),
                answer: Answer::OneOf(
                    [
                        ("Boo! 👻 Did I get you?", EmotionLabel::Surprised, AnimationHint::Recoil),
                        (
                            "Fun fact: octopuses have three hearts! 🐙",
                            EmotionLabel::Amazed,
                            AnimationHint::Bounce,
                        ),
                        (
                            "Here's a secret: I practice my dance moves when you're away 💃",
                            EmotionLabel::Playful,
                            AnimationHint::Giggle,
                        ),
                        (
                            "Ta-da! 🎉 A confetti shower just for you!",
                            EmotionLabel::Ecstatic,
                            AnimationHint::Bounce,
                        ),
                    ]
                    .into_iter()
                    .map(|(message, label, hint)| {
                        AgentReply::local(message, emotion(label, hint, 1.0))
                            .with_actions(vec![Action::new("Surprise me again", "Surprise me")])
                    })
                    .collect(),
                ),
            },
        ];

        Self { rules }
    }
}

impl LocalRules {
    /// Find a canned answer for `utterance`.
    ///
    /// Returns the matching rule name with the reply; `rng` is only consulted
    /// by rules with several candidate answers.
    pub fn lookup<R: Rng + ?Sized>(
        &self,
        utterance: &str,
        rng: &mut R,
    ) -> Option<(&'static str, AgentReply)> {
        let normalized = normalize(utterance);
        if normalized.is_empty() {
            return None;
        }
        let rule = self.rules.iter().find(|rule| rule.matcher.matches(&normalized))?;
        let reply = match &rule.answer {
            Answer::Fixed(reply) => reply.clone(),
            Answer::OneOf(candidates) => candidates.choose(rng)?.clone(),
        };
        Some((rule.name, reply))
    }
}

/// Lowercase, trim, fold typographic apostrophes and drop trailing punctuation.
pub fn normalize(utterance: &str) -> String {
    let lowered = utterance.trim().to_lowercase().replace(['’', '‘'], "'");
    lowered
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ',' | ';' | ':' | '…') || c.is_whitespace())
        .to_string()
}
