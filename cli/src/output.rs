use aura_core::emotion::{appearance, Mood};
use aura_core::{Action, ChatMessage, EmotionState, Sender};
use colored::*;

/// Print the startup banner. Called before raw mode is enabled.
pub fn print_banner(model: &str) {
    println!("{}", "Aura".bright_cyan().bold());
    println!("  {} {}", "model:".dimmed(), model);
    println!(
        "  {}",
        "Type and press Enter to chat. Enter a number to press an action button. /quit or Ctrl-C to leave."
            .dimmed()
    );
    println!();
}

/// `#rrggbb` to an RGB triple.
pub fn hex_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Little text face for the prompt, one per mood.
pub fn face_glyph(mood: Mood) -> &'static str {
    match mood {
        Mood::Happy => "(◕‿◕)",
        Mood::Sad => "(╥﹏╥)",
        Mood::Angry => "(ಠ益ಠ)",
        Mood::Surprised => "(⊙o⊙)",
        Mood::Thinking => "(・_・?)",
        Mood::Sleepy => "(-_-)zz",
        Mood::Neutral => "(•_•)",
    }
}

fn tint(text: &str, emotion: &EmotionState) -> ColoredString {
    let look = appearance(emotion);
    match hex_rgb(look.gradient.to) {
        Some((r, g, b)) => text.truecolor(r, g, b),
        None => text.normal(),
    }
}

pub fn format_message(message: &ChatMessage) -> String {
    match message.sender {
        Sender::User => format!("{} {}", "You:".green().bold(), message.text),
        Sender::Agent => {
            let emotion = message.emotion.unwrap_or_else(EmotionState::neutral);
            let tag = match emotion.animation_hint.motion() {
                aura_core::emotion::Motion::None => format!("[{}]", emotion.label),
                motion => format!("[{} · {}]", emotion.label, motion.as_str()),
            };
            format!(
                "{} {} {}",
                tint("Aura:", &emotion).bold(),
                message.text,
                tag.dimmed()
            )
        }
    }
}

pub fn format_actions(actions: &[Action]) -> Option<String> {
    if actions.is_empty() {
        return None;
    }
    let buttons: Vec<String> = actions
        .iter()
        .enumerate()
        .map(|(i, action)| format!("[{}] {}", i + 1, action.title))
        .collect();
    Some(format!("  {}", buttons.join("  ").cyan()))
}

/// The prompt line: face, label, then whatever the user is typing.
pub fn format_prompt(emotion: &EmotionState, loading: bool, caption: Option<&str>, buffer: &str) -> String {
    let look = appearance(emotion);
    let face = tint(face_glyph(look.mood), emotion);
    let mut status = format!("{} {}", face, emotion.label.to_string().dimmed());
    if loading {
        status.push_str(&format!(" {}", "…".dimmed()));
    } else if let Some(caption) = caption {
        status.push_str(&format!(" {}", caption.italic().dimmed()));
    }
    format!("{} {} {}", status, ">".bold(), buffer)
}

/// A one-line description of the face, from the bundle's cues.
pub fn format_face_cue(emotion: &EmotionState, cue: &str) -> String {
    format!("  {} {}", tint("~", emotion), cue.dimmed())
}
