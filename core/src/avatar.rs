//! Line-art faces and a standalone SVG rendering of the avatar orb.

use crate::emotion::{appearance, EmotionLabel, EmotionState, Halo, Motion, Repeat};

const FEATURE: &str = "#1f2937";
const BODY_PATH: &str = "M50,5 C25,5 5,30 5,55 C5,85 25,95 50,95 C75,95 95,85 95,55 C95,30 75,5 50,5 Z";

/// SVG fragment (100x100 viewBox) for the face of `label`.
pub fn face_markup(label: EmotionLabel) -> &'static str {
    use EmotionLabel::*;
    match label {
        Happy | Proud | Relieved => concat!(
            r##"<g><ellipse cx="37" cy="48" rx="4.5" ry="5.5" fill="#1f2937"/><ellipse cx="63" cy="48" rx="4.5" ry="5.5" fill="#1f2937"/>"##,
            r##"<path d="M 40 68 C 45 78, 55 78, 60 68" class="stroke"/></g>"##
        ),
        Hopeful => concat!(
            r##"<g><path d="M 32 42 C 37 45, 42 45, 47 42 M 53 42 C 58 45, 63 45, 68 42" class="stroke"/>"##,
            r##"<path d="M 40 70 C 45 75, 55 75, 60 70" class="stroke"/></g>"##
        ),
        Excited | Joyful | Ecstatic => concat!(
            r##"<g><path d="M 32 42 C 37 37, 42 37, 47 42 M 53 42 C 58 37, 63 37, 68 42" class="stroke"/>"##,
            r##"<path d="M 35 65 C 40 85, 60 85, 65 65 Z" fill="#1f2937"/></g>"##
        ),
        Giggling => concat!(
            r##"<g><path d="M 32 45 C 35 40, 40 40, 43 45 M 57 45 C 60 40, 65 40, 68 45" class="stroke"/>"##,
            r##"<path d="M 40 65 Q 50 75 60 65 Q 55 70 45 70 Z" fill="#1f2937"/></g>"##
        ),
        Playful => concat!(
            r##"<g><ellipse cx="37" cy="48" rx="4.5" ry="5.5" fill="#1f2937"/><ellipse cx="63" cy="48" rx="4.5" ry="5.5" fill="#1f2937"/>"##,
            r##"<path d="M 40 65 C 45 72, 55 72, 60 65" class="stroke"/><path d="M 55 68 C 55 72, 50 75, 47 70" fill="#f472b6"/></g>"##
        ),
        Sad | Lonely | Guilty => concat!(
            r##"<g><path d="M 32 50 C 37 48, 42 48, 47 50 M 53 50 C 58 48, 63 48, 68 50" class="stroke"/>"##,
            r##"<path d="M 42 72 Q 50 65, 58 72" class="stroke"/></g>"##
        ),
        Crying => concat!(
            r##"<g><path d="M 32 54 Q 37.5 48, 43 54 M 57 54 Q 62.5 48, 68 54" class="stroke"/>"##,
            r##"<path d="M 40 70 Q 50 65, 60 70" class="stroke"/>"##,
            r##"<path d="M 38 58 v 12 M 62 58 v 12" class="stroke tears"/></g>"##
        ),
        Angry => concat!(
            r##"<g class="stroke"><path d="M 30 45 L 45 52 M 70 45 L 55 52"/>"##,
            r##"<path d="M 40 70 L 60 70"/></g>"##
        ),
        Frustrated => concat!(
            r##"<g class="stroke"><path d="M 30 45 L 45 52 M 70 45 L 55 52"/>"##,
            r##"<path d="M 42 72 Q 47 67, 50 72 Q 53 77, 58 72"/></g>"##
        ),
        Surprised => concat!(
            r##"<g><ellipse cx="38" cy="48" rx="6" ry="7" fill="#1f2937"/><ellipse cx="62" cy="48" rx="6" ry="7" fill="#1f2937"/>"##,
            r##"<ellipse cx="50" cy="72" rx="8" ry="10" fill="#1f2937"/></g>"##
        ),
        Amazed => concat!(
            r##"<g><ellipse cx="38" cy="48" rx="8" ry="9" fill="#1f2937"/><ellipse cx="62" cy="48" rx="8" ry="9" fill="#1f2937"/>"##,
            r##"<circle cx="38" cy="46" r="2" fill="white"/><circle cx="62" cy="46" r="2" fill="white"/>"##,
            r##"<ellipse cx="50" cy="74" rx="12" ry="14" fill="#1f2937"/></g>"##
        ),
        Shy | Bashful | Embarrassed => concat!(
            r##"<g><ellipse cx="30" cy="62" rx="10" ry="4" class="blush"/><ellipse cx="70" cy="62" rx="10" ry="4" class="blush"/>"##,
            r##"<path d="M 35 50 L 40 54 M 65 50 L 60 54" class="stroke"/><path d="M 42 68 Q 50 72, 58 68" class="stroke"/></g>"##
        ),
        Affectionate => concat!(
            r##"<g fill="#1f2937"><path d="M40 40 C 20 40, 25 60, 40 60 C 55 60, 60 40, 40 40Z"/>"##,
            r##"<path d="M60 40 C 80 40, 75 60, 60 60 C 45 60, 40 40, 60 40Z"/>"##,
            r##"<path d="M 42 70 Q 50 80, 58 70" class="stroke"/></g>"##
        ),
        Thinking => concat!(
            r##"<g><path d="M 30 48 L 45 48 M 60 48 Q 55 48, 55 53" class="stroke"/>"##,
            r##"<line x1="42" y1="70" x2="58" y2="70" class="stroke"/></g>"##
        ),
        Determined => concat!(
            r##"<g><path d="M 30 50 L 45 45 M 70 50 L 55 45" class="stroke"/>"##,
            r##"<line x1="40" y1="70" x2="60" y2="70" class="stroke"/></g>"##
        ),
        Curious => concat!(
            r##"<g><ellipse cx="37" cy="45" rx="4.5" ry="5.5" fill="#1f2937"/><ellipse cx="63" cy="48" rx="5" ry="6" fill="#1f2937"/>"##,
            r##"<circle cx="50" cy="73" r="3" fill="#1f2937"/></g>"##
        ),
        Worried | Nervous => concat!(
            r##"<g><path d="M 35 52 C 30 46, 45 46, 40 52 M 65 52 C 70 46, 55 46, 60 52" class="stroke"/>"##,
            r##"<path d="M 42 72 Q 47 67, 50 72 Q 53 77, 58 72" class="stroke"/></g>"##
        ),
        Confused => concat!(
            r##"<g><path d="M 30 48 L 45 48" class="stroke"/><ellipse cx="63" cy="52" rx="5" ry="4" fill="#1f2937"/>"##,
            r##"<path d="M 42 72 Q 50 65, 58 75" class="stroke"/></g>"##
        ),
        Mischievous => concat!(
            r##"<g><path d="M 32 45 C 35 38, 40 38, 43 45" class="stroke"/><path d="M 57 48 L 68 48" class="stroke"/>"##,
            r##"<path d="M 40 65 C 45 75, 60 70, 62 65" class="stroke"/></g>"##
        ),
        Sleepy => concat!(
            r##"<g class="stroke thin"><path d="M 32 50 Q 37.5 55, 43 50"/>"##,
            r##"<path d="M 57 50 Q 62.5 55, 68 50"/></g>"##
        ),
        Listening => concat!(
            r##"<g><ellipse cx="37" cy="48" rx="5.5" ry="6.5" fill="#1f2937"/>"##,
            r##"<ellipse cx="63" cy="48" rx="5.5" ry="6.5" fill="#1f2937"/></g>"##
        ),
        _ => concat!(
            r##"<g><ellipse cx="37" cy="48" rx="4.5" ry="5.5" fill="#1f2937"/><ellipse cx="63" cy="48" rx="4.5" ry="5.5" fill="#1f2937"/>"##,
            r##"<line x1="42" y1="70" x2="58" y2="70" class="stroke"/></g>"##
        ),
    }
}

fn halo_markup(halo: Halo) -> &'static str {
    match halo {
        Halo::Pulse => {
            r##"<circle cx="50" cy="50" r="48" fill="none" stroke="#7dd3fc" stroke-width="1.5" stroke-dasharray="5 10" class="halo-pulse"/>"##
        }
        Halo::Earmuffs => concat!(
            r##"<g fill="none" stroke="#2dd4bf" stroke-width="2.5" class="halo-earmuffs">"##,
            r##"<path d="M 15 35 A 20 20 0 0 1 15 65"/><path d="M 85 35 A 20 20 0 0 0 85 65"/></g>"##
        ),
    }
}

/// Render `state` as a standalone SVG document.
///
/// Motion is expressed as CSS class names (`body-<motion>`, `accent-<motion>`)
/// with the period and repeat count attached as data attributes, so a host
/// page can supply its own keyframes.
pub fn render_svg(state: &EmotionState) -> String {
    let look = appearance(state);
    let gradient_id = format!("orb-{}", look.label);
    let repeat = match look.body.repeat {
        Repeat::Infinite => "infinite".to_string(),
        Repeat::Times(n) => n.to_string(),
    };
    let accent = if look.accent == Motion::None {
        String::new()
    } else {
        format!(" accent-{}", look.accent.as_str())
    };
    let halo = look.halo.map(halo_markup).unwrap_or("");

    format!(
        concat!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100" class="{mood}" data-label="{label}">"##,
            r##"<style>.stroke{{fill:none;stroke:{feature};stroke-width:4;stroke-linecap:round;stroke-linejoin:round}}"##,
            r##".thin{{stroke-width:3}}.tears{{stroke:#60a5fa;stroke-width:3}}.blush{{fill:#fda4af;opacity:0.6}}</style>"##,
            r##"<defs><radialGradient id="{gid}" cx="50%" cy="40%" r="60%" fx="50%" fy="40%">"##,
            r##"<stop offset="0%" stop-color="{from}"/><stop offset="100%" stop-color="{to}"/></radialGradient></defs>"##,
            r##"<ellipse cx="50" cy="95" rx="30" ry="4" fill="black" fill-opacity="0.2"/>"##,
            r##"<g class="body-{motion}{accent}" data-period-ms="{period}" data-repeat="{repeat}">"##,
            r##"<path d="{body}" fill="url(#{gid})"/>"##,
            r##"<path d="{body}" fill="transparent" stroke="rgba(255,255,255,0.2)" stroke-width="0.5"/>"##,
            "{face}</g>{halo}</svg>"
        ),
        mood = look.mood.class_name(),
        label = look.label,
        feature = FEATURE,
        gid = gradient_id,
        from = look.gradient.from,
        to = look.gradient.to,
        motion = look.body.motion.as_str(),
        accent = accent,
        period = look.body.period_ms,
        repeat = repeat,
        body = BODY_PATH,
        face = look.face,
        halo = halo,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::AnimationHint;

    #[test]
    fn test_render_contains_mapping() {
        let svg = render_svg(&EmotionState::new(EmotionLabel::Happy, AnimationHint::Bounce));
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("mood-happy"));
        assert!(svg.contains("#fef08a"));
        assert!(svg.contains("body-sway accent-bounce"));
        assert!(svg.contains(r#"data-repeat="infinite""#));
    }

    #[test]
    fn test_render_halo_only_when_defined() {
        let listening = render_svg(&EmotionState::listening());
        assert!(listening.contains("halo-earmuffs"));

        let neutral = render_svg(&EmotionState::neutral());
        assert!(!neutral.contains("halo-"));
        assert!(!neutral.contains("accent-"));
    }

    #[test]
    fn test_faces_differ_between_families() {
        assert_ne!(face_markup(EmotionLabel::Happy), face_markup(EmotionLabel::Sad));
        assert_eq!(face_markup(EmotionLabel::Happy), face_markup(EmotionLabel::Proud));
        assert!(face_markup(EmotionLabel::Neutral).contains("<line"));
    }
}
