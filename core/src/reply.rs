//! The structured reply the model must return for a chat turn.
//!
//! Only one schema is accepted (`aura.reply.v1`). It is declared to the API
//! as `response_schema` and parsed strictly: unknown fields are rejected.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::conversation::{Action, AgentReply, ResponseMode};
use crate::emotion::{AnimationHint, EmotionLabel, EmotionState};
use crate::errors::{AuraError, AuraResult};

pub const SCHEMA_VERSION: &str = "aura.reply.v1";

pub const AURA_SYSTEM_INSTRUCTION: &str = r#"You are Aura, a cute AI pet and lively desk companion whose face changes with every emotion.
Primary rule: keep things light and local whenever possible.
Only use QUERY mode when the user explicitly asks for external, factual or complex information.

Return STRICT JSON only, exactly this shape:
{
  "mode": "local|query",
  "message": "short reply (<=60 words, playful, natural)",
  "emotion": {
    "label": "one of the allowed emotion labels",
    "animation_hint": "bounce|recoil|shake|giggle|none"
  },
  "actions": [
    {"title": "button", "payload": "user message"}
  ],
  "query": "only if mode=query"
}

### LOCAL MODE
- Default for small talk, chit-chat and feelings.
- Always return an emotion and animation so the face changes.
- Keep replies short, playful and natural (<=60 words).
- Include 1-2 actions.

### QUERY MODE
- Only when the user asks for news, latest/today information, prices, schedules, laws, comparisons or step-by-step code.
- Set "mode":"query", put one concise request in "query", and keep "message" short ("Let me check that for you.").

### CONSTRAINTS
- Never add fields that are not in the shape above.
- Always output valid JSON.
"#;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireEmotion {
    label: EmotionLabel,
    animation_hint: AnimationHint,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireReply {
    mode: ResponseMode,
    message: String,
    emotion: WireEmotion,
    #[serde(default)]
    actions: Vec<Action>,
    #[serde(default)]
    query: Option<String>,
}

/// Parse the raw model text of a chat turn.
pub fn parse_reply(raw: &str) -> AuraResult<AgentReply> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AuraError::EmptyResponse);
    }
    let wire: WireReply = serde_json::from_str(raw).map_err(|e| {
        AuraError::ParsingError(format!("Reply does not match {}: {}", SCHEMA_VERSION, e))
    })?;
    if wire.message.trim().is_empty() {
        return Err(AuraError::EmptyResponse);
    }
    Ok(AgentReply {
        message: wire.message,
        emotion: EmotionState::new(wire.emotion.label, wire.emotion.animation_hint),
        mode: wire.mode,
        actions: wire.actions,
        query: wire.query.filter(|q| !q.trim().is_empty()),
    })
}

/// OpenAPI-style schema sent as `generation_config.response_schema`.
pub fn response_schema() -> Value {
    let labels: Vec<&str> = EmotionLabel::ALL.iter().map(|l| l.as_str()).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "mode": { "type": "STRING", "enum": ["local", "query"] },
            "message": { "type": "STRING" },
            "emotion": {
                "type": "OBJECT",
                "properties": {
                    "label": { "type": "STRING", "enum": labels },
                    "animation_hint": {
                        "type": "STRING",
                        "enum": ["bounce", "recoil", "shake", "giggle", "none"]
                    }
                },
                "required": ["label", "animation_hint"]
            },
            "actions": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "payload": { "type": "STRING" }
                    },
                    "required": ["title", "payload"]
                }
            },
            "query": { "type": "STRING" }
        },
        "required": ["mode", "message", "emotion"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local_reply() {
        let reply = parse_reply(
            r#"{"mode":"local","message":"Yay!","emotion":{"label":"excited","animation_hint":"bounce"},
                "actions":[{"title":"More","payload":"Tell me more"}]}"#,
        )
        .unwrap();
        assert_eq!(reply.mode, ResponseMode::Local);
        assert_eq!(reply.emotion.label, EmotionLabel::Excited);
        assert_eq!(reply.emotion.confidence, None);
        assert_eq!(reply.actions, vec![Action::new("More", "Tell me more")]);
        assert_eq!(reply.pending_query(), None);
    }

    #[test]
    fn test_parse_query_reply() {
        let reply = parse_reply(
            r#"{"mode":"query","message":"Let me check that for you.","emotion":{"label":"curious","animation_hint":"none"},"query":"Weather in Paris today"}"#,
        )
        .unwrap();
        assert_eq!(reply.pending_query(), Some("Weather in Paris today"));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = parse_reply(
            r#"{"mode":"local","message":"hi","emotion":{"label":"happy","animation_hint":"none","confidence":0.5}}"#,
        )
        .unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn test_not_json_is_malformed() {
        assert!(parse_reply("Sure! Here's the answer").unwrap_err().is_malformed());
        assert!(parse_reply(r#"{"message":"no mode"}"#).unwrap_err().is_malformed());
    }

    #[test]
    fn test_blank_is_empty() {
        assert!(matches!(parse_reply("  \n"), Err(AuraError::EmptyResponse)));
        assert!(matches!(
            parse_reply(r#"{"mode":"local","message":" ","emotion":{"label":"happy","animation_hint":"none"}}"#),
            Err(AuraError::EmptyResponse)
        ));
    }

    #[test]
    fn test_schema_lists_every_label() {
        let schema = response_schema();
        let labels = schema["properties"]["emotion"]["properties"]["label"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(labels.len(), EmotionLabel::ALL.len());
        assert_eq!(schema["required"], json!(["mode", "message", "emotion"]));
    }
}
