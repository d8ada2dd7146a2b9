//! Per-content-kind analysis pipelines.
//!
//! One pipeline instance exists per content kind for the lifetime of a
//! session engine. Each `process` call walks the same state machine:
//! cache check, decode, optional transcode, model call, optional parse,
//! optional commentary call, then a terminal outcome. Failures are caught
//! at the pipeline boundary and tagged; they never escape to the session
//! loop.

mod audio;
mod camera;
mod screen;

pub use audio::AudioPipeline;
pub use camera::CameraPipeline;
pub use screen::ScreenPipeline;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::Result;
use crate::capability::{ChatMessage, ChatModel};
use crate::error::EngineError;
use crate::history::HistoryRing;
use crate::types::SUPPRESSED_PLACEHOLDER;

/// History entries included in a commentary prompt.
const COMMENT_HISTORY_DEPTH: usize = 3;

/// Token budget for a commentary generation.
const COMMENT_MAX_TOKENS: u32 = 50;

const COMMENT_SYSTEM_PROMPT: &str =
    "You generate only short reaction comments, with no extra explanation. \
     Most comments stay under 15 characters; long ones are rare.";

/// Strip markdown code fences some models wrap JSON responses in.
fn strip_code_fences(raw: &str) -> &str {
    raw.trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
}

/// Parse a model response into the agreed schema.
///
/// A malformed payload is a contract violation by the model, not a
/// transport fault: it surfaces once as a `Parse` error and is never
/// retried.
fn parse_model_json<T: DeserializeOwned>(context: &str, raw: &str) -> Result<T> {
    let cleaned = strip_code_fences(raw);
    serde_json::from_str(cleaned).map_err(|e| {
        warn!(context, response = raw, "Model response violated schema");
        EngineError::parse_error(context, e.to_string())
    })
}

/// Build the commentary prompt from scene descriptors and recent history.
fn comment_messages(scene_line: &str, history: &HistoryRing) -> Vec<ChatMessage> {
    let recent = history.recent(COMMENT_HISTORY_DEPTH);
    let previous = if recent.is_empty() { "none".to_string() } else { recent.join(" / ") };
    let prompt = format!(
        "Write one short, playful reaction comment for a live stream.\n\
         {scene_line}\n\
         Recent comments (do not repeat them): {previous}"
    );
    vec![ChatMessage::system(COMMENT_SYSTEM_PROMPT), ChatMessage::user(prompt)]
}

/// Ask the chat model for a reaction comment, appending successes to the
/// history ring.
///
/// Commentary is cosmetic and best-effort: a failure here is collapsed to
/// the fixed placeholder instead of propagating, so it can never abort an
/// otherwise-successful analysis. This is the single site where that
/// suppression happens.
async fn generate_comment(
    chat: &dyn ChatModel,
    scene_line: &str,
    history: &mut HistoryRing,
) -> String {
    let messages = comment_messages(scene_line, history);
    match chat.complete(&messages, COMMENT_MAX_TOKENS).await {
        Ok(text) => {
            let comment = text.trim().to_string();
            history.append(comment.clone());
            comment
        }
        Err(e) => {
            warn!(error = %e, "Comment generation failed, using placeholder");
            SUPPRESSED_PLACEHOLDER.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ChatRole;

    #[test]
    fn code_fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```{\"a\":1}```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn parse_rejects_malformed_payloads() {
        #[derive(Debug, serde::Deserialize)]
        struct Scene {
            #[allow(dead_code)]
            content: String,
        }
        let err = parse_model_json::<Scene>("camera vision response", "here is a scene!")
            .unwrap_err();
        assert!(matches!(err, EngineError::Parse { .. }));
        assert_eq!(err.wire_kind(), "parse_error");
    }

    #[test]
    fn comment_prompt_includes_recent_history_only() {
        let mut history = HistoryRing::new();
        for text in ["one", "two", "three", "four"] {
            history.append(text);
        }
        let messages = comment_messages("a person, moving", &history);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        let user = &messages[1].content;
        assert!(user.contains("two / three / four"));
        assert!(!user.contains("one /"));
    }

    #[test]
    fn empty_history_prompts_with_none() {
        let history = HistoryRing::new();
        let messages = comment_messages("a scene", &history);
        assert!(messages[1].content.contains("Recent comments (do not repeat them): none"));
    }
}
