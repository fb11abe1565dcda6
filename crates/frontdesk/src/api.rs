//! Request and response bodies of the HTTP surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::router::{ChatOutcome, SessionStatus};

// ============================================================================
// Service
// ============================================================================

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootResponse {
    pub message: String,
    pub config_dir: String,
}

// ============================================================================
// Chat
// ============================================================================

/// Body of `POST /status`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub session_id: String,
    pub remaining: u32,
    pub end: bool,
}

impl From<SessionStatus> for StatusResponse {
    fn from(status: SessionStatus) -> Self {
        Self {
            session_id: status.session_id,
            remaining: status.remaining,
            end: status.end,
        }
    }
}

/// Body of `POST /chat`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub end: bool,
    pub session_id: String,
    pub remaining: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub handoff: Option<bool>,
    /// Only on the turn that closed the session by turn limit.
    #[serde(flatten)]
    pub topic: Option<TopicResult>,
}

/// Classification attached to the closing turn. `confidence` is always present,
/// `null` when unknown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicResult {
    pub category: String,
    pub confidence: Option<f64>,
}

impl From<ChatOutcome> for ChatResponse {
    fn from(outcome: ChatOutcome) -> Self {
        Self {
            reply: outcome.reply,
            end: outcome.end,
            session_id: outcome.session_id,
            remaining: outcome.remaining,
            handoff: outcome.handoff.then_some(true),
            topic: outcome.topic.map(|t| TopicResult {
                category: t.category,
                confidence: t.confidence,
            }),
        }
    }
}

// ============================================================================
// Admin
// ============================================================================

/// Body of `PUT /admin/config`.
#[derive(Debug, Clone, Deserialize)]
pub struct WriteConfigRequest {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteConfigResponse {
    pub saved: String,
    pub mtime: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReloadResponse {
    pub reloaded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{Route, TopicVerdict};

    fn outcome() -> ChatOutcome {
        ChatOutcome {
            session_id: "s1".to_string(),
            reply: "Halo".to_string(),
            end: false,
            remaining: 4,
            handoff: false,
            topic: None,
            route: Route::SmallTalk,
        }
    }

    #[test]
    fn plain_reply_omits_optional_fields() {
        let json = serde_json::to_value(ChatResponse::from(outcome())).unwrap();
        assert_eq!(json["remaining"], 4);
        assert!(json.get("handoff").is_none());
        assert!(json.get("category").is_none());
        assert!(json.get("confidence").is_none());
    }

    #[test]
    fn closing_reply_flattens_topic_with_null_confidence() {
        let mut o = outcome();
        o.end = true;
        o.topic = Some(TopicVerdict {
            category: "anak".to_string(),
            ..TopicVerdict::default()
        });
        let json = serde_json::to_value(ChatResponse::from(o)).unwrap();
        assert_eq!(json["category"], "anak");
        assert!(json["confidence"].is_null());
        assert!(json.as_object().unwrap().contains_key("confidence"));
    }

    #[test]
    fn handoff_only_when_set() {
        let mut o = outcome();
        o.handoff = true;
        let json = serde_json::to_value(ChatResponse::from(o)).unwrap();
        assert_eq!(json["handoff"], true);
    }

    #[test]
    fn lenient_request_fields() {
        let req: ChatRequest = serde_json::from_str(r#"{"session_id": null}"#).unwrap();
        assert!(req.message.is_none());
        assert!(req.session_id.is_none());
    }
}
