use serde::{Deserialize, Serialize};

/// Fallback content recorded when a persona call returns no usable text.
pub const NO_RESPONSE: &str = "No response";

/// One uploaded image, decoded into memory for the duration of a single
/// request. Dropping the request input releases every buffer, on success
/// and failure paths alike.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

/// The validated payload of one analysis request. Not persisted; no
/// identity beyond the request that carries it.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub user_text: String,
    pub images: Vec<ImageAttachment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Success,
    Failure,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentStatus::Success => "success",
            AgentStatus::Failure => "failure",
        };
        f.write_str(s)
    }
}

/// One persona's result. On the wire the content field is named `data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub status: AgentStatus,
    #[serde(rename = "data")]
    pub content: String,
}

impl AgentReply {
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            status: AgentStatus::Success,
            content: content.into(),
        }
    }

    pub fn failure(content: impl Into<String>) -> Self {
        Self {
            status: AgentStatus::Failure,
            content: content.into(),
        }
    }

    pub fn no_response() -> Self {
        Self::failure(NO_RESPONSE)
    }
}

/// The four fixed persona slots. A struct rather than a map so the
/// all-four-keys invariant holds by construction: a per-agent failure
/// degrades its slot, it never removes the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisData {
    pub therapist: AgentReply,
    pub closure: AgentReply,
    pub routine: AgentReply,
    pub honesty: AgentReply,
}

/// Top-level response envelope. HTTP status is always 200; failure is
/// signaled only through `success` and `error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AnalysisData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    pub fn ok(data: AnalysisData) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn agent_reply_serializes_wire_shape() {
        let reply = AgentReply::success("Be gentle with yourself.");
        let value = serde_json::to_value(&reply).unwrap();
        assert_eq!(
            value,
            json!({"status": "success", "data": "Be gentle with yourself."})
        );
    }

    #[test]
    fn no_response_reply_is_a_failure() {
        let reply = AgentReply::no_response();
        assert_eq!(reply.status, AgentStatus::Failure);
        assert_eq!(reply.content, NO_RESPONSE);
    }

    #[test]
    fn analysis_data_serializes_exactly_four_keys() {
        let data = AnalysisData {
            therapist: AgentReply::success("a"),
            closure: AgentReply::success("b"),
            routine: AgentReply::no_response(),
            honesty: AgentReply::failure("API error (503): unavailable"),
        };
        let value = serde_json::to_value(&data).unwrap();
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["closure", "honesty", "routine", "therapist"]);
    }

    #[test]
    fn error_envelope_skips_data_field() {
        let value = serde_json::to_value(AnalysisResponse::error("boom")).unwrap();
        assert_eq!(value, json!({"success": false, "error": "boom"}));
    }

    #[test]
    fn ok_envelope_skips_error_field() {
        let data = AnalysisData {
            therapist: AgentReply::success("a"),
            closure: AgentReply::success("b"),
            routine: AgentReply::success("c"),
            honesty: AgentReply::success("d"),
        };
        let value = serde_json::to_value(AnalysisResponse::ok(data)).unwrap();
        assert_eq!(value["success"], json!(true));
        assert!(value.get("error").is_none());
    }
}
