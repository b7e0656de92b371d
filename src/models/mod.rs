//! Request/response records for the /generate endpoint.
//!
//! Both records are request-scoped; nothing is persisted or mutated
//! after construction.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ErrorKind;

/// Inbound generation request. Optional fields fall back to configured
/// defaults; bounds beyond the static ones here are checked against the
/// configured limits in the handler.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerationRequest {
    #[validate(length(min = 1, max = 4000, message = "Prompt must be 1-4000 characters"))]
    pub prompt: String,

    pub model: Option<String>,

    #[validate(range(min = 1, message = "max_tokens must be a positive integer"))]
    pub max_tokens: Option<u32>,

    #[validate(range(min = 0.0, max = 2.0, message = "temperature must be between 0 and 2"))]
    pub temperature: Option<f32>,
}

/// Token accounting reported by the upstream service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Outcome of a generation request. Exactly one of `content`/`error`
/// is populated.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<ErrorKind>,
}

impl GenerationResult {
    pub fn success(content: String, model: String, usage: Usage) -> Self {
        Self {
            success: true,
            content: Some(content),
            model: Some(model),
            usage: Some(usage),
            error: None,
            error_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_is_required() {
        let request: Result<GenerationRequest, _> = serde_json::from_str(r#"{"model":"x"}"#);
        assert!(request.is_err());
    }

    #[test]
    fn empty_prompt_fails_validation() {
        let request = GenerationRequest {
            prompt: String::new(),
            model: None,
            max_tokens: None,
            temperature: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn out_of_range_temperature_fails_validation() {
        let request = GenerationRequest {
            prompt: "hello".to_string(),
            model: None,
            max_tokens: None,
            temperature: Some(2.5),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn zero_max_tokens_fails_validation() {
        let request = GenerationRequest {
            prompt: "hello".to_string(),
            model: None,
            max_tokens: Some(0),
            temperature: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn success_result_omits_error_fields() {
        let result = GenerationResult::success(
            "generated text".to_string(),
            "gpt-3.5-turbo".to_string(),
            Usage {
                prompt_tokens: 10,
                completion_tokens: 20,
                total_tokens: 30,
            },
        );
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["content"], "generated text");
        assert!(json.get("error").is_none());
        assert!(json.get("error_type").is_none());
    }
}
