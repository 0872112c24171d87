//! Response bodies shared by every endpoint.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_MESSAGE: &str = "Request processed successfully";

/// Wrapper around every successful payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessEnvelope<T> {
    pub error: bool,
    pub success: bool,
    pub data: T,
    pub message: String,
    pub status_code: u16,
    pub timestamp: DateTime<Utc>,
}

impl<T> SuccessEnvelope<T> {
    pub fn new(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            error: false,
            success: true,
            data,
            message: message.into(),
            status_code,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_shape() {
        let body = serde_json::to_value(SuccessEnvelope::new(201, DEFAULT_MESSAGE, vec![1, 2])).unwrap();
        assert_eq!(body["error"], false);
        assert_eq!(body["success"], true);
        assert_eq!(body["statusCode"], 201);
        assert_eq!(body["message"], DEFAULT_MESSAGE);
        assert!(body["timestamp"].is_string());
    }

    #[test]
    fn test_error_envelope_is_camel_case() {
        let body = serde_json::to_string(&ErrorEnvelope {
            status_code: 404,
            message: "gone".into(),
        })
        .unwrap();
        assert_eq!(body, r#"{"statusCode":404,"message":"gone"}"#);
    }
}
