//! HandlerResponse - fixed-shape result of every entry point

use serde::{Deserialize, Serialize};

/// Status code returned on completion
pub const STATUS_OK: u16 = 200;

/// Result returned by every entry point
///
/// Per-batch and per-query failures never change the status; they are
/// only visible in the logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerResponse {
    pub status_code: u16,
    pub body: String,
}

impl HandlerResponse {
    /// Successful completion with a short human-readable body
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: STATUS_OK,
            body: body.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_wire_shape() {
        let response = HandlerResponse::ok("Successfully sent messages");
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"statusCode":200,"body":"Successfully sent messages"}"#
        );
    }
}
