//! Response DTOs for the session endpoints.

use serde::Serialize;

/// GET /api/auth/session response.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentSessionResponse {
    pub user_id: i64,
}

/// Error body for non-authentication failures.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: "SERVICE_UNAVAILABLE".to_string(),
        }
    }
}
