//! HTTP models module
//!
//! Request/response shapes that belong to the HTTP surface itself; the
//! payment DTOs live with the services that produce them.

use serde::{Deserialize, Serialize};

/// Query parameters accepted by the status endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct StatusQuery {
    #[serde(rename = "refId")]
    pub ref_id: Option<String>,
}

/// JSON error body returned for failed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
