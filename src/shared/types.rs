use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Uniform envelope returned by every endpoint, success or failure.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>) -> Self {
        Self {
            success: true,
            data,
            message,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            success: false,
            data,
            message: Some(message.into()),
            error: Some(error.into()),
        }
    }
}

impl ApiResponse<()> {
    /// Success envelope carrying only a message (deletes, registration, watch marks)
    pub fn message(message: impl Into<String>) -> Self {
        Self::success(None, Some(message.into()))
    }
}
