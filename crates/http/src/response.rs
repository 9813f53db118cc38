//! Success envelope shared by every JSON endpoint

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{ success, data?, count?, message?, query? }`
///
/// Failures use the same `success` flag through [`crate::error::AppError`].
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Successful response carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            count: None,
            message: None,
            query: None,
            data: Some(data),
        }
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Echo the query a search was run with
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }
}

impl ApiResponse<()> {
    /// Successful response with a message and no payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            count: None,
            message: Some(message.into()),
            query: None,
            data: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
