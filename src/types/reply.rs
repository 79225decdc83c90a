//! Uniform reply types returned by the orchestrator.
//!
//! Both delivery paths are normalized into these shapes before anything is
//! returned, so the boundary layer can serialize them as-is. The `success`
//! flag and `error` field are mutually exclusive by construction.

use serde::Serialize;
use serde_json::Value;

/// Result of a chat operation.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    /// Opaque decoded body from the serving path, for callers that want
    /// more than the flattened text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatReply {
    pub fn ok(response: impl Into<String>, chat_id: Option<String>, raw: Option<Value>) -> Self {
        Self {
            success: true,
            response: response.into(),
            chat_id,
            raw,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            response: String::new(),
            chat_id: None,
            raw: None,
            error: Some(error.into()),
        }
    }
}

/// Result of an image-generation operation.
#[derive(Debug, Clone, Serialize)]
pub struct ImageReply {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageReply {
    pub fn ok(image_url: impl Into<String>, chat_id: Option<String>) -> Self {
        Self {
            success: true,
            image_url: Some(image_url.into()),
            chat_id,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>, chat_id: Option<String>) -> Self {
        Self {
            success: false,
            image_url: None,
            chat_id,
            error: Some(error.into()),
        }
    }
}

/// Result of a model-listing operation.
#[derive(Debug, Clone, Serialize)]
pub struct ModelsReply {
    pub success: bool,
    pub data: Vec<Value>,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ModelsReply {
    pub fn ok(data: Vec<Value>) -> Self {
        let count = data.len();
        Self {
            success: true,
            data,
            count,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            count: 0,
            error: Some(error.into()),
        }
    }
}
