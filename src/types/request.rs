//! Inbound chat request.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A normalized chat request, independent of which path will serve it.
///
/// `chat_id` is optional: when absent, the serving path creates a new remote
/// conversation as a side effect and threads its id through the reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
    #[serde(default)]
    pub chat_id: Option<String>,
    #[serde(default)]
    pub use_web_search: bool,
    #[serde(default)]
    pub agent_name: Option<String>,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub file_paths: Vec<PathBuf>,
}

impl ChatRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            chat_id: None,
            use_web_search: false,
            agent_name: None,
            model_name: None,
            file_paths: Vec::new(),
        }
    }

    pub fn with_chat_id(mut self, chat_id: impl Into<String>) -> Self {
        self.chat_id = Some(chat_id.into());
        self
    }

    pub fn with_web_search(mut self) -> Self {
        self.use_web_search = true;
        self
    }

    pub fn with_agent(mut self, agent_name: impl Into<String>) -> Self {
        self.agent_name = Some(agent_name.into());
        self
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn with_files(mut self, file_paths: Vec<PathBuf>) -> Self {
        self.file_paths = file_paths;
        self
    }
}
