//! Chat-completions payload construction.
//!
//! The wire format here is versioned-by-observation: it reproduces the
//! envelope the web frontend sends, as captured from live traffic. Field
//! names and the discriminator triples are load-bearing even where they look
//! redundant (`chat_type` vs `sub_chat_type` vs `extra.meta.subChatType`).

use crate::capability::{ModelCategory, ModelConfig};
use serde_json::{json, Value};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Request discriminator selecting plain chat, web-search-augmented chat,
/// or text-to-image generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatMode {
    Plain,
    WebSearch,
    TextToImage,
}

impl ChatMode {
    /// (`chat_mode`, `chat_type`/`sub_chat_type`, `user_action`)
    fn discriminators(self) -> (&'static str, &'static str, &'static str) {
        match self {
            ChatMode::Plain => ("normal", "t2t", "chat"),
            ChatMode::WebSearch => ("web_search", "t2t_search", "chat_with_search"),
            ChatMode::TextToImage => ("image_generation", "t2i", "image_generation"),
        }
    }
}

/// An opaque file id returned by the upload endpoint.
#[derive(Debug, Clone)]
pub struct FileId(pub String);

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Build the full chat-completions payload.
///
/// Temperature and token ceiling are only emitted when they differ from the
/// standard defaults, matching observed frontend behavior.
pub fn chat_payload(
    message: &str,
    chat_id: &str,
    model: &str,
    cfg: &ModelConfig,
    mode: ChatMode,
    stream: bool,
    file_ids: &[FileId],
) -> Value {
    let (chat_mode, chat_type, user_action) = mode.discriminators();
    let turn_id = Uuid::new_v4().to_string();
    let fid = Uuid::new_v4().to_string();
    let timestamp = unix_timestamp();

    let files: Vec<Value> = file_ids
        .iter()
        .map(|id| json!({"file_id": id.0, "type": "attachment"}))
        .collect();

    let mut feature_config = cfg.feature_flags.clone();
    if mode == ChatMode::WebSearch {
        feature_config["web_search_enabled"] = json!(true);
    }
    if mode == ChatMode::TextToImage {
        feature_config = json!({"thinking_enabled": false, "output_schema": "image"});
    }

    let mut payload = json!({
        "stream": stream,
        "incremental_output": stream,
        "chat_id": chat_id,
        "chat_mode": chat_mode,
        "model": model,
        "parent_id": null,
        "messages": [{
            "fid": fid,
            "parentId": null,
            "childrenIds": [],
            "role": "user",
            "content": message,
            "user_action": user_action,
            "files": files,
            "timestamp": timestamp,
            "models": [model],
            "chat_type": chat_type,
            "feature_config": feature_config,
            "extra": {
                "meta": {"subChatType": chat_type}
            },
            "sub_chat_type": chat_type,
            "parent_id": null
        }],
        "timestamp": timestamp,
        "turn_id": turn_id,
        "modelIdx": 0
    });

    if mode == ChatMode::WebSearch {
        payload["web_search"] = json!(true);
    }

    if mode != ChatMode::TextToImage {
        match cfg.category {
            ModelCategory::Reasoning => {
                payload["reasoning_mode"] = json!(true);
                payload["max_reasoning_steps"] = json!(10);
            }
            ModelCategory::Coding => {
                payload["code_mode"] = json!(true);
                payload["syntax_highlighting"] = json!(true);
            }
            ModelCategory::Vision => {
                payload["multimodal"] = json!(true);
                payload["vision_enabled"] = json!(true);
            }
            _ => {}
        }

        if cfg.optimal_temperature != 0.3 {
            payload["temperature"] = json!(cfg.optimal_temperature);
        }
        if cfg.max_tokens != 2048 {
            payload["max_tokens"] = json!(cfg.max_tokens);
        }
    }

    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::resolve;

    #[test]
    fn plain_chat_discriminators() {
        let cfg = resolve(Some("qwen-turbo"));
        let p = chat_payload("hi", "c1", "qwen-turbo", &cfg, ChatMode::Plain, true, &[]);
        assert_eq!(p["chat_mode"], "normal");
        assert_eq!(p["messages"][0]["chat_type"], "t2t");
        assert_eq!(p["messages"][0]["sub_chat_type"], "t2t");
        assert_eq!(p["messages"][0]["extra"]["meta"]["subChatType"], "t2t");
        assert_eq!(p["messages"][0]["user_action"], "chat");
        assert!(p.get("web_search").is_none());
        // Standard defaults are left implicit.
        assert!(p.get("temperature").is_none());
        assert!(p.get("max_tokens").is_none());
    }

    #[test]
    fn web_search_sets_mode_and_flag() {
        let cfg = resolve(Some("qwen-turbo"));
        let p = chat_payload("hi", "c1", "qwen-turbo", &cfg, ChatMode::WebSearch, false, &[]);
        assert_eq!(p["chat_mode"], "web_search");
        assert_eq!(p["messages"][0]["chat_type"], "t2t_search");
        assert_eq!(p["web_search"], true);
        assert_eq!(
            p["messages"][0]["feature_config"]["web_search_enabled"],
            true
        );
    }

    #[test]
    fn image_mode_uses_image_schema() {
        let cfg = resolve(None);
        let p = chat_payload(
            "a sunset",
            "c1",
            "qwen3-235b-a22b",
            &cfg,
            ChatMode::TextToImage,
            false,
            &[],
        );
        assert_eq!(p["chat_mode"], "image_generation");
        assert_eq!(p["messages"][0]["chat_type"], "t2i");
        assert_eq!(p["messages"][0]["user_action"], "image_generation");
        assert_eq!(
            p["messages"][0]["feature_config"]["output_schema"],
            "image"
        );
        assert_eq!(p["stream"], false);
    }

    #[test]
    fn category_extras_and_tuning() {
        let cfg = resolve(Some("qwq-32b"));
        let p = chat_payload("why", "c1", "qwq-32b", &cfg, ChatMode::Plain, true, &[]);
        assert_eq!(p["reasoning_mode"], true);
        assert_eq!(p["max_reasoning_steps"], 10);
        assert_eq!(p["temperature"], 0.2);
        assert_eq!(p["max_tokens"], 8192);

        let coder = resolve(Some("qwen-coder"));
        let p = chat_payload("fn", "c1", "qwen-coder", &coder, ChatMode::Plain, true, &[]);
        assert_eq!(p["code_mode"], true);
    }

    #[test]
    fn file_attachments_are_threaded() {
        let cfg = resolve(None);
        let ids = vec![FileId("f-1".into()), FileId("f-2".into())];
        let p = chat_payload("see files", "c1", "m", &cfg, ChatMode::Plain, false, &ids);
        let files = p["messages"][0]["files"].as_array().unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0]["file_id"], "f-1");
        assert_eq!(files[1]["type"], "attachment");
    }
}
