//! Model capability table.
//!
//! Pure lookup from a model name to its configuration. Classification is
//! best-effort substring matching against a fixed, ordered rule list; the
//! rule order is part of the tested contract because changing it changes
//! classification results silently.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Model used when the caller does not name one.
pub const DEFAULT_MODEL: &str = "qwen3-235b-a22b";

/// Coarse model category, chosen by the first matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelCategory {
    Coding,
    Vision,
    Reasoning,
    Advanced,
    Multimodal,
    Standard,
}

/// Per-model configuration derived from the model name.
///
/// Never persisted; recomputed per request. Governs payload shaping
/// downstream: temperature, token ceiling, and which feature flags are
/// advertised in the message envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelConfig {
    pub category: ModelCategory,
    pub supports_web_search: bool,
    pub supports_files: bool,
    pub supports_images: bool,
    pub supports_audio: bool,
    pub optimal_temperature: f64,
    pub max_tokens: u32,
    pub thinking_enabled: bool,
    /// Output schema variant advertised to the remote ("phase", "thinking").
    pub output_schema: &'static str,
    /// The `feature_config` fragment forwarded verbatim in the envelope.
    pub feature_flags: Value,
}

/// Resolve a model name into its configuration.
///
/// Total and case-insensitive: an absent or unrecognized name yields the
/// standard default. Rules are checked in priority order; exactly one
/// category is chosen.
pub fn resolve(model_name: Option<&str>) -> ModelConfig {
    let lower = model_name.unwrap_or("").to_lowercase();

    if lower.contains("coder") {
        return ModelConfig {
            category: ModelCategory::Coding,
            supports_web_search: true,
            supports_files: true,
            supports_images: false,
            supports_audio: false,
            optimal_temperature: 0.1,
            max_tokens: 4096,
            thinking_enabled: true,
            output_schema: "phase",
            feature_flags: json!({
                "thinking_enabled": true,
                "output_schema": "phase",
                "code_completion": true,
            }),
        };
    }

    if ["vl", "vision", "qvq"].iter().any(|s| lower.contains(s)) {
        return ModelConfig {
            category: ModelCategory::Vision,
            supports_web_search: true,
            supports_files: true,
            supports_images: true,
            supports_audio: false,
            optimal_temperature: 0.3,
            max_tokens: 2048,
            thinking_enabled: false,
            output_schema: "phase",
            feature_flags: json!({
                "thinking_enabled": false,
                "output_schema": "phase",
                "vision_enabled": true,
            }),
        };
    }

    if lower.contains("qwq") {
        return ModelConfig {
            category: ModelCategory::Reasoning,
            supports_web_search: true,
            supports_files: true,
            supports_images: false,
            supports_audio: false,
            optimal_temperature: 0.2,
            max_tokens: 8192,
            thinking_enabled: true,
            output_schema: "thinking",
            feature_flags: json!({
                "thinking_enabled": true,
                "output_schema": "thinking",
                "step_by_step": true,
            }),
        };
    }

    if ["max", "plus", "235b"].iter().any(|s| lower.contains(s)) {
        return ModelConfig {
            category: ModelCategory::Advanced,
            supports_web_search: true,
            supports_files: true,
            supports_images: true,
            supports_audio: false,
            optimal_temperature: 0.3,
            max_tokens: 6144,
            thinking_enabled: true,
            output_schema: "phase",
            feature_flags: json!({
                "thinking_enabled": true,
                "output_schema": "phase",
                "advanced_reasoning": true,
                "image_generation": true,
            }),
        };
    }

    if lower.contains("omni") {
        return ModelConfig {
            category: ModelCategory::Multimodal,
            supports_web_search: true,
            supports_files: true,
            supports_images: false,
            supports_audio: true,
            optimal_temperature: 0.3,
            max_tokens: 4096,
            thinking_enabled: false,
            output_schema: "phase",
            feature_flags: json!({
                "thinking_enabled": false,
                "output_schema": "phase",
                "multimodal": true,
            }),
        };
    }

    ModelConfig {
        category: ModelCategory::Standard,
        supports_web_search: true,
        supports_files: true,
        supports_images: false,
        supports_audio: false,
        optimal_temperature: 0.3,
        max_tokens: 2048,
        thinking_enabled: false,
        output_schema: "phase",
        feature_flags: json!({
            "thinking_enabled": false,
            "output_schema": "phase",
        }),
    }
}
