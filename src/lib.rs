//! # qwen-hybrid
//!
//! Hybrid client for the reverse-engineered Qwen chat web service: a fast
//! direct HTTP path against the private API, with a browser-automation
//! fallback for when the direct path is unavailable or misbehaves.
//!
//! ## Overview
//!
//! The remote API is undocumented and has no stable schema contract, so this
//! crate treats it as versioned-by-observation: requests reproduce the
//! envelope the web frontend sends, and responses are parsed defensively
//! across every shape that has been captured. The interesting part is the
//! [`Orchestrator`]: per logical operation it attempts the direct path,
//! judges the outcome stricter than a bare success flag where the operation
//! demands it, falls back to the browser collaborator once on any
//! disqualifying outcome, and records latency per path into an in-memory
//! performance aggregate.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qwen_hybrid::{ChatRequest, Credential, NullBrowser, Orchestrator};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> qwen_hybrid::Result<()> {
//!     let credential = Credential::discover("https://chat.qwen.ai").ok();
//!     let orchestrator =
//!         Orchestrator::connect(credential, Arc::new(NullBrowser), None).await?;
//!
//!     let reply = orchestrator
//!         .send_message(ChatRequest::new("Hello there").with_model("qwen-turbo"))
//!         .await;
//!     println!("{}", reply.response);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`orchestrator`] | Failover decision core and per-call statistics recording |
//! | [`direct`] | Direct HTTP client for the private API (envelope, SSE, extraction) |
//! | [`browser`] | Browser-automation collaborator trait and session contract |
//! | [`capability`] | Pure model-name → configuration lookup table |
//! | [`stats`] | In-memory performance aggregate |
//! | [`credential`] | Bearer-token discovery (keyring, env, storage-state export) |
//! | [`types`] | Uniform request/reply contracts |

pub mod browser;
pub mod capability;
pub mod credential;
pub mod direct;
pub mod orchestrator;
pub mod stats;
pub mod types;

/// Error type for the crate
pub mod error;
pub use error::Error;

/// Result type alias for the crate
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the main surface for convenience
pub use browser::{BrowserAutomation, NullBrowser, SessionHandle};
pub use capability::{resolve, ModelCategory, ModelConfig, DEFAULT_MODEL};
pub use credential::Credential;
pub use direct::{ChatMode, DirectClient, FileId};
pub use orchestrator::Orchestrator;
pub use stats::{OperationKind, PathKind, PerfSnapshot, PerfTracker};
pub use types::{ChatReply, ChatRequest, ImageReply, ModelsReply};
