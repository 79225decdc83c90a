//! Core request/result contracts shared by both delivery paths.
//!
//! The reply types are the uniform output contract of the orchestrator:
//! callers never see path-specific shapes, whichever path produced them.

pub mod reply;
pub mod request;

pub use reply::{ChatReply, ImageReply, ModelsReply};
pub use request::ChatRequest;
