//! Browser-automation collaborator seam.
//!
//! The automation engine drives a logged-in browser session to reproduce the
//! same user-facing actions as the direct API. Its page-interaction logic is
//! out of scope here: this module defines only the narrow contract the
//! orchestrator consumes, three operations plus session acquire/release
//! against a fixed-size pool owned by the implementation. Latency is
//! unpredictable (seconds to tens of seconds) and failure modes are
//! independent of the direct path.

use crate::types::{ChatReply, ChatRequest, ImageReply, ModelsReply};
use crate::{Error, Result};
use async_trait::async_trait;
use uuid::Uuid;

/// Opaque handle for one pooled browser session.
///
/// Handed out by [`BrowserAutomation::acquire`] and returned on release;
/// the orchestrator guarantees release on both success and failure paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    id: Uuid,
    slot: usize,
}

impl SessionHandle {
    pub fn new(slot: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            slot,
        }
    }

    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// The three operations the fallback path supports.
#[async_trait]
pub trait BrowserAutomation: Send + Sync {
    /// Check out a session from the pool, waiting if all are busy.
    async fn acquire(&self) -> Result<SessionHandle>;

    /// Return a session to the pool. Must be infallible from the caller's
    /// point of view: a session that cannot be recycled is the pool's
    /// problem, not the orchestrator's.
    async fn release(&self, session: SessionHandle);

    async fn send_message(
        &self,
        session: &SessionHandle,
        request: &ChatRequest,
    ) -> Result<ChatReply>;

    async fn generate_image(&self, session: &SessionHandle, prompt: &str) -> Result<ImageReply>;

    async fn list_models(&self, session: &SessionHandle) -> Result<ModelsReply>;
}

/// Stand-in used when no automation stack is installed.
///
/// Every operation fails with a browser error, so a direct-only deployment
/// still gets uniform replies instead of panics when the fallback is hit.
#[derive(Debug, Default)]
pub struct NullBrowser;

#[async_trait]
impl BrowserAutomation for NullBrowser {
    async fn acquire(&self) -> Result<SessionHandle> {
        Ok(SessionHandle::new(0))
    }

    async fn release(&self, _session: SessionHandle) {}

    async fn send_message(
        &self,
        _session: &SessionHandle,
        _request: &ChatRequest,
    ) -> Result<ChatReply> {
        Err(Error::browser("browser automation not available"))
    }

    async fn generate_image(&self, _session: &SessionHandle, _prompt: &str) -> Result<ImageReply> {
        Err(Error::browser("browser automation not available"))
    }

    async fn list_models(&self, _session: &SessionHandle) -> Result<ModelsReply> {
        Err(Error::browser("browser automation not available"))
    }
}
