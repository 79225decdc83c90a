//! Failover orchestrator.
//!
//! For every logical operation the decision policy is the same shape: try
//! the direct path if it is usable for this process, judge the outcome
//! stricter than a bare success flag where the operation demands it, fall
//! back to the browser collaborator on any disqualifying outcome, and record
//! which path completed and how long it took. Exactly one fallback per call,
//! no retry loops within a path.

use crate::browser::BrowserAutomation;
use crate::capability::{self, ModelConfig, DEFAULT_MODEL};
use crate::credential::Credential;
use crate::direct::{ChatMode, DirectChat, DirectClient, FileId};
use crate::stats::{OperationKind, PathKind, PerfSnapshot, PerfTracker};
use crate::types::{ChatReply, ChatRequest, ImageReply, ModelsReply};
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Hybrid orchestrator: direct API primary, browser automation fallback.
///
/// Constructed once at process startup and passed by handle to request
/// handlers; there is no global singleton.
pub struct Orchestrator {
    direct: Option<DirectClient>,
    browser: Arc<dyn BrowserAutomation>,
    stats: PerfTracker,
}

impl Orchestrator {
    /// Build the orchestrator and probe the direct path once.
    ///
    /// The usable/unusable verdict is computed here and never re-evaluated:
    /// a transient auth failure at startup routes the whole process to
    /// browser-only operation until restart. That is a deliberate policy
    /// choice; adaptive re-probing would have to be added explicitly.
    ///
    /// Errors only on an invalid base URL; a missing or rejected credential
    /// is a normal downgrade, logged once.
    pub async fn connect(
        credential: Option<Credential>,
        browser: Arc<dyn BrowserAutomation>,
        base_url: Option<&str>,
    ) -> Result<Self> {
        let direct = match credential {
            Some(credential) => match DirectClient::new(&credential, base_url) {
                Ok(client) => match client.auth_status().await {
                    Ok(_) => {
                        info!("direct API client initialized and authenticated");
                        Some(client)
                    }
                    Err(e) => {
                        warn!(error = %e, "direct API auth probe failed, running browser-only");
                        None
                    }
                },
                // A token the transport cannot even carry is a rejected
                // credential, not a fatal configuration error.
                Err(Error::CredentialMissing) => {
                    warn!("credential unusable, running browser-only");
                    None
                }
                Err(e) => return Err(e),
            },
            None => {
                warn!("no API credential found, running browser-only");
                None
            }
        };

        Ok(Self {
            direct,
            browser,
            stats: PerfTracker::new(),
        })
    }

    /// Whether the direct path is usable for this process.
    pub fn direct_available(&self) -> bool {
        self.direct.is_some()
    }

    /// Read-only view of the running performance aggregate.
    pub fn performance(&self) -> PerfSnapshot {
        self.stats.snapshot()
    }

    // ------------------------------------------------------------------
    // Chat
    // ------------------------------------------------------------------

    /// Serve a chat request, whichever path can.
    pub async fn send_message(&self, request: ChatRequest) -> ChatReply {
        let started = Instant::now();
        let cfg = capability::resolve(request.model_name.as_deref());
        let model = request
            .model_name
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        info!(model = %model, category = ?cfg.category, "chat request");

        let mut direct_error = None;
        if let Some(direct) = &self.direct {
            match self.direct_chat(direct, &request, &model, &cfg).await {
                Ok(chat) => {
                    self.stats.record(
                        OperationKind::Chat,
                        PathKind::Direct,
                        started.elapsed().as_secs_f64(),
                    );
                    return ChatReply::ok(chat.text, Some(chat.chat_id), chat.body);
                }
                Err(e) => {
                    warn!(error = %e, "direct chat failed, falling back to browser");
                    direct_error = Some(e);
                }
            }
        }

        match self.browser_chat(&request).await {
            Ok(reply) => {
                self.stats.record(
                    OperationKind::Chat,
                    PathKind::Browser,
                    started.elapsed().as_secs_f64(),
                );
                reply
            }
            Err(browser_error) => ChatReply::failure(compose_failure(direct_error, browser_error)),
        }
    }

    async fn direct_chat(
        &self,
        direct: &DirectClient,
        request: &ChatRequest,
        model: &str,
        cfg: &ModelConfig,
    ) -> Result<DirectChat> {
        let chat_id = request.chat_id.as_deref();

        if request.use_web_search {
            return direct
                .chat_with_web_search(&request.prompt, chat_id, model, cfg, false)
                .await;
        }

        if !request.file_paths.is_empty() {
            let mut file_ids: Vec<FileId> = Vec::with_capacity(request.file_paths.len());
            for path in &request.file_paths {
                match direct.upload_file(path).await {
                    Ok(id) => file_ids.push(id),
                    Err(e) => warn!(path = %path.display(), error = %e, "file upload failed"),
                }
            }
            if file_ids.is_empty() {
                return Err(Error::malformed("no attachment could be uploaded"));
            }
            return direct
                .chat_with_files(&request.prompt, &file_ids, chat_id, model, cfg, false)
                .await;
        }

        direct
            .chat_completion(
                &request.prompt,
                chat_id,
                model,
                cfg,
                ChatMode::Plain,
                false,
                &[],
            )
            .await
    }

    async fn browser_chat(&self, request: &ChatRequest) -> Result<ChatReply> {
        let session = self.browser.acquire().await?;
        let result = self.browser.send_message(&session, request).await;
        self.browser.release(session).await;
        result
    }

    // ------------------------------------------------------------------
    // Image generation
    // ------------------------------------------------------------------

    /// Generate an image, whichever path can.
    ///
    /// The direct path only counts as succeeded when it produced a concrete
    /// image URL; a 200 without one falls back like any other failure.
    pub async fn generate_image(&self, prompt: &str, chat_id: Option<String>) -> ImageReply {
        let started = Instant::now();
        let cfg = capability::resolve(Some(DEFAULT_MODEL));

        let mut direct_error = None;
        if let Some(direct) = &self.direct {
            match direct
                .generate_image(prompt, chat_id.as_deref(), DEFAULT_MODEL, &cfg)
                .await
            {
                Ok(image) => {
                    self.stats.record(
                        OperationKind::Image,
                        PathKind::Direct,
                        started.elapsed().as_secs_f64(),
                    );
                    return ImageReply::ok(image.image_url, Some(image.chat_id));
                }
                Err(e) => {
                    warn!(error = %e, "direct image generation failed, falling back to browser");
                    direct_error = Some(e);
                }
            }
        }

        let browser_result = async {
            let session = self.browser.acquire().await?;
            let result = self.browser.generate_image(&session, prompt).await;
            self.browser.release(session).await;
            result
        }
        .await;

        match browser_result {
            Ok(reply) => {
                self.stats.record(
                    OperationKind::Image,
                    PathKind::Browser,
                    started.elapsed().as_secs_f64(),
                );
                reply
            }
            Err(browser_error) => {
                ImageReply::failure(compose_failure(direct_error, browser_error), chat_id)
            }
        }
    }

    // ------------------------------------------------------------------
    // Model listing
    // ------------------------------------------------------------------

    /// List available models, whichever path can.
    pub async fn get_models(&self) -> ModelsReply {
        let started = Instant::now();

        let mut direct_error = None;
        if let Some(direct) = &self.direct {
            match direct.list_models().await {
                Ok(models) => {
                    self.stats.record(
                        OperationKind::Models,
                        PathKind::Direct,
                        started.elapsed().as_secs_f64(),
                    );
                    return ModelsReply::ok(models);
                }
                Err(e) => {
                    warn!(error = %e, "direct model listing failed, falling back to browser");
                    direct_error = Some(e);
                }
            }
        }

        let browser_result = async {
            let session = self.browser.acquire().await?;
            let result = self.browser.list_models(&session).await;
            self.browser.release(session).await;
            result
        }
        .await;

        match browser_result {
            Ok(reply) => {
                self.stats.record(
                    OperationKind::Models,
                    PathKind::Browser,
                    started.elapsed().as_secs_f64(),
                );
                reply
            }
            Err(browser_error) => ModelsReply::failure(compose_failure(direct_error, browser_error)),
        }
    }
}

/// Compose the human-readable failure for the both-paths-failed case from
/// the last error each path produced.
fn compose_failure(direct_error: Option<Error>, browser_error: Error) -> String {
    match direct_error {
        Some(direct) => format!(
            "direct API failed: {}; browser fallback failed: {}",
            direct, browser_error
        ),
        None => format!("browser automation failed: {}", browser_error),
    }
}
