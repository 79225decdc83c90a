//! Direct HTTP client for the remote chat service's private API.
//!
//! Translates normalized requests into the observed wire format and back.
//! Every operation returns a typed `Result`; transport and decoding failures
//! never escape as panics, because the orchestrator's fallback decision
//! depends on a non-throwing contract.

pub mod envelope;
pub mod extract;
pub mod sse;

pub use envelope::{ChatMode, FileId};

use crate::capability::ModelConfig;
use crate::credential::Credential;
use crate::{Error, Result};
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde_json::{json, Value};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://chat.qwen.ai";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36";

/// Result of a direct chat completion, already normalized.
#[derive(Debug, Clone)]
pub struct DirectChat {
    pub chat_id: String,
    pub text: String,
    /// Full decoded body for non-streamed calls.
    pub body: Option<Value>,
}

/// Result of a direct image generation. Only constructed when a concrete
/// URL was extractable.
#[derive(Debug, Clone)]
pub struct DirectImage {
    pub chat_id: String,
    pub image_url: String,
    pub body: Value,
}

pub struct DirectClient {
    http: reqwest::Client,
    base_url: Url,
}

impl DirectClient {
    /// Build a client around a bearer credential.
    ///
    /// The header set mimics the web frontend; the private API has been
    /// observed to reject requests that look too little like a browser.
    pub fn new(credential: &Credential, base_url: Option<&str>) -> Result<Self> {
        let base_url = Url::parse(base_url.unwrap_or(DEFAULT_BASE_URL))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        headers.insert("Accept-Language", HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));
        headers.insert("Origin", HeaderValue::from_static(DEFAULT_BASE_URL));
        headers.insert("Referer", HeaderValue::from_static("https://chat.qwen.ai/"));
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        let bearer = format!("Bearer {}", credential.token());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer).map_err(|_| Error::CredentialMissing)?,
        );

        let timeout_secs = env::var("QWEN_HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(30);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(Error::Transport)?;

        Ok(Self { http, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .await
            .unwrap_or_default()
            .chars()
            .take(200)
            .collect();
        Err(Error::UpstreamRejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, String)]) -> Result<Value> {
        let response = self
            .http
            .get(self.endpoint(path)?)
            .query(query)
            .send()
            .await?;
        Ok(Self::check(response).await?.json().await?)
    }

    // ------------------------------------------------------------------
    // Conversations and messaging
    // ------------------------------------------------------------------

    /// Create a new remote conversation and return its id.
    pub async fn create_chat(&self, folder_id: Option<&str>) -> Result<String> {
        let mut payload = json!({});
        if let Some(folder) = folder_id {
            payload["folder_id"] = json!(folder);
        }

        let response = self
            .http
            .post(self.endpoint("/api/v2/chats/new")?)
            .json(&payload)
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        extract::created_chat_id(&body)
            .ok_or_else(|| Error::malformed("chat creation response carried no id"))
    }

    /// Ensure a conversation exists, creating one when the caller has none.
    async fn ensure_chat(&self, chat_id: Option<&str>) -> Result<String> {
        match chat_id {
            Some(id) => Ok(id.to_string()),
            None => self.create_chat(None).await,
        }
    }

    fn completion_request(
        &self,
        payload: &Value,
        chat_id: &str,
        mode: ChatMode,
    ) -> Result<reqwest::RequestBuilder> {
        let mut request = self
            .http
            .post(self.endpoint("/api/v2/chat/completions")?)
            .query(&[("chat_id", chat_id)])
            .json(payload);
        if mode == ChatMode::WebSearch {
            request = request.query(&[("web_search", "true")]);
        }
        Ok(request)
    }

    /// Send a chat completion in the given mode.
    ///
    /// Streamed calls consume the SSE delta sequence into the final text;
    /// non-streamed calls decode the whole body and normalize it.
    pub async fn chat_completion(
        &self,
        message: &str,
        chat_id: Option<&str>,
        model: &str,
        cfg: &ModelConfig,
        mode: ChatMode,
        stream: bool,
        file_ids: &[FileId],
    ) -> Result<DirectChat> {
        if stream {
            let (chat_id, deltas) = self
                .chat_stream(message, chat_id, model, cfg, mode, file_ids)
                .await?;
            let text = sse::collect_text(deltas).await?;
            return Ok(DirectChat {
                chat_id,
                text,
                body: None,
            });
        }

        let chat_id = self.ensure_chat(chat_id).await?;
        let payload = envelope::chat_payload(message, &chat_id, model, cfg, mode, false, file_ids);
        let request = self.completion_request(&payload, &chat_id, mode)?;

        let body: Value = Self::check(request.send().await?).await?.json().await?;
        let text = extract::response_text(&body)
            .ok_or_else(|| Error::malformed("completion body carried no content field"))?;
        Ok(DirectChat {
            chat_id,
            text,
            body: Some(body),
        })
    }

    /// Send a streamed chat completion and return the conversation id with
    /// the lazy delta sequence. Dropping the stream abandons the response.
    pub async fn chat_stream(
        &self,
        message: &str,
        chat_id: Option<&str>,
        model: &str,
        cfg: &ModelConfig,
        mode: ChatMode,
        file_ids: &[FileId],
    ) -> Result<(String, sse::DeltaStream)> {
        let chat_id = self.ensure_chat(chat_id).await?;
        let payload = envelope::chat_payload(message, &chat_id, model, cfg, mode, true, file_ids);
        let request = self
            .completion_request(&payload, &chat_id, mode)?
            .header(ACCEPT, "text/event-stream");

        let response = Self::check(request.send().await?).await?;
        Ok((chat_id, sse::delta_stream(response.bytes_stream())))
    }

    /// Chat with the web-search-augmented envelope.
    pub async fn chat_with_web_search(
        &self,
        message: &str,
        chat_id: Option<&str>,
        model: &str,
        cfg: &ModelConfig,
        stream: bool,
    ) -> Result<DirectChat> {
        self.chat_completion(message, chat_id, model, cfg, ChatMode::WebSearch, stream, &[])
            .await
    }

    /// Chat with previously uploaded attachments.
    pub async fn chat_with_files(
        &self,
        message: &str,
        file_ids: &[FileId],
        chat_id: Option<&str>,
        model: &str,
        cfg: &ModelConfig,
        stream: bool,
    ) -> Result<DirectChat> {
        self.chat_completion(message, chat_id, model, cfg, ChatMode::Plain, stream, file_ids)
            .await
    }

    /// Upload one local file, returning the opaque id the message envelope
    /// references.
    pub async fn upload_file(&self, path: &Path) -> Result<FileId> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());

        let payload = json!({
            "file_name": file_name,
            "file_content": base64::engine::general_purpose::STANDARD.encode(&bytes),
            "file_type": "auto",
            "file_size": bytes.len(),
            "upload_type": "chat_attachment",
        });

        let response = self
            .http
            .post(self.endpoint("/api/v2/files/upload")?)
            .json(&payload)
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        body.pointer("/data/file_id")
            .and_then(Value::as_str)
            .map(|id| FileId(id.to_string()))
            .ok_or_else(|| Error::malformed("upload response carried no file_id"))
    }

    /// Generate an image from a prompt.
    ///
    /// Succeeds only when a concrete URL is extractable: a structurally
    /// valid 200 with no discoverable image reference is indistinguishable
    /// from "no image produced", so it fails toward the fallback path.
    pub async fn generate_image(
        &self,
        prompt: &str,
        chat_id: Option<&str>,
        model: &str,
        cfg: &ModelConfig,
    ) -> Result<DirectImage> {
        let chat_id = self.ensure_chat(chat_id).await?;
        let payload = envelope::chat_payload(
            prompt,
            &chat_id,
            model,
            cfg,
            ChatMode::TextToImage,
            false,
            &[],
        );

        let response = self
            .http
            .post(self.endpoint("/api/v2/chat/completions")?)
            .query(&[("chat_id", chat_id.as_str())])
            .json(&payload)
            .send()
            .await?;
        let body: Value = Self::check(response).await?.json().await?;

        match extract::image_url(&body) {
            Some(image_url) => Ok(DirectImage {
                chat_id,
                image_url,
                body,
            }),
            None => Err(Error::malformed(
                "image generation returned no discoverable image URL",
            )),
        }
    }

    // ------------------------------------------------------------------
    // Listing and account endpoints
    // ------------------------------------------------------------------

    pub async fn list_models(&self) -> Result<Vec<Value>> {
        let body = self.get_json("/api/models", &[]).await?;
        Ok(extract::model_list(&body))
    }

    pub async fn list_conversations(&self, page: u32) -> Result<Value> {
        self.get_json("/api/v2/chats/", &[("page", page.to_string())])
            .await
    }

    pub async fn list_folders(&self) -> Result<Value> {
        self.get_json("/api/v2/folders/", &[]).await
    }

    /// Authentication probe; the orchestrator runs this once at startup.
    pub async fn auth_status(&self) -> Result<Value> {
        self.get_json("/api/v1/auths/", &[]).await
    }

    pub async fn user_settings(&self) -> Result<Value> {
        self.get_json("/api/v2/users/user/settings", &[]).await
    }
}
