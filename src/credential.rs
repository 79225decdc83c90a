//! Bearer-token discovery.
//!
//! The remote service authenticates with a JWT harvested from a logged-in
//! browser session. Resolution order: OS keyring, environment variable,
//! then a Playwright `storage_state.json` export. Absence is a normal,
//! non-fatal condition that routes the process to browser-only mode.

use crate::{Error, Result};
use serde_json::Value;
use std::env;
use std::path::Path;

const KEYRING_SERVICE: &str = "qwen-hybrid";
const TOKEN_ENV_VAR: &str = "QWEN_API_TOKEN";
const STORAGE_STATE_ENV_VAR: &str = "QWEN_STORAGE_STATE";
const DEFAULT_STORAGE_STATE: &str = "/app/storage_state.json";

/// An opaque bearer token.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Discover a token for the given chat origin.
    ///
    /// 1. OS keyring entry for this service
    /// 2. `QWEN_API_TOKEN` environment variable
    /// 3. Playwright storage-state export (`QWEN_STORAGE_STATE`, defaulting
    ///    to the container path the session recorder writes to)
    pub fn discover(origin: &str) -> Result<Self> {
        if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, "api") {
            if let Ok(token) = entry.get_password() {
                return Ok(Self(token));
            }
        }

        if let Ok(token) = env::var(TOKEN_ENV_VAR) {
            if !token.trim().is_empty() {
                return Ok(Self(token));
            }
        }

        let path = env::var(STORAGE_STATE_ENV_VAR)
            .unwrap_or_else(|_| DEFAULT_STORAGE_STATE.to_string());
        if Path::new(&path).exists() {
            return Self::from_storage_state(&path, origin);
        }

        Err(Error::CredentialMissing)
    }

    /// Extract the `token` localStorage item for `origin` from a Playwright
    /// storage-state export.
    pub fn from_storage_state(path: impl AsRef<Path>, origin: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let state: Value = serde_json::from_str(&raw)?;

        let origins = state
            .get("origins")
            .and_then(Value::as_array)
            .ok_or(Error::CredentialMissing)?;

        for entry in origins {
            if entry.get("origin").and_then(Value::as_str) != Some(origin) {
                continue;
            }
            let items = entry
                .get("localStorage")
                .and_then(Value::as_array)
                .ok_or(Error::CredentialMissing)?;
            for item in items {
                if item.get("name").and_then(Value::as_str) == Some("token") {
                    if let Some(token) = item.get("value").and_then(Value::as_str) {
                        return Ok(Self(token.to_string()));
                    }
                }
            }
        }

        Err(Error::CredentialMissing)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Credential").field(&"<redacted>").finish()
    }
}
