use std::fmt;
use std::sync::Arc;

use crate::{
    config::StudioConfig,
    error::{Result, StudioError},
    storage::{file::FileKeyValueStore, memory::MemoryKeyValueStore, traits::KeyValueStore},
};

pub const CREDENTIAL_KEY: &str = "gemini_api_key";

/// An opaque API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Credential(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential(*** {} chars)", self.0.len())
    }
}

/// Single-key wrapper over a [`KeyValueStore`]. Storage failures degrade to "absent".
#[derive(Clone)]
pub struct CredentialStore {
    backend: Arc<dyn KeyValueStore>,
}

impl CredentialStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    pub fn from_config(config: &StudioConfig) -> Self {
        Self::new(Arc::new(FileKeyValueStore::new(config.credential_path.clone())))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    pub fn get(&self) -> Option<Credential> {
        match self.backend.get(CREDENTIAL_KEY) {
            Ok(value) => value.and_then(Credential::new),
            Err(e) => {
                log::warn!("Could not read stored credential: {}", e);
                None
            }
        }
    }

    pub fn set(&self, token: &str) {
        let Some(credential) = Credential::new(token) else {
            log::warn!("Ignoring blank credential");
            return;
        };
        match self.backend.set(CREDENTIAL_KEY, credential.expose()) {
            Ok(()) => log::info!("Credential saved"),
            Err(e) => log::error!("Could not persist credential: {}", e),
        }
    }

    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }
}

/// Configuration plus the credential a client will run with.
///
/// A context starts uninitialized (no credential), becomes set through
/// [`ClientContext::with_credential`] or [`ClientContext::from_store`], and is
/// consumed when a client is built from it.
#[derive(Debug, Clone)]
pub struct ClientContext {
    pub config: StudioConfig,
    credential: Option<Credential>,
}

impl ClientContext {
    pub fn new(config: StudioConfig) -> Self {
        Self {
            config,
            credential: None,
        }
    }

    /// Reads the stored credential, falling back to `GEMINI_API_KEY`.
    pub fn from_store(config: StudioConfig, store: &CredentialStore) -> Self {
        let credential = store.get().or_else(|| {
            std::env::var("GEMINI_API_KEY")
                .ok()
                .and_then(Credential::new)
                .map(|credential| {
                    log::debug!("Using GEMINI_API_KEY from environment");
                    credential
                })
        });
        Self { config, credential }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn is_initialized(&self) -> bool {
        self.credential.is_some()
    }

    pub(crate) fn into_parts(self) -> Result<(StudioConfig, Credential)> {
        let credential = self.credential.ok_or(StudioError::CredentialNotSet)?;
        Ok((self.config, credential))
    }
}
