use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::error::{Result, StudioError};

struct LocalResource {
    content_type: String,
    bytes: Arc<Vec<u8>>,
}

/// In-process table of downloaded artifacts addressed by `blob:` URLs.
#[derive(Clone, Default)]
pub struct ResourceRegistry {
    entries: Arc<Mutex<HashMap<Uuid, LocalResource>>>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `bytes` and returns the guard that owns the entry.
    pub fn acquire(&self, bytes: Vec<u8>, content_type: impl Into<String>) -> ResourceGuard {
        let id = Uuid::new_v4();
        let content_type = content_type.into();
        let len = bytes.len();
        let bytes = Arc::new(bytes);
        self.entries().insert(
            id,
            LocalResource {
                content_type: content_type.clone(),
                bytes: bytes.clone(),
            },
        );
        log::debug!("Acquired local resource {} ({} bytes, {})", id, len, content_type);

        ResourceGuard {
            id,
            content_type,
            bytes,
            registry: self.clone(),
            released: false,
        }
    }

    /// Looks up the bytes behind a `blob:` URL handed out by this registry.
    pub fn resolve(&self, url: &str) -> Option<Arc<Vec<u8>>> {
        let id = parse_blob_url(url)?;
        self.entries().get(&id).map(|entry| entry.bytes.clone())
    }

    pub fn content_type_of(&self, url: &str) -> Option<String> {
        let id = parse_blob_url(url)?;
        self.entries().get(&id).map(|entry| entry.content_type.clone())
    }

    pub fn live_count(&self) -> usize {
        self.entries().len()
    }

    /// Recovers from poisoning; no write leaves the map half-updated.
    fn entries(&self) -> MutexGuard<'_, HashMap<Uuid, LocalResource>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn revoke(&self, id: &Uuid) -> bool {
        let removed = self.entries().remove(id).is_some();
        if removed {
            log::debug!("Released local resource {}", id);
        } else {
            log::warn!("Local resource {} was already gone", id);
        }
        removed
    }
}

fn parse_blob_url(url: &str) -> Option<Uuid> {
    url.strip_prefix("blob:genstudio/")
        .and_then(|id| Uuid::parse_str(id).ok())
}

/// Owner of one registry entry. The entry is released exactly once: by
/// [`ResourceGuard::release`] or, failing that, when the guard drops.
pub struct ResourceGuard {
    id: Uuid,
    content_type: String,
    bytes: Arc<Vec<u8>>,
    registry: ResourceRegistry,
    released: bool,
}

impl ResourceGuard {
    pub fn url(&self) -> String {
        format!("blob:genstudio/{}", self.id)
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub async fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        tokio::fs::write(path, self.bytes.as_slice())
            .await
            .map_err(|e| StudioError::Storage(format!("failed to write {}: {}", path.display(), e)))?;
        log::info!("Saved {} bytes to {}", self.bytes.len(), path.display());
        Ok(())
    }

    pub fn release(mut self) {
        self.release_once();
    }

    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.registry.revoke(&self.id);
        }
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        self.release_once();
    }
}

impl std::fmt::Debug for ResourceGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceGuard")
            .field("url", &self.url())
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
