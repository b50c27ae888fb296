//! Keyed album store with pluggable persistence backends.
//!
//! The [`RecordStore`] is the only way handlers touch persisted albums. It
//! validates writes and delegates to a [`Backend`]:
//!
//! - [`InMemoryBackend`] serializes access through a reader/writer lock, so a
//!   completed `put` is visible to every later `get` and concurrent writers
//!   to one id are ordered by lock acquisition.
//! - [`BlobBackend`] takes no process-local lock. Each id maps to one object
//!   and concurrent writers to the same id race at the object store, where
//!   the last writer wins. This is a weaker guarantee than the in-memory
//!   backend and is reported as such through [`Backend::consistency`].

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{StoreError, StoreResult};
use crate::record::Album;
use crate::settings::{StorageBackend, StorageConfig};

pub mod blob;
pub mod memory;

pub use blob::BlobBackend;
pub use memory::InMemoryBackend;

/// Ordering guarantee a backend gives for writes to the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// Writes are serialized in-process; reads observe every completed write.
    Serialized,
    /// Writes race at a remote store; visibility order is store-defined.
    LastWriterWinsRemote,
}

/// Persistence capability behind the record store.
#[async_trait]
pub trait Backend: Send + Sync + std::fmt::Debug {
    /// Short name used in logs and health output.
    fn name(&self) -> &'static str;

    fn consistency(&self) -> Consistency;

    /// Fetch the album stored under `id`.
    ///
    /// Returns `NotFound` when nothing is stored there and `Backend` when the
    /// storage call or the decode of a stored value fails.
    async fn get(&self, id: &str) -> StoreResult<Album>;

    /// Store `album` under its id, replacing any previous value.
    async fn put(&self, album: &Album) -> StoreResult<()>;

    /// Number of stored albums, when the backend can count them cheaply.
    fn len_hint(&self) -> Option<usize> {
        None
    }
}

/// Cloneable handle over a backend, shared by all request handlers.
#[derive(Debug, Clone)]
pub struct RecordStore {
    backend: Arc<dyn Backend>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBackend::new()))
    }

    /// Build the backend selected in configuration.
    pub fn from_settings(config: &StorageConfig) -> anyhow::Result<Self> {
        let store = match config.backend {
            StorageBackend::Memory => Self::in_memory(),
            StorageBackend::Blob => Self::new(Arc::new(BlobBackend::from_config(config)?)),
        };
        info!(
            "Record store ready: backend={}, consistency={:?}",
            store.backend_name(),
            store.consistency()
        );
        Ok(store)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn consistency(&self) -> Consistency {
        self.backend.consistency()
    }

    pub fn len_hint(&self) -> Option<usize> {
        self.backend.len_hint()
    }

    #[instrument(skip(self), fields(backend = self.backend.name()))]
    pub async fn get(&self, id: &str) -> StoreResult<Album> {
        let album = self.backend.get(id).await?;
        debug!("Fetched album {}", id);
        Ok(album)
    }

    /// Validate and store `album`, returning it unchanged on success.
    #[instrument(skip(self, album), fields(backend = self.backend.name(), id = %album.id))]
    pub async fn put(&self, album: Album) -> StoreResult<Album> {
        album.validate()?;
        self.backend.put(&album).await?;
        debug!("Stored album {}", album.id);
        Ok(album)
    }
}

impl From<InMemoryBackend> for RecordStore {
    fn from(backend: InMemoryBackend) -> Self {
        Self::new(Arc::new(backend))
    }
}

impl From<BlobBackend> for RecordStore {
    fn from(backend: BlobBackend) -> Self {
        Self::new(Arc::new(backend))
    }
}

/// Map a missing id to the store's not-found error.
pub(crate) fn not_found(id: &str) -> StoreError {
    StoreError::NotFound(id.to_string())
}
