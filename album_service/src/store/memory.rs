use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, instrument};

use super::{not_found, Backend, Consistency};
use crate::error::StoreResult;
use crate::record::Album;

/// In-process album map guarded by a single reader/writer lock.
///
/// Reads share the lock, writes take it exclusively. The guard never lives
/// across an `.await`, so the critical section is exactly the map access.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    albums: RwLock<HashMap<String, Album>>,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Backend for InMemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn consistency(&self) -> Consistency {
        Consistency::Serialized
    }

    fn len_hint(&self) -> Option<usize> {
        Some(self.albums.read().len())
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> StoreResult<Album> {
        let albums = self.albums.read();
        albums.get(id).cloned().ok_or_else(|| not_found(id))
    }

    #[instrument(skip(self, album), fields(id = %album.id))]
    async fn put(&self, album: &Album) -> StoreResult<()> {
        let mut albums = self.albums.write();
        let replaced = albums.insert(album.id.clone(), album.clone()).is_some();
        debug!("Wrote album (replaced: {}), total albums: {}", replaced, albums.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_replace_in_place() {
        let backend = InMemoryBackend::new();
        assert_eq!(backend.len_hint(), Some(0));

        backend.put(&Album::new("1", "Blue Train", "John Coltrane", 56.99)).await.unwrap();
        backend.put(&Album::new("2", "Jeru", "Gerry Mulligan", 17.99)).await.unwrap();
        backend.put(&Album::new("1", "Blue Train", "John Coltrane", 39.99)).await.unwrap();

        assert_eq!(backend.len_hint(), Some(2));
        assert_eq!(backend.get("1").await.unwrap().price, 39.99);
    }

    #[tokio::test]
    async fn test_missing_key() {
        let backend = InMemoryBackend::new();
        let result = backend.get("nope").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_and_writers() {
        let backend = Arc::new(InMemoryBackend::new());
        backend.put(&Album::new("shared", "v0", "a", 1.0)).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..50 {
            let backend = backend.clone();
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    let album = Album::new("shared", format!("v{i}"), "a", 1.0);
                    backend.put(&album).await.unwrap();
                } else {
                    let album = backend.get("shared").await.unwrap();
                    assert!(album.title.starts_with('v'));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(backend.len_hint(), Some(1));
    }
}
