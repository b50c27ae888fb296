/*!
Blob-store backend: one JSON object per album at `albums/<id>.json`.

Works against any [`ObjectStore`]: S3 in production, the in-memory and
local-filesystem stores in tests. No process-local lock is taken and writes
carry no precondition, so concurrent writers to one id race at the store.
*/
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use object_store::{
    aws::AmazonS3Builder,
    path::{Path, DELIMITER},
    ObjectStore, PutPayload,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use super::{not_found, Backend, Consistency};
use crate::error::{StoreError, StoreResult};
use crate::record::Album;
use crate::settings::StorageConfig;

/// Namespace all album objects live under.
pub const ALBUM_PREFIX: &str = "albums";

#[derive(Debug)]
pub struct BlobBackend {
    store: Arc<dyn ObjectStore>,
}

impl BlobBackend {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    /// Connect to the S3 bucket named in configuration.
    ///
    /// Credentials come from the standard AWS environment variables.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let bucket = config
            .bucket
            .as_deref()
            .ok_or_else(|| anyhow!("Blob storage requires a bucket name"))?;

        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_allow_http(config.allow_http);
        if let Some(region) = &config.region {
            builder = builder.with_region(region);
        }
        if let Some(endpoint) = &config.endpoint {
            builder = builder.with_endpoint(endpoint);
        }

        let s3 = builder
            .build()
            .with_context(|| format!("Failed to configure S3 client for bucket {}", bucket))?;

        info!("Using blob storage bucket {}", bucket);
        Ok(Self::new(Arc::new(s3)))
    }
}

/// Object path for an album id: `albums/<id>.json`, with the id verbatim.
///
/// Ids that would add or climb path segments, or that the object store
/// cannot name, are rejected as invalid input.
pub fn album_path(id: &str) -> StoreResult<Path> {
    if id.contains(DELIMITER) {
        return Err(StoreError::InvalidInput(format!(
            "album id {:?} must not contain {:?}",
            id, DELIMITER
        )));
    }
    Path::parse(format!("{}/{}.json", ALBUM_PREFIX, id))
        .map_err(|e| StoreError::InvalidInput(format!("album id {:?} is not storable: {}", id, e)))
}

#[async_trait]
impl Backend for BlobBackend {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn consistency(&self) -> Consistency {
        Consistency::LastWriterWinsRemote
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> StoreResult<Album> {
        // No put can store under an unnameable id
        let Ok(path) = album_path(id) else {
            debug!("Id {:?} has no object path", id);
            return Err(not_found(id));
        };

        let object = match self.store.get(&path).await {
            Ok(object) => object,
            Err(object_store::Error::NotFound { .. }) => {
                debug!("No object at {}", path);
                return Err(not_found(id));
            }
            Err(e) => {
                error!("Blob read failed for {}: {}", path, e);
                return Err(StoreError::Backend(e.to_string()));
            }
        };

        let bytes = object.bytes().await.map_err(|e| {
            error!("Blob body read failed for {}: {}", path, e);
            StoreError::Backend(e.to_string())
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            error!("Stored object {} is not a valid album: {}", path, e);
            StoreError::Backend(format!("corrupt album object {}: {}", path, e))
        })
    }

    #[instrument(skip(self, album), fields(id = %album.id))]
    async fn put(&self, album: &Album) -> StoreResult<()> {
        let path = album_path(&album.id)?;
        let body = serde_json::to_vec(album).map_err(|e| {
            error!("Failed to encode album for {}: {}", path, e);
            StoreError::Backend(e.to_string())
        })?;

        self.store
            .put(&path, PutPayload::from(body))
            .await
            .map_err(|e| {
                error!("Blob write failed for {}: {}", path, e);
                StoreError::Backend(e.to_string())
            })?;

        debug!("Wrote {}", path);
        Ok(())
    }
}
