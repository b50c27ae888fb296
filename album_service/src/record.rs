//! The album record stored and transmitted by the service.

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// A single album, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: String,
    pub title: String,
    pub artist: String,
    pub price: f64,
}

impl Album {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            price,
        }
    }

    /// Reject records that cannot be stored under a usable key or carry a
    /// nonsensical price.
    pub fn validate(&self) -> StoreResult<()> {
        if self.id.trim().is_empty() {
            return Err(StoreError::InvalidInput("album id must not be empty".to_string()));
        }
        if self.id.contains('/') || self.id == "." || self.id == ".." {
            return Err(StoreError::InvalidInput(format!(
                "album id must be a single path segment, got {:?}",
                self.id
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(StoreError::InvalidInput(format!(
                "album price must be a non-negative number, got {}",
                self.price
            )));
        }
        Ok(())
    }
}
