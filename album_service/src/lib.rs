//! Album Service - Core Library
//!
//! A keyed album store with in-memory and blob-storage backends, plus a
//! proxy to an external chat-completion API, served over HTTP.

pub mod chat;
pub mod cli;
pub mod error;
pub mod middleware;
pub mod record;
pub mod server;
pub mod settings;
pub mod store;
pub mod telemetry;

pub use chat::ChatProxy;
pub use error::{ApiError, ChatError, StoreError};
pub use record::Album;
pub use store::{Backend, BlobBackend, Consistency, InMemoryBackend, RecordStore};
