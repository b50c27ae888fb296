//! Command-line interface definitions using clap derive API.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;

use crate::settings::StorageBackend;

/// Album record service
#[derive(Parser)]
#[command(name = "album-service")]
#[command(about = "Album record store with a chat-completion proxy")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to, overriding server.host/server.port
        #[arg(long)]
        addr: Option<SocketAddr>,
        /// Storage backend, overriding storage.backend
        #[arg(long, value_enum)]
        backend: Option<StorageBackend>,
    },
    /// Print the effective configuration with secrets masked
    Config,
}
