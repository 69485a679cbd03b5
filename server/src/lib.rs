//! # Weather Server Library
//!
//! Authoritative side of the weather synchronization protocol. The server owns
//! the weather dataset and answers requests arriving over a UDP socket.
//!
//! ## Module Organization
//!
//! ### Store Module (`store`)
//! Holds the ordered collection of city records:
//! - Parsing of the line-oriented data file, four lines per city
//! - All-or-nothing reloads; a failed reload keeps the served data
//! - Lookup by exact city name and name enumeration
//!
//! ### Network Module (`network`)
//! Owns the socket and the dispatch loop:
//! - Decodes each datagram into a request
//! - Spawns an independent worker per request so no request blocks another
//! - Sends the reply back to the packet's source, or drops it silently
//!
//! ### Config Module (`config`)
//! Bind address, data file location, receive buffer size and the optional
//! worker limit.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::config::ServerConfig;
//! use server::network::Server;
//! use server::store::{DataStore, FileSource};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let source = Arc::new(FileSource::new(&config.data_file));
//!     let store = Arc::new(DataStore::new());
//!     store.reload(Arc::clone(&source)).await?;
//!
//!     let server = Server::bind(&config, store, source).await?;
//!     server.run().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod network;
pub mod store;
