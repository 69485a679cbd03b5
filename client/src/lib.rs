//! # Weather Client Library
//!
//! Client side of the weather synchronization protocol. A [`ClientSession`]
//! keeps a local view of the server's city list and of the currently selected
//! city and day, and keeps it consistent while replies arrive asynchronously
//! over an unreliable datagram socket.
//!
//! ## Architecture Overview
//!
//! ### One Listener, Many Callers
//! A single background task reads every datagram from the socket and applies
//! it to session state. Request operations never read the socket: they arm a
//! completion signal, send, and wait for the listener to fire the signal.
//!
//! ### Client-Driven Retransmission
//! The protocol has no delivery guarantee. A request that meets silence is
//! resent identically after each timeout until its retry budget is spent,
//! then reported as [`ClientError::Timeout`]. Replies are complete snapshots,
//! so duplicates and late arrivals are harmless.
//!
//! ### Wholesale Replacement
//! The city list and the selected city are only ever replaced as whole
//! values, under the same lock that guards the pending signals.
//!
//! ## Module Organization
//!
//! ### Session Module (`session`)
//! Socket ownership, request operations, retry loop and state accessors.
//!
//! ### Listener Module (`listener`)
//! The background reader and the reply-application logic.
//!
//! ### Pending Module (`pending`)
//! Single-shot completion signals, one per request kind.
//!
//! ### Observer Module (`observer`)
//! Hooks a front-end implements to hear about list, selection, status and
//! connectivity changes.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::{ClientConfig, ClientSession, LogObserver};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = ClientSession::connect(&ClientConfig::default(), Arc::new(LogObserver)).await?;
//!
//!     session.request_city_list(Duration::from_secs(5), 5).await?;
//!     if let Some(city) = session.known_cities().await.first() {
//!         session.fetch_city(city, Duration::from_secs(5), 5).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
mod listener;
pub mod observer;
pub mod pending;
pub mod session;

pub use config::{resolve_server, ClientConfig, RetryPolicy};
pub use error::ClientError;
pub use observer::{LogObserver, NoopObserver, SessionObserver};
pub use pending::RequestKind;
pub use session::ClientSession;
