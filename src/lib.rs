//! EVM JSON-RPC client library.
//!
//! Provides composable clients over pluggable JSON-RPC transports. A base
//! [`Client`](clients::Client) carries identity, chain metadata and a built
//! transport; action sets layer chain-read, wallet and node-control
//! capabilities on top of it without the base client knowing about any of
//! them.
//!
//! # Architecture
//! The library is built around several key components:
//! - Transports: HTTP, WebSocket, custom and fallback request channels,
//!   constructed lazily from factories so client creation never touches the
//!   network
//! - Clients: the base client plus public, wallet and test specializations
//! - Watcher: polling and push-based block observation with missed-range
//!   backfill and race-free cancellation
//! - Formatter: RPC-shape to typed-model decoding with field-level errors
//!
//! # Example
//! ```no_run
//! use evm_client::{
//!     clients::{create_public_client, PublicClientConfig},
//!     transports::http,
//! };
//!
//! # async fn example() -> Result<(), evm_client::clients::ClientError> {
//! let client = create_public_client(
//!     &http("https://eth.example.com"),
//!     PublicClientConfig::default(),
//! )?;
//! let head = client.get_block_number().await?;
//! # Ok(())
//! # }
//! ```

pub mod clients;
pub mod formatter;
pub mod models;
pub mod transports;
pub mod utils;
pub mod watcher;
