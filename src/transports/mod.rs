//! Network transports for JSON-RPC communication with Ethereum-compatible nodes.
//!
//! Provides the uniform [`Transport`] contract consumed by clients plus the
//! concrete implementations:
//! - HTTP transport (reqwest with retry middleware)
//! - WebSocket transport (request/response and `newHeads` subscriptions)
//! - Custom transport (injected request function, e.g. in-process nodes)
//! - Fallback transport (ordered list of child transports, advancing on failure)
//!
//! A transport is obtained through a [`TransportFactory`], a pure builder
//! invoked exactly once per client construction. The factory performs no
//! network I/O; connection failures surface only once `request` is invoked.

mod custom;
mod error;
mod fallback;
mod http;
mod ws;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

pub use custom::{custom, CustomTransportFactory};
pub use error::TransportError;
pub use fallback::{fallback, FallbackTransportFactory};
pub use http::{http, HttpTransportFactory};
pub use ws::{web_socket, WebSocketTransportFactory};

/// The kind of transport behind a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
	Http,
	WebSocket,
	Custom,
	Fallback,
}

impl std::fmt::Display for TransportKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Http => "http",
			Self::WebSocket => "webSocket",
			Self::Custom => "custom",
			Self::Fallback => "fallback",
		};
		write!(f, "{}", name)
	}
}

/// Static metadata describing a built transport.
#[derive(Debug, Clone)]
pub struct TransportConfig {
	/// Short identifier for the transport (e.g. `"http"`).
	pub key: String,
	/// Human readable transport name.
	pub name: String,
	/// The transport kind tag.
	pub kind: TransportKind,
	/// Number of automatic retries applied to transient request failures.
	pub retry_count: u32,
	/// Per-request timeout.
	pub timeout: Duration,
}

/// A stream of raw `newHeads` notifications plus the server-assigned
/// subscription id needed to unsubscribe.
#[derive(Debug)]
pub struct NewHeadsSubscription {
	pub id: String,
	pub rx: mpsc::Receiver<Value>,
}

/// Uniform request contract every transport satisfies.
///
/// `request` resolves to the JSON-RPC `result` payload; a node-returned error
/// object becomes [`TransportError::Rpc`]. Push-capable transports additionally
/// implement the subscription methods.
#[async_trait]
pub trait Transport: Send + Sync {
	/// Dispatches a single JSON-RPC request and returns its `result` field.
	async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError>;

	/// Whether this transport can push `newHeads` notifications.
	fn subscription_capable(&self) -> bool {
		false
	}

	/// Opens a `newHeads` subscription on the node.
	async fn subscribe_new_heads(&self) -> Result<NewHeadsSubscription, TransportError> {
		Err(TransportError::SubscriptionsUnsupported)
	}

	/// Closes a previously opened subscription.
	async fn unsubscribe(&self, _id: &str) -> Result<(), TransportError> {
		Err(TransportError::SubscriptionsUnsupported)
	}
}

/// The merged config + callable pair owned by a client.
///
/// One `BuiltTransport` is produced per client construction; clients own it
/// exclusively unless a caller deliberately shares a factory closure.
#[derive(Clone)]
pub struct BuiltTransport {
	pub config: TransportConfig,
	inner: Arc<dyn Transport>,
}

impl BuiltTransport {
	pub fn new(config: TransportConfig, inner: Arc<dyn Transport>) -> Self {
		Self { config, inner }
	}

	pub async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
		self.inner.request(method, params).await
	}

	pub fn subscription_capable(&self) -> bool {
		self.inner.subscription_capable()
	}

	pub async fn subscribe_new_heads(&self) -> Result<NewHeadsSubscription, TransportError> {
		self.inner.subscribe_new_heads().await
	}

	pub async fn unsubscribe(&self, id: &str) -> Result<(), TransportError> {
		self.inner.unsubscribe(id).await
	}
}

impl std::fmt::Debug for BuiltTransport {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("BuiltTransport")
			.field("config", &self.config)
			.finish_non_exhaustive()
	}
}

/// Construction-time context handed to a transport factory.
///
/// Mirrors what the owning client knows at build time; factories may consult
/// it (e.g. wallet clients force `retry_count_override = Some(0)`).
#[derive(Debug, Clone, Default)]
pub struct TransportContext {
	pub chain_id: Option<u64>,
	pub polling_interval: Option<Duration>,
	pub retry_count_override: Option<u32>,
}

/// A pure transport builder, invoked exactly once per client construction.
pub trait TransportFactory: Send + Sync {
	fn build(&self, ctx: TransportContext) -> Result<BuiltTransport, TransportError>;
}

/// Parses a JSON-RPC response envelope into its `result` payload.
///
/// A present, non-null `error` member wins over `result`.
pub(crate) fn parse_rpc_envelope(body: Value) -> Result<Value, TransportError> {
	if let Some(error) = body.get("error") {
		if !error.is_null() {
			return Err(TransportError::from_rpc_object(error));
		}
	}
	match body.get("result") {
		Some(result) => Ok(result.clone()),
		None => Err(TransportError::Network(
			"response is missing the `result` field".to_string(),
		)),
	}
}
