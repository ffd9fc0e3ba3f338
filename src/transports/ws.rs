//! WebSocket transport implementation.
//!
//! JSON-RPC over a single multiplexed WebSocket connection. A background read
//! task demultiplexes incoming frames: responses are routed to their pending
//! request by id, `eth_subscription` notifications are routed to the matching
//! subscription channel. The connection is established lazily on first use so
//! factory construction stays pure.

use std::{
	collections::HashMap,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc, Mutex as StdMutex,
	},
	time::Duration,
};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{
	parse_rpc_envelope, BuiltTransport, NewHeadsSubscription, Transport, TransportConfig,
	TransportContext, TransportError, TransportFactory, TransportKind,
};

const DEFAULT_RETRY_COUNT: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Capacity of the per-subscription notification buffer. A subscriber that
/// falls further behind than this loses notifications.
const SUBSCRIPTION_BUFFER: usize = 64;

type PendingMap = Arc<StdMutex<HashMap<u64, oneshot::Sender<Result<Value, TransportError>>>>>;
type SubscriptionMap = Arc<StdMutex<HashMap<String, mpsc::Sender<Value>>>>;

/// Factory for the WebSocket transport.
#[derive(Debug, Clone)]
pub struct WebSocketTransportFactory {
	url: String,
	key: String,
	name: String,
	retry_count: u32,
	timeout: Duration,
}

/// Creates a WebSocket transport factory for the given `ws://`/`wss://` URL.
pub fn web_socket(url: impl Into<String>) -> WebSocketTransportFactory {
	WebSocketTransportFactory {
		url: url.into(),
		key: "webSocket".to_string(),
		name: "WebSocket JSON-RPC".to_string(),
		retry_count: DEFAULT_RETRY_COUNT,
		timeout: DEFAULT_TIMEOUT,
	}
}

impl WebSocketTransportFactory {
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = key.into();
		self
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn retry_count(mut self, retry_count: u32) -> Self {
		self.retry_count = retry_count;
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}
}

impl TransportFactory for WebSocketTransportFactory {
	fn build(&self, ctx: TransportContext) -> Result<BuiltTransport, TransportError> {
		url::Url::parse(&self.url)
			.map_err(|e| TransportError::Construction(format!("invalid url `{}`: {}", self.url, e)))?;

		let config = TransportConfig {
			key: self.key.clone(),
			name: self.name.clone(),
			kind: TransportKind::WebSocket,
			retry_count: ctx.retry_count_override.unwrap_or(self.retry_count),
			timeout: self.timeout,
		};

		Ok(BuiltTransport::new(
			config,
			Arc::new(WsTransport {
				url: self.url.clone(),
				timeout: self.timeout,
				connection: Mutex::new(None),
				pending: Arc::new(StdMutex::new(HashMap::new())),
				subscriptions: Arc::new(StdMutex::new(HashMap::new())),
				id_counter: AtomicU64::new(1),
			}),
		))
	}
}

/// Live connection state: the outbound frame channel consumed by the writer
/// task. The connection is considered dead once this channel closes.
struct WsConnection {
	outbound: mpsc::Sender<Message>,
}

struct WsTransport {
	url: String,
	timeout: Duration,
	connection: Mutex<Option<WsConnection>>,
	pending: PendingMap,
	subscriptions: SubscriptionMap,
	id_counter: AtomicU64,
}

impl WsTransport {
	/// Returns the outbound channel of the live connection, dialing the
	/// endpoint and spawning the reader/writer tasks if necessary.
	async fn ensure_connected(&self) -> Result<mpsc::Sender<Message>, TransportError> {
		let mut guard = self.connection.lock().await;
		if let Some(conn) = guard.as_ref() {
			if !conn.outbound.is_closed() {
				return Ok(conn.outbound.clone());
			}
		}

		let connect = connect_async(self.url.as_str());
		let (stream, _) = tokio::time::timeout(self.timeout, connect)
			.await
			.map_err(|_| TransportError::Timeout(self.timeout))?
			.map_err(|e| TransportError::Network(format!("websocket connect failed: {}", e)))?;

		tracing::debug!(url = %self.url, "websocket connection established");

		let (mut sink, mut source) = stream.split();
		let (outbound_tx, mut outbound_rx) = mpsc::channel::<Message>(64);

		tokio::spawn(async move {
			while let Some(message) = outbound_rx.recv().await {
				if sink.send(message).await.is_err() {
					break;
				}
			}
		});

		let pending = self.pending.clone();
		let subscriptions = self.subscriptions.clone();
		let url = self.url.clone();
		tokio::spawn(async move {
			while let Some(frame) = source.next().await {
				let text = match frame {
					Ok(Message::Text(text)) => text,
					Ok(Message::Close(_)) => break,
					Ok(_) => continue,
					Err(e) => {
						tracing::warn!(url = %url, error = %e, "websocket read failed");
						break;
					}
				};
				match serde_json::from_str::<Value>(text.as_str()) {
					Ok(value) => route_incoming(value, &pending, &subscriptions),
					Err(e) => {
						tracing::warn!(url = %url, error = %e, "discarding malformed websocket frame")
					}
				}
			}
			// Connection is gone: fail every outstanding request so callers
			// do not wait out their full timeout.
			if let Ok(mut map) = pending.lock() {
				for (_, tx) in map.drain() {
					let _ = tx.send(Err(TransportError::Network(
						"websocket connection closed".to_string(),
					)));
				}
			}
			if let Ok(mut subs) = subscriptions.lock() {
				subs.clear();
			}
		});

		*guard = Some(WsConnection {
			outbound: outbound_tx.clone(),
		});
		Ok(outbound_tx)
	}

	fn remove_pending(&self, id: u64) {
		if let Ok(mut map) = self.pending.lock() {
			map.remove(&id);
		}
	}
}

/// Routes one incoming JSON value to a pending request or a subscription.
fn route_incoming(value: Value, pending: &PendingMap, subscriptions: &SubscriptionMap) {
	if let Some(id) = value.get("id").and_then(Value::as_u64) {
		let sender = pending.lock().ok().and_then(|mut map| map.remove(&id));
		if let Some(tx) = sender {
			let _ = tx.send(parse_rpc_envelope(value));
		}
		return;
	}

	if value.get("method").and_then(Value::as_str) == Some("eth_subscription") {
		let params = value.get("params");
		let subscription = params
			.and_then(|p| p.get("subscription"))
			.and_then(Value::as_str);
		let result = params.and_then(|p| p.get("result"));
		if let (Some(subscription), Some(result)) = (subscription, result) {
			let tx = subscriptions
				.lock()
				.ok()
				.and_then(|subs| subs.get(subscription).cloned());
			if let Some(tx) = tx {
				if tx.try_send(result.clone()).is_err() {
					tracing::warn!(subscription, "subscription buffer full, dropping notification");
				}
			}
		}
	}
}

#[async_trait]
impl Transport for WsTransport {
	async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
		let outbound = self.ensure_connected().await?;

		let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
		let (tx, rx) = oneshot::channel();
		match self.pending.lock() {
			Ok(mut map) => {
				map.insert(id, tx);
			}
			Err(_) => {
				return Err(TransportError::Network(
					"websocket state is unavailable".to_string(),
				))
			}
		}

		let payload = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params,
		})
		.to_string();

		tracing::trace!(method, id, "dispatching websocket json-rpc request");

		if outbound.send(Message::Text(payload.into())).await.is_err() {
			self.remove_pending(id);
			return Err(TransportError::Network(
				"websocket connection closed".to_string(),
			));
		}

		match tokio::time::timeout(self.timeout, rx).await {
			Ok(Ok(result)) => result,
			Ok(Err(_)) => Err(TransportError::Network(
				"connection closed before the response arrived".to_string(),
			)),
			Err(_) => {
				self.remove_pending(id);
				Err(TransportError::Timeout(self.timeout))
			}
		}
	}

	fn subscription_capable(&self) -> bool {
		true
	}

	async fn subscribe_new_heads(&self) -> Result<NewHeadsSubscription, TransportError> {
		let result = self.request("eth_subscribe", json!(["newHeads"])).await?;
		let id = result
			.as_str()
			.ok_or_else(|| {
				TransportError::Network("subscription id is not a string".to_string())
			})?
			.to_string();

		let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
		if let Ok(mut subs) = self.subscriptions.lock() {
			subs.insert(id.clone(), tx);
		}
		tracing::debug!(subscription = %id, "newHeads subscription opened");
		Ok(NewHeadsSubscription { id, rx })
	}

	async fn unsubscribe(&self, id: &str) -> Result<(), TransportError> {
		if let Ok(mut subs) = self.subscriptions.lock() {
			subs.remove(id);
		}
		self.request("eth_unsubscribe", json!([id])).await?;
		Ok(())
	}
}
