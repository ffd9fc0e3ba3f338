//! Shared mock transports for the integration suite.
//!
//! `ScriptedChain` drives the polling watcher through a pre-scripted head
//! sequence, `push_transport` feeds raw headers into a subscription-capable
//! transport, and `MockRpcTransport` is a mockall mock of the transport
//! contract for expectation-style tests.

use std::{
	collections::{HashMap, VecDeque},
	sync::{Arc, Mutex},
	time::Duration,
};

use evm_client::transports::{
	custom, BuiltTransport, CustomTransportFactory, NewHeadsSubscription, Transport,
	TransportConfig, TransportContext, TransportError, TransportFactory, TransportKind,
};
use mockall::mock;
use serde_json::{json, Value};
use tokio::sync::mpsc;

mock! {
	pub RpcTransport {}

	#[async_trait::async_trait]
	impl Transport for RpcTransport {
		async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError>;
		fn subscription_capable(&self) -> bool;
		async fn subscribe_new_heads(&self) -> Result<NewHeadsSubscription, TransportError>;
		async fn unsubscribe(&self, id: &str) -> Result<(), TransportError>;
	}
}

/// Transport factory handing out a pre-built mock transport.
///
/// The mock is consumed on first build, so a second build panics; client
/// construction invokes the factory exactly once.
pub struct MockTransportFactory {
	inner: Mutex<Option<Arc<MockRpcTransport>>>,
}

impl MockTransportFactory {
	pub fn new(mock: MockRpcTransport) -> Self {
		Self {
			inner: Mutex::new(Some(Arc::new(mock))),
		}
	}
}

impl TransportFactory for MockTransportFactory {
	fn build(&self, _ctx: TransportContext) -> Result<BuiltTransport, TransportError> {
		let inner = self
			.inner
			.lock()
			.unwrap()
			.take()
			.expect("mock transport built more than once");
		Ok(BuiltTransport::new(
			TransportConfig {
				key: "mock".to_string(),
				name: "Mock Transport".to_string(),
				kind: TransportKind::Custom,
				retry_count: 0,
				timeout: Duration::from_secs(5),
			},
			inner,
		))
	}
}

/// Synthesizes an RPC-shaped block object for the given number.
pub fn block_json(number: u64) -> Value {
	json!({
		"number": format!("{:#x}", number),
		"hash": format!("0x{:064x}", number + 0xb10c),
		"parentHash": format!("0x{:064x}", number + 0xb10c - 1),
		"timestamp": format!("{:#x}", 1_700_000_000u64 + number * 12),
		"gasLimit": "0x1c9c380",
		"gasUsed": "0x5208",
		"transactions": [],
	})
}

/// An in-process node serving a scripted sequence of chain heads.
///
/// Each head read (`eth_blockNumber`, or `eth_getBlockByNumber` with a tag)
/// consumes the next entry of the script; once exhausted the head stays at
/// its final value. Blocks for explicit numbers are synthesized on demand.
/// Every request is recorded, and an optional artificial latency can be set
/// to hold requests in flight.
pub struct ScriptedChain {
	heads: Mutex<VecDeque<u64>>,
	last_head: Mutex<u64>,
	stubs: Mutex<HashMap<String, Value>>,
	calls: Mutex<Vec<(String, Value)>>,
	delay: Mutex<Option<Duration>>,
}

impl ScriptedChain {
	pub fn new(heads: Vec<u64>) -> Arc<Self> {
		Arc::new(Self {
			heads: Mutex::new(heads.into()),
			last_head: Mutex::new(0),
			stubs: Mutex::new(HashMap::new()),
			calls: Mutex::new(Vec::new()),
			delay: Mutex::new(None),
		})
	}

	/// Registers a canned `result` payload for a method, checked before the
	/// built-in handlers.
	pub fn stub(&self, method: &str, result: Value) {
		self.stubs.lock().unwrap().insert(method.to_string(), result);
	}

	/// Holds every subsequent request in flight for the given duration.
	pub fn set_delay(&self, delay: Duration) {
		*self.delay.lock().unwrap() = Some(delay);
	}

	pub fn calls(&self) -> Vec<(String, Value)> {
		self.calls.lock().unwrap().clone()
	}

	pub fn call_count(&self, method: &str) -> usize {
		self.calls
			.lock()
			.unwrap()
			.iter()
			.filter(|(name, _)| name == method)
			.count()
	}

	fn next_head(&self) -> u64 {
		let mut heads = self.heads.lock().unwrap();
		let mut last = self.last_head.lock().unwrap();
		if let Some(next) = heads.pop_front() {
			*last = next;
		}
		*last
	}

	async fn handle(&self, method: String, params: Value) -> Result<Value, TransportError> {
		self.calls.lock().unwrap().push((method.clone(), params.clone()));
		let stub = self.stubs.lock().unwrap().get(&method).cloned();
		let delay = *self.delay.lock().unwrap();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if let Some(result) = stub {
			return Ok(result);
		}
		match method.as_str() {
			"eth_blockNumber" => Ok(json!(format!("{:#x}", self.next_head()))),
			"eth_getBlockByNumber" => {
				let param = params.get(0).and_then(Value::as_str).unwrap_or("latest");
				let number = match param.strip_prefix("0x") {
					Some(digits) => u64::from_str_radix(digits, 16).map_err(|_| {
						TransportError::Rpc {
							code: -32602,
							message: format!("invalid block number: {}", param),
							data: None,
						}
					})?,
					None => self.next_head(),
				};
				Ok(block_json(number))
			}
			other => Err(TransportError::Rpc {
				code: -32601,
				message: format!("the method {} does not exist", other),
				data: None,
			}),
		}
	}

	/// A transport factory routing requests into this scripted chain.
	pub fn transport(self: &Arc<Self>) -> CustomTransportFactory {
		let chain = self.clone();
		custom(move |method, params| {
			let chain = chain.clone();
			async move { chain.handle(method, params).await }
		})
	}
}

/// A subscription-capable transport whose `newHeads` stream is fed by the
/// returned sender. Plain requests are rejected so push-mode tests notice
/// accidental polling.
pub fn push_transport() -> (CustomTransportFactory, mpsc::Sender<Value>) {
	let (tx, rx) = mpsc::channel(16);
	let rx = Arc::new(Mutex::new(Some(rx)));
	let factory = custom(|method, _params| async move {
		Err(TransportError::Rpc {
			code: -32601,
			message: format!("unexpected request over push transport: {}", method),
			data: None,
		})
	})
	.with_subscribe(move || {
		let rx = rx.clone();
		async move {
			let rx = rx
				.lock()
				.unwrap()
				.take()
				.ok_or_else(|| TransportError::Network("subscription already taken".to_string()))?;
			Ok(NewHeadsSubscription {
				id: "0x1a2b".to_string(),
				rx,
			})
		}
	});
	(factory, tx)
}
