//! HTTP transport implementation.
//!
//! JSON-RPC over HTTP POST using a pooled reqwest client wrapped with retry
//! middleware. Transient request failures are retried with exponential
//! backoff up to the configured retry count; JSON-RPC error objects returned
//! by the node are never retried and surface as [`TransportError::Rpc`].

use std::{
	sync::atomic::{AtomicU64, Ordering},
	time::Duration,
};

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, Jitter, RetryTransientMiddleware};
use serde_json::{json, Value};
use std::sync::Arc;
use url::Url;

use super::{
	parse_rpc_envelope, BuiltTransport, Transport, TransportConfig, TransportContext,
	TransportError, TransportFactory, TransportKind,
};

const DEFAULT_RETRY_COUNT: u32 = 3;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Factory for the HTTP transport.
///
/// Created through [`http`]; options may be adjusted with the builder-style
/// setters before the factory is handed to a client constructor.
#[derive(Debug, Clone)]
pub struct HttpTransportFactory {
	url: String,
	key: String,
	name: String,
	retry_count: u32,
	timeout: Duration,
}

/// Creates an HTTP transport factory for the given JSON-RPC endpoint URL.
pub fn http(url: impl Into<String>) -> HttpTransportFactory {
	HttpTransportFactory {
		url: url.into(),
		key: "http".to_string(),
		name: "HTTP JSON-RPC".to_string(),
		retry_count: DEFAULT_RETRY_COUNT,
		timeout: DEFAULT_TIMEOUT,
	}
}

impl HttpTransportFactory {
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

impl TransportFactory for HttpTransportFactory {
	fn build(&self, ctx: TransportContext) -> Result<BuiltTransport, TransportError> {
		let url = Url::parse(&self.url)
			.map_err(|e| TransportError::Construction(format!("invalid url `{}`: {}", self.url, e)))?;

		let retry_count = ctx.retry_count_override.unwrap_or(self.retry_count);
		let retry_policy = ExponentialBackoff::builder()
			.base(2)
			.retry_bounds(Duration::from_millis(250), Duration::from_secs(10))
			.jitter(Jitter::Full)
			.build_with_max_retries(retry_count);

		let http_client = reqwest::ClientBuilder::new()
			.pool_idle_timeout(Duration::from_secs(90))
			.pool_max_idle_per_host(32)
			.timeout(self.timeout)
			.connect_timeout(self.timeout)
			.build()
			.map_err(|e| TransportError::Construction(format!("failed to create HTTP client: {}", e)))?;

		let client = ClientBuilder::new(http_client)
			.with(RetryTransientMiddleware::new_with_policy(retry_policy))
			.build();

		let config = TransportConfig {
			key: self.key.clone(),
			name: self.name.clone(),
			kind: TransportKind::Http,
			retry_count,
			timeout: self.timeout,
		};

		Ok(BuiltTransport::new(
			config,
			Arc::new(HttpTransport {
				url,
				client,
				id_counter: AtomicU64::new(1),
			}),
		))
	}
}

/// HTTP transport value dispatching JSON-RPC 2.0 requests.
struct HttpTransport {
	url: Url,
	client: ClientWithMiddleware,
	id_counter: AtomicU64,
}

#[async_trait]
impl Transport for HttpTransport {
	async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
		let id = self.id_counter.fetch_add(1, Ordering::SeqCst);
		let payload = json!({
			"jsonrpc": "2.0",
			"id": id,
			"method": method,
			"params": params,
		});

		tracing::trace!(method, id, url = %self.url, "dispatching http json-rpc request");

		let response = self
			.client
			.post(self.url.clone())
			.json(&payload)
			.send()
			.await
			.map_err(|e| TransportError::Network(e.to_string()))?;

		let status = response.status();
		if !status.is_success() {
			tracing::warn!(method, status = status.as_u16(), "http endpoint returned error status");
			return Err(TransportError::Http {
				status: status.as_u16(),
			});
		}

		let body: Value = response
			.json()
			.await
			.map_err(|e| TransportError::Network(format!("malformed response body: {}", e)))?;

		parse_rpc_envelope(body)
	}
}
