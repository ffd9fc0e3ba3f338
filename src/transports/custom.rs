//! Custom (injected) transport implementation.
//!
//! Wraps a caller-supplied async request function, letting in-process nodes,
//! browser-style providers and test stubs stand in for a network transport.
//! An optional subscribe function makes the transport subscription-capable.

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde_json::Value;

use super::{
	BuiltTransport, NewHeadsSubscription, Transport, TransportConfig, TransportContext,
	TransportError, TransportFactory, TransportKind,
};

type RequestFn =
	Arc<dyn Fn(String, Value) -> BoxFuture<'static, Result<Value, TransportError>> + Send + Sync>;
type SubscribeFn =
	Arc<dyn Fn() -> BoxFuture<'static, Result<NewHeadsSubscription, TransportError>> + Send + Sync>;

/// Factory for a transport backed by an injected request function.
#[derive(Clone)]
pub struct CustomTransportFactory {
	request: RequestFn,
	subscribe: Option<SubscribeFn>,
	key: String,
	name: String,
	timeout: Duration,
}

/// Creates a transport factory around the given async request function.
///
/// The function receives the JSON-RPC method name and positional params and
/// must resolve to the `result` payload or a [`TransportError`].
pub fn custom<F, Fut>(request: F) -> CustomTransportFactory
where
	F: Fn(String, Value) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Value, TransportError>> + Send + 'static,
{
	CustomTransportFactory {
		request: Arc::new(move |method, params| Box::pin(request(method, params))),
		subscribe: None,
		key: "custom".to_string(),
		name: "Custom Provider".to_string(),
		timeout: Duration::from_secs(10),
	}
}

impl CustomTransportFactory {
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = key.into();
		self
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}

	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	/// Attaches a subscribe function, marking the transport as
	/// subscription-capable.
	pub fn with_subscribe<F, Fut>(mut self, subscribe: F) -> Self
	where
		F: Fn() -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<NewHeadsSubscription, TransportError>> + Send + 'static,
	{
		self.subscribe = Some(Arc::new(move || Box::pin(subscribe())));
		self
	}
}

impl TransportFactory for CustomTransportFactory {
	fn build(&self, _ctx: TransportContext) -> Result<BuiltTransport, TransportError> {
		let config = TransportConfig {
			key: self.key.clone(),
			name: self.name.clone(),
			kind: TransportKind::Custom,
			retry_count: 0,
			timeout: self.timeout,
		};

		Ok(BuiltTransport::new(
			config,
			Arc::new(CustomTransport {
				request: self.request.clone(),
				subscribe: self.subscribe.clone(),
			}),
		))
	}
}

struct CustomTransport {
	request: RequestFn,
	subscribe: Option<SubscribeFn>,
}

#[async_trait]
impl Transport for CustomTransport {
	async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
		(self.request)(method.to_string(), params).await
	}

	fn subscription_capable(&self) -> bool {
		self.subscribe.is_some()
	}

	async fn subscribe_new_heads(&self) -> Result<NewHeadsSubscription, TransportError> {
		match &self.subscribe {
			Some(subscribe) => subscribe().await,
			None => Err(TransportError::SubscriptionsUnsupported),
		}
	}

	async fn unsubscribe(&self, _id: &str) -> Result<(), TransportError> {
		// Injected subscriptions end when their channel is dropped.
		Ok(())
	}
}
