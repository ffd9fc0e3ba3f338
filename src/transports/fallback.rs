//! Fallback transport implementation.
//!
//! Fans a request out over an ordered list of child transports: the current
//! child is tried first and the list is advanced on transport-level failure,
//! wrapping around once. A child that answers becomes the new current child,
//! so a healthy endpoint stays sticky. JSON-RPC errors returned by the node
//! are protocol answers, not transport failures, and are surfaced without
//! advancing.

use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc,
};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::{
	BuiltTransport, Transport, TransportConfig, TransportContext, TransportError,
	TransportFactory, TransportKind,
};

/// Factory for the fallback transport.
pub struct FallbackTransportFactory {
	children: Vec<Box<dyn TransportFactory>>,
	key: String,
	name: String,
}

/// Creates a fallback transport factory over an ordered list of child
/// factories. The order expresses preference: earlier children are tried
/// first.
pub fn fallback(children: Vec<Box<dyn TransportFactory>>) -> FallbackTransportFactory {
	FallbackTransportFactory {
		children,
		key: "fallback".to_string(),
		name: "Fallback".to_string(),
	}
}

impl FallbackTransportFactory {
	pub fn key(mut self, key: impl Into<String>) -> Self {
		self.key = key.into();
		self
	}

	pub fn name(mut self, name: impl Into<String>) -> Self {
		self.name = name.into();
		self
	}
}

impl TransportFactory for FallbackTransportFactory {
	fn build(&self, ctx: TransportContext) -> Result<BuiltTransport, TransportError> {
		if self.children.is_empty() {
			return Err(TransportError::Construction(
				"fallback transport requires at least one child transport".to_string(),
			));
		}

		let children = self
			.children
			.iter()
			.map(|child| child.build(ctx.clone()))
			.collect::<Result<Vec<_>, _>>()?;

		// The aggregate advertises the strongest retry/timeout among its
		// children; each child still applies its own policy.
		let retry_count = children
			.iter()
			.map(|c| c.config.retry_count)
			.max()
			.unwrap_or(0);
		let timeout = children
			.iter()
			.map(|c| c.config.timeout)
			.max()
			.unwrap_or(Duration::from_secs(10));

		let config = TransportConfig {
			key: self.key.clone(),
			name: self.name.clone(),
			kind: TransportKind::Fallback,
			retry_count,
			timeout,
		};

		Ok(BuiltTransport::new(
			config,
			Arc::new(FallbackTransport {
				children,
				current: AtomicUsize::new(0),
			}),
		))
	}
}

struct FallbackTransport {
	children: Vec<BuiltTransport>,
	current: AtomicUsize,
}

#[async_trait]
impl Transport for FallbackTransport {
	async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
		let count = self.children.len();
		let start = self.current.load(Ordering::Acquire) % count;
		let mut last_error = None;

		for attempt in 0..count {
			let index = (start + attempt) % count;
			let child = &self.children[index];
			match child.request(method, params.clone()).await {
				Ok(result) => {
					self.current.store(index, Ordering::Release);
					return Ok(result);
				}
				// A node-level JSON-RPC error is an answer; rotating would
				// just re-ask a different node the same invalid question.
				Err(error @ TransportError::Rpc { .. }) => return Err(error),
				Err(error) => {
					tracing::warn!(
						method,
						transport = %child.config.key,
						error = %error,
						"fallback child transport failed, advancing"
					);
					last_error = Some(error);
				}
			}
		}

		self.current.store(start, Ordering::Release);
		match last_error {
			Some(error) => Err(error),
			None => Err(TransportError::Network(
				"fallback transport has no children".to_string(),
			)),
		}
	}
}
