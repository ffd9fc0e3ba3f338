//! Transport error types.
//!
//! Errors raised below the client layer: protocol-level JSON-RPC errors
//! returned by the node, HTTP/network failures, and transport construction
//! failures. Clients propagate these verbatim.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

/// Errors produced by a transport while dispatching a JSON-RPC request.
#[derive(Debug, Error)]
pub enum TransportError {
	/// The node answered with a JSON-RPC error object.
	///
	/// Carries the node-assigned numeric code, message and optional data,
	/// surfaced unchanged to the caller.
	#[error("rpc error {code}: {message}")]
	Rpc {
		code: i64,
		message: String,
		data: Option<Value>,
	},

	/// The HTTP endpoint answered with a non-success status.
	#[error("http error: status {status}")]
	Http { status: u16 },

	/// Connection-level failure (DNS, TLS, broken socket, malformed body).
	#[error("network error: {0}")]
	Network(String),

	/// No response arrived within the transport's configured timeout.
	#[error("request timed out after {0:?}")]
	Timeout(Duration),

	/// The transport is request/response only and cannot push new heads.
	#[error("transport does not support subscriptions")]
	SubscriptionsUnsupported,

	/// The transport factory could not build a usable transport value.
	#[error("failed to construct transport: {0}")]
	Construction(String),
}

impl TransportError {
	/// Builds an `Rpc` variant from a JSON-RPC `error` object.
	///
	/// Missing code/message fields fall back to the JSON-RPC internal error
	/// defaults rather than failing a second time while reporting a failure.
	pub fn from_rpc_object(error: &Value) -> Self {
		Self::Rpc {
			code: error.get("code").and_then(Value::as_i64).unwrap_or(-32603),
			message: error
				.get("message")
				.and_then(Value::as_str)
				.unwrap_or("unknown rpc error")
				.to_string(),
			data: error.get("data").filter(|d| !d.is_null()).cloned(),
		}
	}
}
