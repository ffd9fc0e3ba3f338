//! Client error types.
//!
//! Three error families cross the client surface: transport/RPC failures
//! (propagated verbatim), synchronous validation failures raised before any
//! network call, and decode failures from the formatter.

use thiserror::Error;

use crate::{formatter::FormatError, transports::TransportError};

/// Errors produced by client actions.
#[derive(Debug, Error)]
pub enum ClientError {
	/// Transport-level or node-reported failure, surfaced unchanged.
	#[error("transport error: {0}")]
	Transport(#[from] TransportError),

	/// The formatter could not interpret a raw response field.
	#[error("decode error: {0}")]
	Decode(#[from] FormatError),

	/// The requested block does not exist (or is not yet available).
	#[error("block not found: {0}")]
	BlockNotFound(String),

	/// A signing action was invoked with no per-call account and no account
	/// bound at client construction. Raised before any transport call.
	#[error("an account is required for `{action}`; pass one per call or bind one at construction")]
	AccountRequired { action: &'static str },

	/// The caller combined watch options that contradict the selected mode.
	#[error("invalid watch configuration: {0}")]
	InvalidWatchConfig(String),

	/// Caller-supplied parameters could not be encoded.
	#[error("invalid parameters: {0}")]
	InvalidParams(String),

	/// The node answered successfully but with an unusable shape.
	#[error("unexpected response: {0}")]
	UnexpectedResponse(String),
}
