//! Client construction and capability composition.
//!
//! A base [`Client`] owns identity (key, name, uid), the chain it is
//! configured against, and the built transport; it exposes exactly one
//! [`Client::request`] path by which any action communicates with the node.
//! Capability sets are added at construction time by decorator functions
//! ([`public_actions`], [`wallet_actions`], [`test_actions`]) that close over
//! an `Arc<Client>`, and the specialized clients embed the base client plus
//! the decorated action set.

mod error;
pub(crate) mod public;
mod wallet;

use std::time::Duration;

use serde_json::Value;

pub use error::ClientError;
pub use public::{
	create_public_client, public_actions, CallParams, MulticallBatchSettings, PublicActions,
	PublicClient, PublicClientConfig,
};
pub use test::{
	create_test_client, test_actions, TestActions, TestClient, TestClientConfig, TestClientMode,
};
pub use wallet::{
	create_wallet_client, wallet_actions, SignTypedDataParams, WalletActions, WalletClient,
	WalletClientConfig, WriteContractParams,
};

use crate::{
	models::Chain,
	transports::{BuiltTransport, TransportContext, TransportError, TransportFactory},
	utils,
};

/// Default frequency for polling-based actions.
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(4_000);

/// A minimal client: identity plus the bare request capability.
///
/// Immutable after construction; decoration produces new wrapper objects
/// rather than mutating the client in place, so concurrent actions on one
/// client need no synchronization.
#[derive(Debug)]
pub struct Client {
	/// Chain the client is configured against, if any.
	pub chain: Option<Chain>,
	/// Short key identifying the client kind (e.g. `"public"`).
	pub key: String,
	/// Human readable client name.
	pub name: String,
	/// Default interval consulted by polling actions; overridable per call.
	pub polling_interval: Duration,
	/// The merged transport config + value owned by this client.
	pub transport: BuiltTransport,
	/// Client kind tag (e.g. `"publicClient"`).
	pub kind: String,
	/// Unique instance id; random unless supplied at construction.
	pub uid: String,
}

impl Client {
	/// Dispatches a JSON-RPC request through the owned transport.
	///
	/// This is the only path by which actions reach the node.
	pub async fn request(&self, method: &str, params: Value) -> Result<Value, TransportError> {
		self.transport.request(method, params).await
	}
}

/// Configuration accepted by [`create_client`].
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
	pub chain: Option<Chain>,
	pub key: Option<String>,
	pub name: Option<String>,
	pub polling_interval: Option<Duration>,
	pub kind: Option<String>,
	/// Explicit uid, for deterministic construction in tests.
	pub uid: Option<String>,
}

/// Creates a base client over the given transport factory.
///
/// Defaults: `key = "base"`, `name = "Base Client"`, `kind = "base"`,
/// `polling_interval = 4s`. The factory is invoked exactly once; no network
/// I/O happens here, so failures surface only once `request` is invoked.
pub fn create_client(
	transport: &impl TransportFactory,
	config: ClientConfig,
) -> Result<Client, ClientError> {
	build_client(transport, config, None)
}

/// Shared constructor allowing specialized factories to override the
/// transport retry count (wallet clients build their transport with zero
/// retries so signing requests are never replayed).
pub(crate) fn build_client(
	transport: &impl TransportFactory,
	config: ClientConfig,
	retry_count_override: Option<u32>,
) -> Result<Client, ClientError> {
	let polling_interval = config.polling_interval.unwrap_or(DEFAULT_POLLING_INTERVAL);
	let ctx = TransportContext {
		chain_id: config.chain.as_ref().map(|chain| chain.id),
		polling_interval: Some(polling_interval),
		retry_count_override,
	};
	let transport = transport.build(ctx)?;

	let client = Client {
		chain: config.chain,
		key: config.key.unwrap_or_else(|| "base".to_string()),
		name: config.name.unwrap_or_else(|| "Base Client".to_string()),
		polling_interval,
		transport,
		kind: config.kind.unwrap_or_else(|| "base".to_string()),
		uid: config.uid.unwrap_or_else(utils::uid),
	};

	tracing::debug!(
		key = %client.key,
		kind = %client.kind,
		uid = %client.uid,
		transport = %client.transport.config.kind,
		"client created"
	);

	Ok(client)
}

/// Shared by the specialized factories: applies the kind-specific identity
/// defaults before delegating to the base constructor.
pub(crate) fn specialize(
	config: ClientConfig,
	key: &str,
	name: &str,
	kind: &str,
) -> ClientConfig {
	ClientConfig {
		key: config.key.or_else(|| Some(key.to_string())),
		name: config.name.or_else(|| Some(name.to_string())),
		kind: Some(kind.to_string()),
		..config
	}
}
