//! Public (read-only) client and actions.
//!
//! Public actions wrap the "public" JSON-RPC methods: contract reads, chain
//! identity, block retrieval and block watching. Each action builds a fixed
//! lowerCamel method name and positional parameter array, dispatches through
//! the owning client's `request` and formats the raw result.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, U256};
use serde_json::{json, Map, Value};

use crate::{
	formatter,
	models::{Block, BlockId, BlockTag, TransactionReceipt},
	transports::TransportFactory,
	utils::{from_hex_quantity, to_hex_quantity},
	watcher::{self, WatchBlocksParams, WatchHandle},
};

use super::{build_client, specialize, Client, ClientConfig, ClientError};

use alloy::primitives::B256;

/// Multicall aggregation settings accepted by the public client.
///
/// Stored for transports/extensions that aggregate `eth_call`s; the plain
/// actions here dispatch each call individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MulticallBatchSettings {
	/// Maximum calldata chunk size in bytes.
	pub batch_size: usize,
	/// Maximum milliseconds to wait before sending a batch.
	pub wait_ms: u64,
}

impl Default for MulticallBatchSettings {
	fn default() -> Self {
		Self {
			batch_size: 1_024,
			wait_ms: 16,
		}
	}
}

/// Parameters for the `call` action (`eth_call`).
#[derive(Debug, Clone, Default)]
pub struct CallParams {
	/// Sender to simulate the call from.
	pub from: Option<Address>,
	/// Contract to call.
	pub to: Address,
	/// ABI-encoded call data.
	pub data: Option<Bytes>,
	pub value: Option<U256>,
	pub gas: Option<U256>,
	pub gas_price: Option<U256>,
	/// Block to execute against; defaults to `latest`.
	pub block: Option<BlockId>,
}

impl CallParams {
	pub fn new(to: Address) -> Self {
		Self {
			to,
			..Self::default()
		}
	}
}

/// Read-only action set bound to a client.
///
/// Produced by [`public_actions`]; every action references the client passed
/// at decoration time, never the merged object it ends up embedded in.
#[derive(Debug, Clone)]
pub struct PublicActions {
	client: Arc<Client>,
}

/// Decorates a client with the public action set.
pub fn public_actions(client: Arc<Client>) -> PublicActions {
	PublicActions { client }
}

impl PublicActions {
	/// Executes a read-only contract call (`eth_call`).
	pub async fn call(&self, params: CallParams) -> Result<Bytes, ClientError> {
		let mut call = Map::new();
		call.insert("to".to_string(), json!(params.to.to_string()));
		if let Some(from) = params.from {
			call.insert("from".to_string(), json!(from.to_string()));
		}
		if let Some(data) = &params.data {
			call.insert("data".to_string(), json!(data.to_string()));
		}
		if let Some(value) = params.value {
			call.insert("value".to_string(), json!(to_hex_quantity(value)));
		}
		if let Some(gas) = params.gas {
			call.insert("gas".to_string(), json!(to_hex_quantity(gas)));
		}
		if let Some(gas_price) = params.gas_price {
			call.insert("gasPrice".to_string(), json!(to_hex_quantity(gas_price)));
		}
		let block = params.block.unwrap_or(BlockId::Tag(BlockTag::Latest));

		let result = self
			.client
			.request("eth_call", json!([Value::Object(call), block.as_param()]))
			.await?;
		parse_bytes(&result)
	}

	/// Returns the chain id reported by the node (`eth_chainId`).
	pub async fn get_chain_id(&self) -> Result<u64, ClientError> {
		let result = self.client.request("eth_chainId", json!([])).await?;
		parse_quantity(&result)
	}

	/// Returns the number of the most recent block (`eth_blockNumber`).
	pub async fn get_block_number(&self) -> Result<u64, ClientError> {
		get_block_number(&self.client).await
	}

	/// Fetches and formats a block (`eth_getBlockByNumber`).
	pub async fn get_block(
		&self,
		id: impl Into<BlockId>,
		include_transactions: bool,
	) -> Result<Block, ClientError> {
		get_block(&self.client, id.into(), include_transactions).await
	}

	/// Fetches a transaction receipt; `None` while the transaction is
	/// pending (`eth_getTransactionReceipt`).
	pub async fn get_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, ClientError> {
		let result = self
			.client
			.request("eth_getTransactionReceipt", json!([hash.to_string()]))
			.await?;
		if result.is_null() {
			return Ok(None);
		}
		Ok(Some(formatter::format_receipt(&result)?))
	}

	/// Starts watching for new blocks; see the `watcher` module for the
	/// polling/subscription semantics.
	pub fn watch_blocks(&self, params: WatchBlocksParams) -> Result<WatchHandle, ClientError> {
		watcher::watch_blocks(self.client.clone(), params)
	}
}

/// `eth_blockNumber`, shared with the block watcher.
pub(crate) async fn get_block_number(client: &Client) -> Result<u64, ClientError> {
	let result = client.request("eth_blockNumber", json!([])).await?;
	parse_quantity(&result)
}

/// `eth_getBlockByNumber` plus formatting, shared with the block watcher.
pub(crate) async fn get_block(
	client: &Client,
	id: BlockId,
	include_transactions: bool,
) -> Result<Block, ClientError> {
	let result = client
		.request(
			"eth_getBlockByNumber",
			json!([id.as_param(), include_transactions]),
		)
		.await?;
	if result.is_null() {
		return Err(ClientError::BlockNotFound(id.to_string()));
	}
	Ok(formatter::format_block(&result)?)
}

pub(crate) fn parse_quantity(result: &Value) -> Result<u64, ClientError> {
	let text = result.as_str().ok_or_else(|| {
		ClientError::UnexpectedResponse("expected a hex quantity string".to_string())
	})?;
	from_hex_quantity(text)
		.map_err(|e| ClientError::UnexpectedResponse(format!("bad hex quantity `{}`: {}", text, e)))
}

pub(crate) fn parse_bytes(result: &Value) -> Result<Bytes, ClientError> {
	let text = result
		.as_str()
		.ok_or_else(|| ClientError::UnexpectedResponse("expected a hex string".to_string()))?;
	text.parse::<Bytes>()
		.map_err(|e| ClientError::UnexpectedResponse(format!("bad hex data `{}`: {}", text, e)))
}

/// Configuration accepted by [`create_public_client`].
#[derive(Debug, Clone, Default)]
pub struct PublicClientConfig {
	pub chain: Option<crate::models::Chain>,
	pub key: Option<String>,
	pub name: Option<String>,
	pub polling_interval: Option<std::time::Duration>,
	pub uid: Option<String>,
	/// Multicall aggregation settings; stored, not interpreted here.
	pub batch: Option<MulticallBatchSettings>,
}

/// A client decorated with the public action set.
pub struct PublicClient {
	client: Arc<Client>,
	actions: PublicActions,
	/// Multicall aggregation settings carried from construction.
	pub batch: Option<MulticallBatchSettings>,
}

/// Creates a public (read-only) client.
pub fn create_public_client(
	transport: &impl TransportFactory,
	config: PublicClientConfig,
) -> Result<PublicClient, ClientError> {
	let base = ClientConfig {
		chain: config.chain,
		key: config.key,
		name: config.name,
		polling_interval: config.polling_interval,
		kind: None,
		uid: config.uid,
	};
	let base = specialize(base, "public", "Public Client", "publicClient");
	let client = Arc::new(build_client(transport, base, None)?);
	Ok(PublicClient {
		actions: public_actions(client.clone()),
		batch: config.batch,
		client,
	})
}

impl PublicClient {
	pub async fn call(&self, params: CallParams) -> Result<Bytes, ClientError> {
		self.actions.call(params).await
	}

	pub async fn get_chain_id(&self) -> Result<u64, ClientError> {
		self.actions.get_chain_id().await
	}

	pub async fn get_block_number(&self) -> Result<u64, ClientError> {
		self.actions.get_block_number().await
	}

	pub async fn get_block(
		&self,
		id: impl Into<BlockId>,
		include_transactions: bool,
	) -> Result<Block, ClientError> {
		self.actions.get_block(id, include_transactions).await
	}

	pub async fn get_transaction_receipt(
		&self,
		hash: B256,
	) -> Result<Option<TransactionReceipt>, ClientError> {
		self.actions.get_transaction_receipt(hash).await
	}

	pub fn watch_blocks(&self, params: WatchBlocksParams) -> Result<WatchHandle, ClientError> {
		self.actions.watch_blocks(params)
	}
}

impl std::ops::Deref for PublicClient {
	type Target = Client;

	fn deref(&self) -> &Self::Target {
		&self.client
	}
}
