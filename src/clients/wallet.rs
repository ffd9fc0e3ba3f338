//! Wallet (read/write) client and actions.
//!
//! Wallet actions cover the signing surface of a node or browser provider:
//! chain registration, typed-data signing and transaction submission. Signer
//! resolution is uniform: an explicit per-call account wins, otherwise the
//! account bound at construction, otherwise the action fails validation
//! before any transport call is made.

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde_json::{json, Map, Value};

use crate::{
	models::Chain,
	transports::TransportFactory,
	utils::to_hex_quantity,
};

use super::{
	build_client,
	public::{parse_bytes, parse_quantity},
	specialize, Client, ClientConfig, ClientError,
};

/// Parameters for the `sign_typed_data` action (`eth_signTypedData_v4`).
///
/// `typed_data` is the full EIP-712 payload (domain, types, primary type,
/// message) as JSON; the typed-data codec producing it is external to this
/// crate.
#[derive(Debug, Clone)]
pub struct SignTypedDataParams {
	pub account: Option<Address>,
	pub typed_data: Value,
}

/// Parameters for the `write_contract` action (`eth_sendTransaction`).
///
/// `calldata` is the ABI-encoded function selector and arguments; ABI
/// encoding is external to this crate.
#[derive(Debug, Clone, Default)]
pub struct WriteContractParams {
	pub account: Option<Address>,
	/// Contract to invoke.
	pub address: Address,
	/// ABI-encoded call data.
	pub calldata: Bytes,
	pub value: Option<U256>,
	pub gas: Option<U256>,
	pub max_fee_per_gas: Option<U256>,
	pub max_priority_fee_per_gas: Option<U256>,
	pub nonce: Option<u64>,
}

impl WriteContractParams {
	pub fn new(address: Address, calldata: Bytes) -> Self {
		Self {
			address,
			calldata,
			..Self::default()
		}
	}
}

/// Write/signing action set bound to a client and an optional account.
#[derive(Debug, Clone)]
pub struct WalletActions {
	client: Arc<Client>,
	account: Option<Address>,
}

/// Decorates a client with the wallet action set, threading through the
/// account bound at construction.
pub fn wallet_actions(client: Arc<Client>, account: Option<Address>) -> WalletActions {
	WalletActions { client, account }
}

impl WalletActions {
	fn resolve_account(
		&self,
		explicit: Option<Address>,
		action: &'static str,
	) -> Result<Address, ClientError> {
		explicit
			.or(self.account)
			.ok_or(ClientError::AccountRequired { action })
	}

	/// Requests the wallet to register a chain (`wallet_addEthereumChain`).
	pub async fn add_chain(&self, chain: &Chain) -> Result<(), ClientError> {
		let param = json!({
			"chainId": to_hex_quantity(chain.id),
			"chainName": chain.name,
			"nativeCurrency": {
				"name": chain.native_currency.name,
				"symbol": chain.native_currency.symbol,
				"decimals": chain.native_currency.decimals,
			},
			"rpcUrls": chain.rpc_urls,
			"blockExplorerUrls": chain
				.block_explorer_url
				.as_ref()
				.map(|url| vec![url.clone()]),
		});
		self.client
			.request("wallet_addEthereumChain", json!([param]))
			.await?;
		Ok(())
	}

	/// Returns the chain id reported by the wallet (`eth_chainId`).
	pub async fn get_chain_id(&self) -> Result<u64, ClientError> {
		let result = self.client.request("eth_chainId", json!([])).await?;
		parse_quantity(&result)
	}

	/// Signs an EIP-712 typed-data payload (`eth_signTypedData_v4`).
	pub async fn sign_typed_data(&self, params: SignTypedDataParams) -> Result<Bytes, ClientError> {
		let account = self.resolve_account(params.account, "sign_typed_data")?;
		let payload = serde_json::to_string(&params.typed_data)
			.map_err(|e| ClientError::InvalidParams(format!("unserializable typed data: {}", e)))?;

		let result = self
			.client
			.request(
				"eth_signTypedData_v4",
				json!([account.to_string(), payload]),
			)
			.await?;
		parse_bytes(&result)
	}

	/// Submits a contract write and returns the transaction hash
	/// (`eth_sendTransaction`).
	pub async fn write_contract(&self, params: WriteContractParams) -> Result<B256, ClientError> {
		let from = self.resolve_account(params.account, "write_contract")?;

		let mut transaction = Map::new();
		transaction.insert("from".to_string(), json!(from.to_string()));
		transaction.insert("to".to_string(), json!(params.address.to_string()));
		transaction.insert("data".to_string(), json!(params.calldata.to_string()));
		if let Some(value) = params.value {
			transaction.insert("value".to_string(), json!(to_hex_quantity(value)));
		}
		if let Some(gas) = params.gas {
			transaction.insert("gas".to_string(), json!(to_hex_quantity(gas)));
		}
		if let Some(max_fee) = params.max_fee_per_gas {
			transaction.insert("maxFeePerGas".to_string(), json!(to_hex_quantity(max_fee)));
		}
		if let Some(max_priority) = params.max_priority_fee_per_gas {
			transaction.insert(
				"maxPriorityFeePerGas".to_string(),
				json!(to_hex_quantity(max_priority)),
			);
		}
		if let Some(nonce) = params.nonce {
			transaction.insert("nonce".to_string(), json!(to_hex_quantity(nonce)));
		}

		let result = self
			.client
			.request("eth_sendTransaction", json!([Value::Object(transaction)]))
			.await?;
		let text = result.as_str().ok_or_else(|| {
			ClientError::UnexpectedResponse("expected a transaction hash string".to_string())
		})?;
		text.parse::<B256>().map_err(|e| {
			ClientError::UnexpectedResponse(format!("bad transaction hash `{}`: {}", text, e))
		})
	}
}

/// Configuration accepted by [`create_wallet_client`].
#[derive(Debug, Clone, Default)]
pub struct WalletClientConfig {
	pub chain: Option<Chain>,
	pub key: Option<String>,
	pub name: Option<String>,
	pub polling_interval: Option<std::time::Duration>,
	pub uid: Option<String>,
	/// Account used by actions that require a signer.
	pub account: Option<Address>,
}

/// A client decorated with the wallet action set.
pub struct WalletClient {
	client: Arc<Client>,
	actions: WalletActions,
	/// The account bound at construction, if any.
	pub account: Option<Address>,
}

/// Creates a wallet (read/write) client.
///
/// The transport is built with a retry count of zero: a signing request that
/// timed out must not be replayed automatically.
pub fn create_wallet_client(
	transport: &impl TransportFactory,
	config: WalletClientConfig,
) -> Result<WalletClient, ClientError> {
	let base = ClientConfig {
		chain: config.chain,
		key: config.key,
		name: config.name,
		polling_interval: config.polling_interval,
		kind: None,
		uid: config.uid,
	};
	let base = specialize(base, "wallet", "Wallet Client", "walletClient");
	let client = Arc::new(build_client(transport, base, Some(0))?);
	Ok(WalletClient {
		actions: wallet_actions(client.clone(), config.account),
		account: config.account,
		client,
	})
}

impl WalletClient {
	pub async fn add_chain(&self, chain: &Chain) -> Result<(), ClientError> {
		self.actions.add_chain(chain).await
	}

	pub async fn get_chain_id(&self) -> Result<u64, ClientError> {
		self.actions.get_chain_id().await
	}

	pub async fn sign_typed_data(&self, params: SignTypedDataParams) -> Result<Bytes, ClientError> {
		self.actions.sign_typed_data(params).await
	}

	pub async fn write_contract(&self, params: WriteContractParams) -> Result<B256, ClientError> {
		self.actions.write_contract(params).await
	}
}

impl std::ops::Deref for WalletClient {
	type Target = Client;

	fn deref(&self) -> &Self::Target {
		&self.client
	}
}
