//! Chain configuration models.

use serde::{Deserialize, Serialize};

/// The native fee currency of a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
}

/// Static description of an Ethereum-compatible chain.
///
/// Carries what `wallet_addEthereumChain` needs alongside the chain id a
/// client is configured against. Immutable once attached to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
	/// The chain id (e.g. 1 for Ethereum mainnet).
	pub id: u64,
	/// Human readable chain name.
	pub name: String,
	/// Fee currency metadata.
	pub native_currency: NativeCurrency,
	/// Default HTTP JSON-RPC endpoints.
	pub rpc_urls: Vec<String>,
	/// Optional block explorer base URL.
	pub block_explorer_url: Option<String>,
}

impl Chain {
	/// Convenience constructor for chains where only id and name matter.
	pub fn new(id: u64, name: impl Into<String>) -> Self {
		Self {
			id,
			name: name.into(),
			native_currency: NativeCurrency {
				name: "Ether".to_string(),
				symbol: "ETH".to_string(),
				decimals: 18,
			},
			rpc_urls: Vec::new(),
			block_explorer_url: None,
		}
	}
}
