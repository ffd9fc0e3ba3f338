//! Canonical block data structures.
//!
//! A [`Block`] is the formatted counterpart of the raw, hex-encoded record
//! the node returns; the formatter module is the only converter between the
//! two representations.

use alloy::primitives::{Address, B256, U256};
use serde::Serialize;
use serde_json::Value;

use crate::utils::to_hex_quantity;

use super::Transaction;

/// A block position referenced by tag rather than number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlockTag {
	#[default]
	Latest,
	Earliest,
	Pending,
	Safe,
	Finalized,
}

impl std::fmt::Display for BlockTag {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let tag = match self {
			Self::Latest => "latest",
			Self::Earliest => "earliest",
			Self::Pending => "pending",
			Self::Safe => "safe",
			Self::Finalized => "finalized",
		};
		write!(f, "{}", tag)
	}
}

/// A block identifier as accepted by `eth_getBlockByNumber`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockId {
	Number(u64),
	Tag(BlockTag),
}

impl BlockId {
	/// The JSON-RPC positional parameter form of this identifier.
	pub fn as_param(&self) -> Value {
		match self {
			Self::Number(number) => Value::String(to_hex_quantity(*number)),
			Self::Tag(tag) => Value::String(tag.to_string()),
		}
	}
}

impl std::fmt::Display for BlockId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Number(number) => write!(f, "{}", number),
			Self::Tag(tag) => write!(f, "{}", tag),
		}
	}
}

impl From<u64> for BlockId {
	fn from(number: u64) -> Self {
		Self::Number(number)
	}
}

impl From<BlockTag> for BlockId {
	fn from(tag: BlockTag) -> Self {
		Self::Tag(tag)
	}
}

/// Transactions carried by a block: hashes only, or full bodies when the
/// block was fetched with `include_transactions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockTransactions {
	Hashes(Vec<B256>),
	Full(Vec<Transaction>),
}

impl BlockTransactions {
	pub fn len(&self) -> usize {
		match self {
			Self::Hashes(hashes) => hashes.len(),
			Self::Full(transactions) => transactions.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

impl Default for BlockTransactions {
	fn default() -> Self {
		Self::Hashes(Vec::new())
	}
}

/// A formatted block record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
	pub number: u64,
	pub hash: B256,
	pub parent_hash: B256,
	pub timestamp: u64,
	pub miner: Option<Address>,
	pub gas_limit: U256,
	pub gas_used: U256,
	pub base_fee_per_gas: Option<U256>,
	pub transactions: BlockTransactions,
}
