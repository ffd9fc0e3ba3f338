//! Canonical transaction, receipt and log data structures.

use alloy::primitives::{Address, Bytes, B256, U256};
use serde::Serialize;

/// A formatted transaction record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
	pub hash: B256,
	pub nonce: u64,
	/// None while the transaction is pending.
	pub block_hash: Option<B256>,
	pub block_number: Option<u64>,
	pub transaction_index: Option<u64>,
	pub from: Address,
	/// None for contract creation.
	pub to: Option<Address>,
	pub value: U256,
	pub gas: U256,
	/// None for EIP-1559 transactions.
	pub gas_price: Option<U256>,
	pub max_fee_per_gas: Option<U256>,
	pub max_priority_fee_per_gas: Option<U256>,
	pub input: Bytes,
}

/// A formatted event log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Log {
	pub address: Address,
	pub topics: Vec<B256>,
	pub data: Bytes,
	pub block_number: Option<u64>,
	pub transaction_hash: Option<B256>,
	pub log_index: Option<u64>,
}

/// A formatted transaction receipt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionReceipt {
	pub transaction_hash: B256,
	pub transaction_index: u64,
	pub block_hash: B256,
	pub block_number: u64,
	pub from: Address,
	pub to: Option<Address>,
	pub cumulative_gas_used: U256,
	pub gas_used: U256,
	/// Set when the transaction deployed a contract.
	pub contract_address: Option<Address>,
	pub logs: Vec<Log>,
	/// Post-Byzantium execution status; None on pre-Byzantium chains.
	pub status: Option<bool>,
	pub effective_gas_price: Option<U256>,
}
