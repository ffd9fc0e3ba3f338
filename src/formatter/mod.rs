//! Conversion of raw node responses into canonical typed records.
//!
//! The node returns hex-string encoded, RPC-shaped JSON; this module is the
//! one permitted converter into the typed records under `models`. Conversion
//! is pure and total over well-formed responses; a malformed or missing field
//! raises a [`FormatError`] naming the offending field — nothing is silently
//! defaulted. Formatted records are never converted back to their raw shape.

use std::str::FromStr;

use alloy::primitives::{Address, Bytes, B256, U256};
use serde_json::Value;
use thiserror::Error;

use crate::models::{Block, BlockTransactions, Log, Transaction, TransactionReceipt};

/// A decode failure, named by the field that could not be interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
	#[error("missing required field `{0}`")]
	MissingField(&'static str),

	#[error("invalid value for field `{field}`: {reason}")]
	InvalidField {
		field: &'static str,
		reason: String,
	},
}

fn invalid(field: &'static str, reason: impl std::fmt::Display) -> FormatError {
	FormatError::InvalidField {
		field,
		reason: reason.to_string(),
	}
}

fn require<'a>(record: &'a Value, field: &'static str) -> Result<&'a Value, FormatError> {
	match record.get(field) {
		Some(value) if !value.is_null() => Ok(value),
		_ => Err(FormatError::MissingField(field)),
	}
}

fn str_field<'a>(record: &'a Value, field: &'static str) -> Result<&'a str, FormatError> {
	require(record, field)?
		.as_str()
		.ok_or_else(|| invalid(field, "expected a hex string"))
}

/// Parses a `0x`-prefixed hex quantity into a `u64`.
fn quantity(record: &Value, field: &'static str) -> Result<u64, FormatError> {
	let text = str_field(record, field)?;
	u64::from_str_radix(text.trim_start_matches("0x"), 16).map_err(|e| invalid(field, e))
}

fn quantity_u256(record: &Value, field: &'static str) -> Result<U256, FormatError> {
	let text = str_field(record, field)?;
	U256::from_str_radix(text.trim_start_matches("0x"), 16).map_err(|e| invalid(field, e))
}

/// Parses a hex-encoded field into any `FromStr` hex type (`Address`, `B256`,
/// `Bytes`).
fn hex_field<T>(record: &Value, field: &'static str) -> Result<T, FormatError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	let text = str_field(record, field)?;
	T::from_str(text).map_err(|e| invalid(field, e))
}

fn is_absent(record: &Value, field: &'static str) -> bool {
	matches!(record.get(field), None | Some(Value::Null))
}

fn opt_quantity(record: &Value, field: &'static str) -> Result<Option<u64>, FormatError> {
	if is_absent(record, field) {
		Ok(None)
	} else {
		quantity(record, field).map(Some)
	}
}

fn opt_quantity_u256(record: &Value, field: &'static str) -> Result<Option<U256>, FormatError> {
	if is_absent(record, field) {
		Ok(None)
	} else {
		quantity_u256(record, field).map(Some)
	}
}

fn opt_hex_field<T>(record: &Value, field: &'static str) -> Result<Option<T>, FormatError>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	if is_absent(record, field) {
		Ok(None)
	} else {
		hex_field(record, field).map(Some)
	}
}

/// Formats a raw block record (from `eth_getBlockByNumber` or a `newHeads`
/// notification) into a [`Block`].
///
/// Header-only records carry no `transactions` member; these format to an
/// empty hash list.
pub fn format_block(raw: &Value) -> Result<Block, FormatError> {
	let transactions = match raw.get("transactions") {
		None | Some(Value::Null) => BlockTransactions::default(),
		Some(Value::Array(items)) => {
			if items.iter().all(Value::is_string) {
				let hashes = items
					.iter()
					.map(|item| {
						let text = item.as_str().unwrap_or_default();
						B256::from_str(text).map_err(|e| invalid("transactions", e))
					})
					.collect::<Result<Vec<_>, _>>()?;
				BlockTransactions::Hashes(hashes)
			} else {
				let transactions = items
					.iter()
					.map(format_transaction)
					.collect::<Result<Vec<_>, _>>()?;
				BlockTransactions::Full(transactions)
			}
		}
		Some(_) => return Err(invalid("transactions", "expected an array")),
	};

	Ok(Block {
		number: quantity(raw, "number")?,
		hash: hex_field(raw, "hash")?,
		parent_hash: hex_field(raw, "parentHash")?,
		timestamp: quantity(raw, "timestamp")?,
		miner: opt_hex_field(raw, "miner")?,
		gas_limit: quantity_u256(raw, "gasLimit")?,
		gas_used: quantity_u256(raw, "gasUsed")?,
		base_fee_per_gas: opt_quantity_u256(raw, "baseFeePerGas")?,
		transactions,
	})
}

/// Formats a raw transaction record into a [`Transaction`].
pub fn format_transaction(raw: &Value) -> Result<Transaction, FormatError> {
	Ok(Transaction {
		hash: hex_field(raw, "hash")?,
		nonce: quantity(raw, "nonce")?,
		block_hash: opt_hex_field(raw, "blockHash")?,
		block_number: opt_quantity(raw, "blockNumber")?,
		transaction_index: opt_quantity(raw, "transactionIndex")?,
		from: hex_field(raw, "from")?,
		to: opt_hex_field(raw, "to")?,
		value: quantity_u256(raw, "value")?,
		gas: quantity_u256(raw, "gas")?,
		gas_price: opt_quantity_u256(raw, "gasPrice")?,
		max_fee_per_gas: opt_quantity_u256(raw, "maxFeePerGas")?,
		max_priority_fee_per_gas: opt_quantity_u256(raw, "maxPriorityFeePerGas")?,
		input: hex_field(raw, "input")?,
	})
}

/// Formats a raw log record into a [`Log`].
pub fn format_log(raw: &Value) -> Result<Log, FormatError> {
	let topics = match require(raw, "topics")? {
		Value::Array(items) => items
			.iter()
			.map(|item| {
				let text = item
					.as_str()
					.ok_or_else(|| invalid("topics", "expected hex strings"))?;
				B256::from_str(text).map_err(|e| invalid("topics", e))
			})
			.collect::<Result<Vec<_>, _>>()?,
		_ => return Err(invalid("topics", "expected an array")),
	};

	Ok(Log {
		address: hex_field(raw, "address")?,
		topics,
		data: hex_field(raw, "data")?,
		block_number: opt_quantity(raw, "blockNumber")?,
		transaction_hash: opt_hex_field(raw, "transactionHash")?,
		log_index: opt_quantity(raw, "logIndex")?,
	})
}

/// Formats a raw transaction receipt into a [`TransactionReceipt`].
pub fn format_receipt(raw: &Value) -> Result<TransactionReceipt, FormatError> {
	let logs = match raw.get("logs") {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::Array(items)) => items.iter().map(format_log).collect::<Result<Vec<_>, _>>()?,
		Some(_) => return Err(invalid("logs", "expected an array")),
	};

	Ok(TransactionReceipt {
		transaction_hash: hex_field(raw, "transactionHash")?,
		transaction_index: quantity(raw, "transactionIndex")?,
		block_hash: hex_field(raw, "blockHash")?,
		block_number: quantity(raw, "blockNumber")?,
		from: hex_field(raw, "from")?,
		to: opt_hex_field(raw, "to")?,
		cumulative_gas_used: quantity_u256(raw, "cumulativeGasUsed")?,
		gas_used: quantity_u256(raw, "gasUsed")?,
		contract_address: opt_hex_field(raw, "contractAddress")?,
		logs,
		status: opt_quantity(raw, "status")?.map(|status| status == 1),
		effective_gas_price: opt_quantity_u256(raw, "effectiveGasPrice")?,
	})
}
