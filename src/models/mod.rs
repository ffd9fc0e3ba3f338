//! Domain models and data structures.
//!
//! Canonical, typed counterparts of the raw JSON-RPC records:
//!
//! - `chain`: static chain configuration attached to clients
//! - `block`: block records, tags and identifiers
//! - `transaction`: transactions, receipts and logs

mod block;
mod chain;
mod transaction;

pub use block::{Block, BlockId, BlockTag, BlockTransactions};
pub use chain::{Chain, NativeCurrency};
pub use transaction::{Log, Transaction, TransactionReceipt};
