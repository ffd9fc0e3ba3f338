//! Shared utilities.
//!
//! - `encoding`: `0x`-hex quantity helpers shared by actions and tests
//! - `logging`: tracing subscriber setup for embedding applications
//! - `uid`: short random client identifiers

mod encoding;
mod logging;
mod uid;

pub use encoding::{from_hex_quantity, to_hex_quantity};
pub use logging::{setup_logging, setup_logging_with_writer};
pub use uid::uid;
