//! Client identifier generation.

use uuid::Uuid;

/// Length of generated client ids; short enough to stay readable in logs.
const UID_LEN: usize = 11;

/// Generates a short random identifier for a client instance.
///
/// Random rather than content-derived, so repeated constructions with
/// identical configuration still receive distinct ids. Callers needing
/// deterministic ids pass an explicit `uid` at construction instead.
pub fn uid() -> String {
	let hex = Uuid::new_v4().simple().to_string();
	hex[..UID_LEN].to_string()
}
