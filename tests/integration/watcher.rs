//! Tests for block watching in polling and subscription modes.
//!
//! Timing-sensitive cases run on tokio's paused clock, so intervals and
//! artificial transport latency advance deterministically.

use std::{
	sync::{Arc, Mutex},
	time::Duration,
};

use serde_json::json;

use evm_client::{
	clients::{create_public_client, ClientError, PublicClientConfig},
	models::Block,
	watcher::WatchBlocksParams,
};

use super::mocks::{block_json, push_transport, ScriptedChain};

type Emissions = Arc<Mutex<Vec<(u64, Option<u64>)>>>;

/// Records `(block, previous)` number pairs for later assertions.
fn recorder() -> (Emissions, impl Fn(Block, Option<Block>) + Send + Sync + 'static) {
	let seen: Emissions = Arc::new(Mutex::new(Vec::new()));
	let sink = seen.clone();
	let on_block = move |block: Block, previous: Option<Block>| {
		sink.lock()
			.unwrap()
			.push((block.number, previous.map(|p| p.number)));
	};
	(seen, on_block)
}

#[tokio::test(start_paused = true)]
async fn polling_emits_new_blocks_in_order() {
	let chain = ScriptedChain::new(vec![10, 11, 12]);
	let client = create_public_client(&chain.transport(), PublicClientConfig::default()).unwrap();

	let (seen, on_block) = recorder();
	let params = WatchBlocksParams::new(on_block).polling_interval(Duration::from_millis(25));
	let handle = client.watch_blocks(params).unwrap();

	tokio::time::sleep(Duration::from_millis(500)).await;
	handle.stop();

	assert_eq!(*seen.lock().unwrap(), vec![(11, Some(10)), (12, Some(11))]);
}

#[tokio::test(start_paused = true)]
async fn polling_backfills_missed_blocks_when_requested() {
	let chain = ScriptedChain::new(vec![10, 13]);
	let client = create_public_client(&chain.transport(), PublicClientConfig::default()).unwrap();

	let (seen, on_block) = recorder();
	let params = WatchBlocksParams::new(on_block)
		.emit_missed(true)
		.polling_interval(Duration::from_millis(25));
	let handle = client.watch_blocks(params).unwrap();

	tokio::time::sleep(Duration::from_millis(500)).await;
	handle.stop();

	assert_eq!(
		*seen.lock().unwrap(),
		vec![(11, Some(10)), (12, Some(11)), (13, Some(12))]
	);
}

#[tokio::test(start_paused = true)]
async fn polling_skips_missed_blocks_by_default() {
	let chain = ScriptedChain::new(vec![10, 13]);
	let client = create_public_client(&chain.transport(), PublicClientConfig::default()).unwrap();

	let (seen, on_block) = recorder();
	let params = WatchBlocksParams::new(on_block).polling_interval(Duration::from_millis(25));
	let handle = client.watch_blocks(params).unwrap();

	tokio::time::sleep(Duration::from_millis(500)).await;
	handle.stop();

	assert_eq!(*seen.lock().unwrap(), vec![(13, Some(10))]);
}

#[tokio::test(start_paused = true)]
async fn emit_on_begin_emits_the_current_head_immediately() {
	let chain = ScriptedChain::new(vec![10]);
	let client = create_public_client(&chain.transport(), PublicClientConfig::default()).unwrap();

	let (seen, on_block) = recorder();
	let params = WatchBlocksParams::new(on_block)
		.emit_on_begin(true)
		.polling_interval(Duration::from_secs(10));
	let handle = client.watch_blocks(params).unwrap();

	tokio::time::sleep(Duration::from_millis(100)).await;
	handle.stop();

	assert_eq!(*seen.lock().unwrap(), vec![(10, None)]);
}

#[tokio::test(start_paused = true)]
async fn head_regressions_are_ignored() {
	// The node briefly answers with an older head (reorg or lagging replica).
	let chain = ScriptedChain::new(vec![10, 12, 11, 13]);
	let client = create_public_client(&chain.transport(), PublicClientConfig::default()).unwrap();

	let (seen, on_block) = recorder();
	let params = WatchBlocksParams::new(on_block).polling_interval(Duration::from_millis(25));
	let handle = client.watch_blocks(params).unwrap();

	tokio::time::sleep(Duration::from_millis(500)).await;
	handle.stop();

	assert_eq!(*seen.lock().unwrap(), vec![(12, Some(10)), (13, Some(12))]);
}

#[tokio::test(start_paused = true)]
async fn stop_discards_an_in_flight_fetch() {
	let chain = ScriptedChain::new(vec![10]);
	// Hold the first-tick fetch in flight well past the stop call.
	chain.set_delay(Duration::from_millis(100));
	let client = create_public_client(&chain.transport(), PublicClientConfig::default()).unwrap();

	let (seen, on_block) = recorder();
	let params = WatchBlocksParams::new(on_block)
		.emit_on_begin(true)
		.polling_interval(Duration::from_millis(50));
	let handle = client.watch_blocks(params).unwrap();

	tokio::time::sleep(Duration::from_millis(20)).await;
	assert_eq!(chain.call_count("eth_getBlockByNumber"), 1);
	handle.stop();
	assert!(!handle.is_active());

	tokio::time::sleep(Duration::from_millis(500)).await;
	assert!(seen.lock().unwrap().is_empty());
	// Stopping twice is fine.
	handle.stop();
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_watch() {
	let chain = ScriptedChain::new(vec![10, 11, 12, 13, 14]);
	let client = create_public_client(&chain.transport(), PublicClientConfig::default()).unwrap();

	let (seen, on_block) = recorder();
	let params = WatchBlocksParams::new(on_block).polling_interval(Duration::from_millis(25));
	let handle = client.watch_blocks(params).unwrap();
	drop(handle);

	tokio::time::sleep(Duration::from_millis(500)).await;
	assert!(seen.lock().unwrap().is_empty());
	// At most the already-started first tick reached the transport.
	assert!(chain.calls().len() <= 1);
}

#[tokio::test(start_paused = true)]
async fn tick_errors_reach_on_error_and_the_watch_survives() {
	let chain = ScriptedChain::new(vec![10]);
	// A non-string head is a decode failure on every subsequent tick.
	chain.stub("eth_blockNumber", json!(42));
	let client = create_public_client(&chain.transport(), PublicClientConfig::default()).unwrap();

	let (seen, on_block) = recorder();
	let errors = Arc::new(Mutex::new(Vec::new()));
	let error_sink = errors.clone();
	let params = WatchBlocksParams::new(on_block)
		.on_error(move |error| error_sink.lock().unwrap().push(error.to_string()))
		.polling_interval(Duration::from_millis(25));
	let handle = client.watch_blocks(params).unwrap();

	tokio::time::sleep(Duration::from_millis(200)).await;

	assert!(seen.lock().unwrap().is_empty());
	// More than one tick failed, so the loop kept going after the first error.
	assert!(errors.lock().unwrap().len() > 1);
	assert!(handle.is_active());
	handle.stop();
}

#[tokio::test]
async fn subscription_mode_rejects_polling_only_params() {
	let (factory, _tx) = push_transport();
	let client = create_public_client(&factory, PublicClientConfig::default()).unwrap();

	for params in [
		WatchBlocksParams::new(|_, _| {}).emit_missed(true),
		WatchBlocksParams::new(|_, _| {}).emit_on_begin(true),
		WatchBlocksParams::new(|_, _| {}).polling_interval(Duration::from_secs(1)),
	] {
		let error = client.watch_blocks(params).unwrap_err();
		assert!(matches!(error, ClientError::InvalidWatchConfig(_)));
	}
}

#[tokio::test]
async fn subscription_mode_emits_pushed_heads() {
	let (factory, tx) = push_transport();
	let client = create_public_client(&factory, PublicClientConfig::default()).unwrap();

	let (seen, on_block) = recorder();
	let handle = client
		.watch_blocks(WatchBlocksParams::new(on_block))
		.unwrap();

	tx.send(block_json(5)).await.unwrap();
	tx.send(block_json(6)).await.unwrap();
	// Duplicate and stale pushes are dropped.
	tx.send(block_json(6)).await.unwrap();
	tx.send(block_json(4)).await.unwrap();
	tx.send(block_json(7)).await.unwrap();

	tokio::time::sleep(Duration::from_millis(100)).await;
	handle.stop();

	assert_eq!(
		*seen.lock().unwrap(),
		vec![(5, None), (6, Some(5)), (7, Some(6))]
	);
}

#[tokio::test(start_paused = true)]
async fn poll_true_forces_polling_on_a_capable_transport() {
	let chain = ScriptedChain::new(vec![10, 11]);
	// A subscribe function makes the transport subscription-capable, but
	// `poll = true` must route around it (and re-allow polling params).
	let factory = chain.transport().with_subscribe(|| async {
		Err(evm_client::transports::TransportError::SubscriptionsUnsupported)
	});
	let client = create_public_client(&factory, PublicClientConfig::default()).unwrap();

	let (seen, on_block) = recorder();
	let params = WatchBlocksParams::new(on_block)
		.poll(true)
		.emit_missed(true)
		.polling_interval(Duration::from_millis(25));
	let handle = client.watch_blocks(params).unwrap();

	tokio::time::sleep(Duration::from_millis(300)).await;
	handle.stop();

	assert_eq!(*seen.lock().unwrap(), vec![(11, Some(10))]);
	assert_eq!(chain.call_count("eth_subscribe"), 0);
}
