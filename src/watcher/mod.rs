//! Block watching: polling and push-based observation of new blocks.
//!
//! [`watch_blocks`] starts a long-lived watch over the chain head and returns
//! a cancellation handle. On subscription-capable transports it re-emits the
//! node's `newHeads` notifications; otherwise it polls `eth_blockNumber` on
//! the client's polling interval, detecting new blocks, backfilling missed
//! ranges when requested, and surviving transient RPC failures.
//!
//! Guarantees per watch instance:
//! - `on_block` is invoked in strictly increasing block-number order and
//!   never concurrently (one single-worker task per watch; a tick that would
//!   overlap a still-running fetch is skipped, not queued).
//! - After [`WatchHandle::stop`], no further `on_block` invocation occurs,
//!   including for a fetch already in flight at the moment of cancellation.
//! - Watch state is per-invocation; concurrent watches on one client are
//!   fully independent.

use std::sync::{
	atomic::{AtomicBool, Ordering},
	Arc,
};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::{
	clients::{Client, ClientError},
	formatter,
	models::{Block, BlockId, BlockTag},
};

/// Callback invoked with each new block and the previously emitted block.
pub type OnBlock = Arc<dyn Fn(Block, Option<Block>) + Send + Sync>;

/// Callback invoked with errors encountered inside the watch loop.
pub type OnError = Arc<dyn Fn(ClientError) + Send + Sync>;

/// Configuration for [`watch_blocks`].
pub struct WatchBlocksParams {
	/// Invoked for every emitted block, with the previously emitted block.
	pub on_block: OnBlock,
	/// Invoked with tick errors; when absent, errors are logged and the
	/// watch keeps running.
	pub on_error: Option<OnError>,
	/// Tag resolved on the first poll. Polling mode only.
	pub block_tag: BlockTag,
	/// Whether to backfill and emit every block of a missed range.
	/// Polling mode only.
	pub emit_missed: bool,
	/// Whether to emit the current head immediately on start.
	/// Polling mode only.
	pub emit_on_begin: bool,
	/// Whether emitted blocks carry full transaction bodies.
	pub include_transactions: bool,
	/// `Some(true)` forces polling even on subscription-capable transports.
	pub poll: Option<bool>,
	/// Poll period; defaults to the client's `polling_interval`.
	/// Polling mode only.
	pub polling_interval: Option<Duration>,
}

impl WatchBlocksParams {
	pub fn new(on_block: impl Fn(Block, Option<Block>) + Send + Sync + 'static) -> Self {
		Self {
			on_block: Arc::new(on_block),
			on_error: None,
			block_tag: BlockTag::Latest,
			emit_missed: false,
			emit_on_begin: false,
			include_transactions: false,
			poll: None,
			polling_interval: None,
		}
	}

	pub fn on_error(mut self, on_error: impl Fn(ClientError) + Send + Sync + 'static) -> Self {
		self.on_error = Some(Arc::new(on_error));
		self
	}

	pub fn block_tag(mut self, block_tag: BlockTag) -> Self {
		self.block_tag = block_tag;
		self
	}

	pub fn emit_missed(mut self, emit_missed: bool) -> Self {
		self.emit_missed = emit_missed;
		self
	}

	pub fn emit_on_begin(mut self, emit_on_begin: bool) -> Self {
		self.emit_on_begin = emit_on_begin;
		self
	}

	pub fn include_transactions(mut self, include_transactions: bool) -> Self {
		self.include_transactions = include_transactions;
		self
	}

	pub fn poll(mut self, poll: bool) -> Self {
		self.poll = Some(poll);
		self
	}

	pub fn polling_interval(mut self, polling_interval: Duration) -> Self {
		self.polling_interval = Some(polling_interval);
		self
	}
}

/// Cancellation handle for a running watch.
///
/// Stopping is cooperative and idempotent. Dropping the handle also stops
/// the watch.
#[derive(Debug)]
pub struct WatchHandle {
	active: Arc<AtomicBool>,
	stop: watch::Sender<bool>,
}

impl WatchHandle {
	/// Stops the watch: the timer halts (or the subscription closes) and an
	/// in-flight fetch, if any, is discarded without invoking `on_block`.
	pub fn stop(&self) {
		self.active.store(false, Ordering::Release);
		let _ = self.stop.send(true);
	}

	pub fn is_active(&self) -> bool {
		self.active.load(Ordering::Acquire)
	}
}

/// Starts watching for new blocks on the given client.
///
/// Validates the mode/parameter combination synchronously, then spawns the
/// watch task and returns its cancellation handle.
pub fn watch_blocks(
	client: Arc<Client>,
	params: WatchBlocksParams,
) -> Result<WatchHandle, ClientError> {
	let subscribe = client.transport.subscription_capable() && params.poll != Some(true);
	if subscribe {
		if params.emit_missed || params.emit_on_begin || params.polling_interval.is_some() {
			return Err(ClientError::InvalidWatchConfig(
				"`emit_missed`, `emit_on_begin` and `polling_interval` apply to polling mode only; \
				 pass `poll = true` to force polling on this transport"
					.to_string(),
			));
		}
		Ok(subscription_watch(client, params))
	} else {
		Ok(polling_watch(client, params))
	}
}

/// Mutable state owned by a single polling watch.
#[derive(Default)]
struct WatchState {
	/// Highest block number observed; only ever moves upward.
	last_block_number: Option<u64>,
	/// Last emitted (or, before any emission, first observed) block.
	previous: Option<Block>,
}

fn polling_watch(client: Arc<Client>, params: WatchBlocksParams) -> WatchHandle {
	let active = Arc::new(AtomicBool::new(true));
	let (stop_tx, mut stop_rx) = watch::channel(false);
	let period = params.polling_interval.unwrap_or(client.polling_interval);
	let task_active = active.clone();

	tokio::spawn(async move {
		let mut state = WatchState::default();
		let mut ticker = tokio::time::interval(period);
		// An overlapping tick is dropped, never queued: no backlog, no
		// concurrent fetches for this watch.
		ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

		loop {
			tokio::select! {
				_ = stop_rx.changed() => break,
				_ = ticker.tick() => {
					if !task_active.load(Ordering::Acquire) {
						break;
					}
					if let Err(error) = poll_tick(&client, &params, &mut state, &task_active).await {
						if !task_active.load(Ordering::Acquire) {
							break;
						}
						report(&params, error);
					}
				}
			}
		}
		tracing::debug!(client = %client.uid, "block watch stopped");
	});

	WatchHandle {
		active,
		stop: stop_tx,
	}
}

/// One poll cycle. Emits at most once per new block, in ascending order;
/// partial backfill progress is recorded so a failure mid-range resumes
/// where it stopped.
async fn poll_tick(
	client: &Client,
	params: &WatchBlocksParams,
	state: &mut WatchState,
	active: &AtomicBool,
) -> Result<(), ClientError> {
	let last = match state.last_block_number {
		None => {
			// First tick: resolve the configured tag once so the watch has a
			// starting point (and a previous-block pointer for later
			// emissions). Emission itself is opt-in via `emit_on_begin`.
			let block = crate::clients::public::get_block(
				client,
				BlockId::Tag(params.block_tag),
				params.include_transactions,
			)
			.await?;
			if !active.load(Ordering::Acquire) {
				return Ok(());
			}
			state.last_block_number = Some(block.number);
			if params.emit_on_begin {
				let previous = state.previous.replace(block.clone());
				(params.on_block)(block, previous);
			} else {
				state.previous = Some(block);
			}
			return Ok(());
		}
		Some(last) => last,
	};

	let head = crate::clients::public::get_block_number(client).await?;
	if !active.load(Ordering::Acquire) {
		return Ok(());
	}

	// A head below the recorded number means a reorg or a stale RPC answer;
	// the recorded number only ever moves upward.
	if head <= last {
		return Ok(());
	}

	if head > last + 1 && params.emit_missed {
		for number in (last + 1)..=head {
			emit_block(client, params, state, active, number).await?;
			if !active.load(Ordering::Acquire) {
				return Ok(());
			}
		}
	} else {
		if head > last + 1 {
			tracing::debug!(
				from = last + 1,
				to = head - 1,
				"skipping missed block range (emit_missed is disabled)"
			);
		}
		emit_block(client, params, state, active, head).await?;
	}
	Ok(())
}

/// Fetches one block by number and emits it, unless the watch was cancelled
/// while the fetch was in flight.
async fn emit_block(
	client: &Client,
	params: &WatchBlocksParams,
	state: &mut WatchState,
	active: &AtomicBool,
	number: u64,
) -> Result<(), ClientError> {
	let block = crate::clients::public::get_block(
		client,
		BlockId::Number(number),
		params.include_transactions,
	)
	.await?;
	if !active.load(Ordering::Acquire) {
		return Ok(());
	}
	state.last_block_number = Some(number);
	let previous = state.previous.replace(block.clone());
	(params.on_block)(block, previous);
	Ok(())
}

fn subscription_watch(client: Arc<Client>, params: WatchBlocksParams) -> WatchHandle {
	let active = Arc::new(AtomicBool::new(true));
	let (stop_tx, mut stop_rx) = watch::channel(false);
	let task_active = active.clone();

	tokio::spawn(async move {
		let mut subscription = match client.transport.subscribe_new_heads().await {
			Ok(subscription) => subscription,
			Err(error) => {
				report(&params, error.into());
				return;
			}
		};

		let mut last_block_number: Option<u64> = None;
		let mut previous: Option<Block> = None;

		loop {
			tokio::select! {
				_ = stop_rx.changed() => break,
				head = subscription.rx.recv() => {
					let raw = match head {
						Some(raw) => raw,
						// The transport dropped the subscription.
						None => break,
					};
					if !task_active.load(Ordering::Acquire) {
						break;
					}
					match formatter::format_block(&raw) {
						Ok(block) => {
							// De-duplicate pushes that do not advance the head.
							if last_block_number.is_some_and(|last| block.number <= last) {
								continue;
							}
							last_block_number = Some(block.number);
							let prev = previous.replace(block.clone());
							(params.on_block)(block, prev);
						}
						Err(error) => report(&params, error.into()),
					}
				}
			}
		}

		if let Err(error) = client.transport.unsubscribe(&subscription.id).await {
			tracing::debug!(error = %error, "unsubscribe on watch stop failed");
		}
		tracing::debug!(client = %client.uid, "block watch stopped");
	});

	WatchHandle {
		active,
		stop: stop_tx,
	}
}

/// Routes a watch-loop error: to `on_error` when provided, otherwise to the
/// log. A bad tick never terminates the watch.
fn report(params: &WatchBlocksParams, error: ClientError) {
	match &params.on_error {
		Some(on_error) => on_error(error),
		None => tracing::warn!(error = %error, "block watch tick failed"),
	}
}
