//! Tests for the HTTP, custom and fallback transports.

use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc,
};

use serde_json::{json, Value};

use evm_client::transports::{
	custom, fallback, http, web_socket, TransportContext, TransportError, TransportFactory,
};

fn build(factory: &impl TransportFactory) -> evm_client::transports::BuiltTransport {
	factory.build(TransportContext::default()).unwrap()
}

/// A counting custom factory that always fails with a network error.
fn failing_child(calls: Arc<AtomicUsize>) -> Box<dyn TransportFactory> {
	Box::new(
		custom(move |_method, _params| {
			let calls = calls.clone();
			async move {
				calls.fetch_add(1, Ordering::SeqCst);
				Err(TransportError::Network("connection refused".to_string()))
			}
		})
		.key("failing"),
	)
}

/// A counting custom factory that answers every request with the given result.
fn healthy_child(calls: Arc<AtomicUsize>, result: Value) -> Box<dyn TransportFactory> {
	Box::new(
		custom(move |_method, _params| {
			let calls = calls.clone();
			let result = result.clone();
			async move {
				calls.fetch_add(1, Ordering::SeqCst);
				Ok(result)
			}
		})
		.key("healthy"),
	)
}

#[tokio::test]
async fn http_transport_returns_the_result_payload() {
	let mut server = mockito::Server::new_async().await;
	let mock = server
		.mock("POST", "/")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x10"}"#)
		.create_async()
		.await;

	let transport = build(&http(server.url()));
	let result = transport.request("eth_blockNumber", json!([])).await.unwrap();

	assert_eq!(result, json!("0x10"));
	mock.assert_async().await;
}

#[tokio::test]
async fn http_transport_maps_node_errors() {
	let mut server = mockito::Server::new_async().await;
	let _mock = server
		.mock("POST", "/")
		.with_status(200)
		.with_header("content-type", "application/json")
		.with_body(
			r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"method not found"}}"#,
		)
		.create_async()
		.await;

	let transport = build(&http(server.url()));
	let error = transport
		.request("eth_unknownMethod", json!([]))
		.await
		.unwrap_err();

	assert!(matches!(
		error,
		TransportError::Rpc {
			code: -32601,
			ref message,
			..
		} if message == "method not found"
	));
}

#[tokio::test]
async fn http_transport_maps_error_statuses() {
	let mut server = mockito::Server::new_async().await;
	let _mock = server
		.mock("POST", "/")
		.with_status(503)
		.create_async()
		.await;

	// Zero retries keeps the middleware out of the way.
	let transport = build(&http(server.url()).retry_count(0));
	let error = transport.request("eth_blockNumber", json!([])).await.unwrap_err();

	assert!(matches!(error, TransportError::Http { status: 503 }));
}

#[tokio::test]
async fn http_factory_rejects_invalid_urls() {
	let error = http("not a url")
		.build(TransportContext::default())
		.unwrap_err();
	assert!(matches!(error, TransportError::Construction(_)));
}

#[test]
fn factories_are_pure() {
	// No endpoint behind these URLs; construction still succeeds because
	// transports connect lazily.
	http("http://127.0.0.1:1").build(TransportContext::default()).unwrap();
	web_socket("ws://127.0.0.1:1")
		.build(TransportContext::default())
		.unwrap();
}

#[test]
fn fallback_requires_children() {
	let error = fallback(vec![])
		.build(TransportContext::default())
		.unwrap_err();
	assert!(matches!(error, TransportError::Construction(_)));
}

#[tokio::test]
async fn fallback_advances_on_transport_failure_and_stays_sticky() {
	let failing_calls = Arc::new(AtomicUsize::new(0));
	let healthy_calls = Arc::new(AtomicUsize::new(0));

	let transport = build(&fallback(vec![
		failing_child(failing_calls.clone()),
		healthy_child(healthy_calls.clone(), json!("0x1")),
	]));

	// First request walks past the failing child.
	let result = transport.request("eth_chainId", json!([])).await.unwrap();
	assert_eq!(result, json!("0x1"));
	assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
	assert_eq!(healthy_calls.load(Ordering::SeqCst), 1);

	// Subsequent requests go straight to the child that answered.
	transport.request("eth_chainId", json!([])).await.unwrap();
	assert_eq!(failing_calls.load(Ordering::SeqCst), 1);
	assert_eq!(healthy_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn fallback_surfaces_rpc_errors_without_rotating() {
	let rpc_error_calls = Arc::new(AtomicUsize::new(0));
	let inner = rpc_error_calls.clone();
	let erroring = Box::new(custom(move |_method, _params| {
		let calls = inner.clone();
		async move {
			calls.fetch_add(1, Ordering::SeqCst);
			Err(TransportError::Rpc {
				code: 3,
				message: "execution reverted".to_string(),
				data: Some(json!("0x08c379a0")),
			})
		}
	})) as Box<dyn TransportFactory>;
	let healthy_calls = Arc::new(AtomicUsize::new(0));

	let transport = build(&fallback(vec![
		erroring,
		healthy_child(healthy_calls.clone(), json!("0x1")),
	]));

	let error = transport.request("eth_call", json!([])).await.unwrap_err();
	assert!(matches!(error, TransportError::Rpc { code: 3, .. }));
	// The node answered; the next child is never consulted.
	assert_eq!(healthy_calls.load(Ordering::SeqCst), 0);

	// And the current child does not advance either.
	let _ = transport.request("eth_call", json!([])).await.unwrap_err();
	assert_eq!(rpc_error_calls.load(Ordering::SeqCst), 2);
	assert_eq!(healthy_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn fallback_returns_the_last_error_when_all_children_fail() {
	let first = Arc::new(AtomicUsize::new(0));
	let second = Arc::new(AtomicUsize::new(0));

	let transport = build(&fallback(vec![
		failing_child(first.clone()),
		failing_child(second.clone()),
	]));

	let error = transport.request("eth_chainId", json!([])).await.unwrap_err();
	assert!(matches!(error, TransportError::Network(_)));
	assert_eq!(first.load(Ordering::SeqCst), 1);
	assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn custom_transport_reports_its_capabilities() {
	let plain = build(&custom(|_method, _params| async { Ok(Value::Null) }));
	assert!(!plain.subscription_capable());
	assert!(matches!(
		plain.subscribe_new_heads().await.unwrap_err(),
		TransportError::SubscriptionsUnsupported
	));

	let (factory, _tx) = super::mocks::push_transport();
	let push = build(&factory);
	assert!(push.subscription_capable());
}

#[tokio::test]
async fn fallback_aggregates_child_configs() {
	let transport = build(&fallback(vec![
		Box::new(http("http://127.0.0.1:1").retry_count(2)),
		Box::new(http("http://127.0.0.1:2").retry_count(5)),
	]));

	assert_eq!(transport.config.key, "fallback");
	assert_eq!(transport.config.retry_count, 5);
	assert!(!transport.subscription_capable());
}
