use std::{
	future::IntoFuture,
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use axum::{Json, Router, extract::State, response::IntoResponse, routing};
use serde_json::Value;
use tokio::{
	net::TcpListener,
	sync::{oneshot, oneshot::Sender},
};

use logpage_config::DEFAULT_SEARCH_PATH;
use logpage_service::LogService;

#[derive(Clone, Default)]
struct Upstream {
	calls: Arc<AtomicUsize>,
	bodies: Arc<Mutex<Vec<Value>>>,
}

async fn start_server(app: Router) -> (String, Sender<()>) {
	let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind stub server.");
	let addr = listener.local_addr().expect("Failed to read stub server address.");
	let (tx, rx) = oneshot::channel();
	let server = axum::serve(listener, app).with_graceful_shutdown(async move {
		let _ = rx.await;
	});

	tokio::spawn(async move {
		let _ = server.into_future().await;
	});

	(format!("http://{addr}"), tx)
}

async fn search_handler(
	State(upstream): State<Upstream>,
	Json(payload): Json<Value>,
) -> impl IntoResponse {
	upstream.calls.fetch_add(1, Ordering::SeqCst);
	upstream.bodies.lock().unwrap_or_else(|err| err.into_inner()).push(payload);

	Json(serde_json::json!({
		"data": [
			{
				"id": "AAA",
				"attributes": {
					"timestamp": "2024-05-01T10:15:00Z",
					"message": "  upstream timeout  ",
					"status": "error",
					"service": "web-app",
					"host": "web-1",
					"tags": ["env:prod", "version:1.4.2"]
				}
			},
			{
				"id": "BBB",
				"attributes": {
					"timestamp": "2024-05-01T10:16:00Z",
					"message": "retrying request",
					"status": "error",
					"service": "web-app"
				}
			}
		],
		"meta": { "page": { "after": "c1" } }
	}))
}

#[tokio::test]
async fn repeated_query_is_served_from_cache() {
	let upstream = Upstream::default();
	let app = Router::new()
		.route(DEFAULT_SEARCH_PATH, routing::post(search_handler))
		.with_state(upstream.clone());
	let (api_base, shutdown) = start_server(app).await;
	let service =
		LogService::new(super::test_config(&api_base)).expect("Failed to build log service.");
	let request = super::request("service:web-app status:error").with_page_size(100);
	let first = service.retrieve(&request).await.expect("First retrieval should succeed.");

	assert_eq!(first.entries.len(), 2);
	assert_eq!(first.next_cursor.as_deref(), Some("c1"));
	assert_eq!(first.entries[0].body, "upstream timeout");
	assert_eq!(first.entries[0].level, "ERROR");
	assert_eq!(first.entries[0].metadata.environment.as_deref(), Some("prod"));
	assert_eq!(first.entries[0].metadata.version.as_deref(), Some("1.4.2"));

	let second = service.retrieve(&request).await.expect("Second retrieval should succeed.");

	assert_eq!(second, first);
	assert_eq!(upstream.calls.load(Ordering::SeqCst), 1);

	let bodies = upstream.bodies.lock().unwrap_or_else(|err| err.into_inner()).clone();

	assert_eq!(bodies[0]["filter"]["query"], "service:web-app status:ERROR");
	assert_eq!(bodies[0]["page"]["limit"], 100);
	assert!(bodies[0]["page"].get("cursor").is_none());

	let _ = shutdown.send(());
}

#[tokio::test]
async fn always_rate_limited_upstream_is_called_once_per_attempt() {
	let calls = Arc::new(AtomicUsize::new(0));
	let counter = calls.clone();
	let app = Router::new().route(
		DEFAULT_SEARCH_PATH,
		routing::post(move || {
			let counter = counter.clone();

			async move {
				counter.fetch_add(1, Ordering::SeqCst);

				(axum::http::StatusCode::TOO_MANY_REQUESTS, "Too many requests")
			}
		}),
	);
	let (api_base, shutdown) = start_server(app).await;
	let mut cfg = super::test_config(&api_base);

	cfg.retry.base_delay_ms = 1;
	cfg.retry.max_delay_ms = 5;

	let service = LogService::new(cfg).expect("Failed to build log service.");
	let err = service
		.retrieve(&super::request("status:error"))
		.await
		.expect_err("Rate-limited retrieval should fail.");

	assert!(matches!(err, logpage_service::Error::RateLimitExceeded { retries: 2 }));
	assert_eq!(calls.load(Ordering::SeqCst), 3);
	assert!(service.cache.is_empty());

	let _ = shutdown.send(());
}
