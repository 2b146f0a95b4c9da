use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use tokio_util::sync::CancellationToken;

use logpage_config::Upstream;
use logpage_providers::{PageQuery, SearchPage};
use logpage_service::{BoxFuture, ConcurrencyGate, Error, LogService, PageCache, SearchProvider};

/// Sleeps inside each call and tracks the highest number of overlapping calls.
#[derive(Default)]
struct SlowProvider {
	in_flight: AtomicUsize,
	peak: AtomicUsize,
	calls: AtomicUsize,
}
impl SearchProvider for SlowProvider {
	fn search_page<'a>(
		&'a self,
		_cfg: &'a Upstream,
		_query: &'a PageQuery,
	) -> BoxFuture<'a, logpage_providers::Result<SearchPage>> {
		Box::pin(async move {
			let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

			self.peak.fetch_max(now, Ordering::SeqCst);
			self.calls.fetch_add(1, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(100)).await;
			self.in_flight.fetch_sub(1, Ordering::SeqCst);

			Ok(super::page(&["1"], None))
		})
	}
}

#[tokio::test(start_paused = true)]
async fn in_flight_fetches_never_exceed_the_gate() {
	let provider = Arc::new(SlowProvider::default());
	let mut cfg = super::test_config("http://stub");

	cfg.limits.max_concurrent_requests = 2;

	let service = Arc::new(LogService::with_provider(cfg, provider.clone()));
	let mut handles = Vec::new();

	for idx in 0..6 {
		let service = service.clone();

		handles.push(tokio::spawn(async move {
			service.retrieve(&super::request(&format!("service:svc-{idx}"))).await
		}));
	}
	for handle in handles {
		handle.await.expect("Retrieval task should not panic.").expect("Retrieval should succeed.");
	}

	assert_eq!(provider.calls.load(Ordering::SeqCst), 6);
	assert_eq!(provider.peak.load(Ordering::SeqCst), 2);
	assert_eq!(service.gate.available(), 2);
}

#[tokio::test]
async fn cache_hits_do_not_need_a_permit() {
	let provider = Arc::new(SlowProvider::default());
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());
	let request = super::request("status:error");

	service.retrieve(&request).await.expect("Retrieval should succeed.");

	let mut held = Vec::new();

	for _ in 0..service.gate.capacity() {
		held.push(
			service.gate.acquire(&CancellationToken::new()).await.expect("Permit should be granted."),
		);
	}

	let page = service.retrieve(&request).await.expect("Cached page should be served.");

	assert_eq!(page.entries.len(), 1);
	assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_a_permit_wait() {
	let provider = Arc::new(SlowProvider::default());
	let mut cfg = super::test_config("http://stub");

	cfg.limits.max_concurrent_requests = 1;

	let service = LogService::with_provider(cfg, provider.clone());
	let _held =
		service.gate.acquire(&CancellationToken::new()).await.expect("Permit should be granted.");
	let cancel = CancellationToken::new();
	let trigger = cancel.clone();

	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_millis(50)).await;
		trigger.cancel();
	});

	let err = service
		.retrieve_with_cancel(&super::request("status:error"), &cancel)
		.await
		.expect_err("Permit wait should be cancelled.");

	assert!(matches!(err, Error::Cancelled));
	assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn services_can_share_cache_and_gate() {
	let provider = Arc::new(SlowProvider::default());
	let cache = Arc::new(PageCache::new());
	let gate = ConcurrencyGate::new(3);
	let first = LogService::with_parts(
		super::test_config("http://stub"),
		provider.clone(),
		cache.clone(),
		gate.clone(),
	);
	let second =
		LogService::with_parts(super::test_config("http://stub"), provider.clone(), cache, gate);
	let request = super::request("status:error");

	first.retrieve(&request).await.expect("Retrieval should succeed.");
	second.retrieve(&request).await.expect("Shared cache should serve the page.");

	assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
	assert_eq!(second.gate.capacity(), 3);
}
