use std::time::Duration;

use logpage_service::{Error, LogService};

use super::{StubProvider, page};

#[tokio::test]
async fn identical_requests_share_one_upstream_call() {
	let provider = StubProvider::new(|_, _| Ok(page(&["1", "2"], Some("c1"))));
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());
	let request = super::request("service:web-app status:error");

	for _ in 0..3 {
		let page = service.retrieve(&request).await.expect("Retrieval should succeed.");

		assert_eq!(page.entries.len(), 2);
	}

	assert_eq!(provider.calls(), 1);
	assert_eq!(service.cache.len(), 1);
}

#[tokio::test]
async fn equivalent_queries_share_a_fingerprint() {
	let provider = StubProvider::new(|_, _| Ok(page(&["1"], None)));
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());

	service
		.retrieve(&super::request("level:error   service:web-app"))
		.await
		.expect("Retrieval should succeed.");
	service
		.retrieve(&super::request("status:ERROR service:web-app").with_page_size(100))
		.await
		.expect("Retrieval should succeed.");

	assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn any_component_change_misses_the_cache() {
	let provider = StubProvider::new(|_, _| Ok(page(&["1"], Some("c1"))));
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());
	let (from, to) = super::window();
	let base = super::request("status:error");
	let requests = [
		base.clone(),
		super::request("status:warn"),
		base.clone().with_cursor("c1"),
		base.clone().with_page_size(50),
		logpage_service::LogQueryRequest::new("status:error", from, to + time::Duration::SECOND),
	];

	for request in &requests {
		service.retrieve(request).await.expect("Retrieval should succeed.");
	}

	assert_eq!(provider.calls(), requests.len());
}

#[tokio::test]
async fn expired_pages_are_fetched_again() {
	let provider = StubProvider::new(|_, _| Ok(page(&["1"], None)));
	let mut cfg = super::test_config("http://stub");

	cfg.cache.page_ttl_ms = 20;

	let service = LogService::with_provider(cfg, provider.clone());
	let request = super::request("status:error");

	service.retrieve(&request).await.expect("Retrieval should succeed.");
	tokio::time::sleep(Duration::from_millis(60)).await;
	service.retrieve(&request).await.expect("Retrieval should succeed.");

	assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn failures_leave_cached_pages_untouched() {
	let provider = StubProvider::new(|call, _| {
		if call == 0 {
			Ok(page(&["1"], None))
		} else {
			Err(logpage_providers::Error::UpstreamServer { status: 503, body: String::new() })
		}
	});
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());

	service.retrieve(&super::request("status:error")).await.expect("Retrieval should succeed.");

	let err = service
		.retrieve(&super::request("status:warn"))
		.await
		.expect_err("Second query should fail.");

	assert!(matches!(err, Error::UpstreamServer { status: 503, .. }));
	assert_eq!(service.cache.len(), 1);

	let cached = service
		.retrieve(&super::request("status:error"))
		.await
		.expect("Cached page should still be served.");

	assert_eq!(cached.entries.len(), 1);
	assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn page_size_defaults_and_caps() {
	let provider = StubProvider::new(|_, _| Ok(page(&[], None)));
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());

	for request in [
		super::request("a"),
		super::request("b").with_page_size(0),
		super::request("c").with_page_size(50_000),
		super::request("d").with_page_size(25),
	] {
		service.retrieve(&request).await.expect("Retrieval should succeed.");
	}

	let limits: Vec<u32> = provider.queries().iter().map(|query| query.limit).collect();

	assert_eq!(limits, vec![100, 100, 1_000, 25]);
}

#[tokio::test]
async fn blank_query_matches_everything() {
	let provider = StubProvider::new(|_, _| Ok(page(&[], None)));
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());

	service.retrieve(&super::request("   ")).await.expect("Retrieval should succeed.");

	assert_eq!(provider.queries()[0].query, "*");
}

#[tokio::test]
async fn inverted_time_range_is_rejected_without_a_call() {
	let provider = StubProvider::new(|_, _| Ok(page(&[], None)));
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());
	let (from, to) = super::window();
	let request = logpage_service::LogQueryRequest::new("status:error", to, from);
	let err = service.retrieve(&request).await.expect_err("Inverted range should be rejected.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(provider.calls(), 0);
}
