use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use logpage_service::{Error, LogService};

use super::{StubProvider, page, rate_limited};

#[tokio::test(start_paused = true)]
async fn rate_limit_is_retried_with_backoff_then_served() {
	let provider = StubProvider::new(|call, _| {
		if call < 2 { Err(rate_limited()) } else { Ok(page(&["1"], None)) }
	});
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());
	let began = Instant::now();
	let page = service
		.retrieve(&super::request("status:error"))
		.await
		.expect("Third attempt should succeed.");

	assert_eq!(page.entries.len(), 1);
	assert_eq!(provider.calls(), 3);
	// 2 s then 4 s of backoff.
	assert_eq!(began.elapsed().as_secs(), 6);
	assert_eq!(service.cache.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_report_the_retry_count() {
	let provider = StubProvider::new(|_, _| Err(rate_limited()));
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());
	let err = service
		.retrieve(&super::request("status:error"))
		.await
		.expect_err("Always rate-limited upstream should fail.");

	assert!(matches!(err, Error::RateLimitExceeded { retries: 2 }));
	assert_eq!(err.to_string(), "Rate limit exceeded after 2 retries.");
	assert_eq!(provider.calls(), 3);
	assert!(service.cache.is_empty());
}

#[tokio::test(start_paused = true)]
async fn authentication_failures_are_not_retried() {
	let provider = StubProvider::new(|_, _| {
		Err(logpage_providers::Error::Authentication { status: 401, body: String::new() })
	});
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());
	let err = service
		.retrieve(&super::request("status:error"))
		.await
		.expect_err("Unauthorized upstream should fail.");

	assert!(matches!(err, Error::Authentication { .. }));
	assert_eq!(provider.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn fetch_budget_covers_backoff() {
	let provider = StubProvider::new(|_, _| Err(rate_limited()));
	let mut cfg = super::test_config("http://stub");

	cfg.limits.fetch_timeout_ms = 3_000;

	let service = LogService::with_provider(cfg, provider.clone());
	let err = service
		.retrieve(&super::request("status:error"))
		.await
		.expect_err("Fetch should run out of time during backoff.");

	assert!(matches!(err, Error::Timeout { .. }));
	assert_eq!(provider.calls(), 2);
	assert_eq!(service.gate.available(), 5);
}

#[tokio::test(start_paused = true)]
async fn cancellation_during_backoff_releases_the_permit() {
	let provider = StubProvider::new(|_, _| Err(rate_limited()));
	let service = LogService::with_provider(super::test_config("http://stub"), provider.clone());
	let cancel = CancellationToken::new();
	let trigger = cancel.clone();

	tokio::spawn(async move {
		tokio::time::sleep(Duration::from_secs(1)).await;
		trigger.cancel();
	});

	let err = service
		.retrieve_with_cancel(&super::request("status:error"), &cancel)
		.await
		.expect_err("Retrieval should be cancelled.");

	assert!(matches!(err, Error::Cancelled));
	assert_eq!(provider.calls(), 1);
	assert_eq!(service.gate.available(), 5);
}
