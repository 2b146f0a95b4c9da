pub mod bulk;
pub mod cache;
pub mod fetcher;
pub mod fingerprint;
pub mod gate;
pub mod retrieve;

mod error;

pub use bulk::BulkPage;
pub use cache::{CachedPage, PageCache, spawn_sweeper};
pub use error::{Error, Result};
pub use fetcher::{RateLimitedFetcher, RetryPolicy, RetryState};
pub use fingerprint::PageFingerprint;
pub use gate::{ConcurrencyGate, GatePermit};
pub use retrieve::{LogPage, LogQueryRequest};

use std::{future::Future, pin::Pin, sync::Arc};

use reqwest::Client;

use logpage_config::{Config, Upstream};
use logpage_providers::{PageQuery, SearchPage, search};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One attempt against the upstream log-search endpoint.
pub trait SearchProvider
where
	Self: Send + Sync,
{
	fn search_page<'a>(
		&'a self,
		cfg: &'a Upstream,
		query: &'a PageQuery,
	) -> BoxFuture<'a, logpage_providers::Result<SearchPage>>;
}

struct DefaultProvider {
	client: Client,
}
impl SearchProvider for DefaultProvider {
	fn search_page<'a>(
		&'a self,
		cfg: &'a Upstream,
		query: &'a PageQuery,
	) -> BoxFuture<'a, logpage_providers::Result<SearchPage>> {
		Box::pin(search::search_page(&self.client, cfg, query))
	}
}

pub struct LogService {
	pub cfg: Config,
	pub cache: Arc<PageCache>,
	pub gate: ConcurrencyGate,
	fetcher: RateLimitedFetcher,
}
impl LogService {
	pub fn new(cfg: Config) -> Result<Self> {
		let client = Client::builder().build().map_err(|err| Error::Config {
			message: format!("Failed to build HTTP client: {err}."),
		})?;

		Ok(Self::with_provider(cfg, Arc::new(DefaultProvider { client })))
	}

	pub fn with_provider(cfg: Config, provider: Arc<dyn SearchProvider>) -> Self {
		let gate = ConcurrencyGate::new(cfg.limits.max_concurrent_requests as usize);

		Self::with_parts(cfg, provider, Arc::new(PageCache::new()), gate)
	}

	/// Builds a service around an existing cache and permit pool, so several services can
	/// share them.
	pub fn with_parts(
		cfg: Config,
		provider: Arc<dyn SearchProvider>,
		cache: Arc<PageCache>,
		gate: ConcurrencyGate,
	) -> Self {
		let fetcher = RateLimitedFetcher::new(
			provider,
			cfg.upstream.clone(),
			RetryPolicy::from_config(&cfg.retry),
		);

		Self { cfg, cache, gate, fetcher }
	}

	pub fn page_ttl(&self) -> time::Duration {
		time::Duration::milliseconds(self.cfg.cache.page_ttl_ms.min(i64::MAX as u64) as i64)
	}
}
