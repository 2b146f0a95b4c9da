use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::{Error, Result, SearchProvider};
use logpage_config::{Retry, Upstream};
use logpage_providers::{PageQuery, SearchPage};

const MAX_BACKOFF_EXP: u32 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
	pub max_retries: u32,
	pub base_delay: Duration,
	pub max_delay: Duration,
}
impl RetryPolicy {
	pub fn from_config(cfg: &Retry) -> Self {
		Self {
			max_retries: cfg.max_retries,
			base_delay: Duration::from_millis(cfg.base_delay_ms),
			max_delay: Duration::from_millis(cfg.max_delay_ms),
		}
	}

	/// `base * 2^attempt`, capped at `max_delay`. Attempts start at zero.
	pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
		let exp = attempt.min(MAX_BACKOFF_EXP);

		self.base_delay.saturating_mul(1 << exp).min(self.max_delay)
	}
}

/// Progress of a single fetch through its retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryState {
	pub attempt: u32,
	pub next_delay: Duration,
}
impl RetryState {
	pub fn new(policy: &RetryPolicy) -> Self {
		Self { attempt: 0, next_delay: policy.delay_for_attempt(0) }
	}

	/// Records a rate-limited attempt. Returns the delay to wait before retrying, or `None`
	/// once the budget is spent.
	pub fn on_rate_limited(&mut self, policy: &RetryPolicy) -> Option<Duration> {
		if self.attempt >= policy.max_retries {
			return None;
		}

		let delay = self.next_delay;

		self.attempt += 1;
		self.next_delay = policy.delay_for_attempt(self.attempt);

		Some(delay)
	}
}

/// Sleeps for `delay` unless `cancel` fires first.
pub(crate) async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> Result<()> {
	tokio::select! {
		biased;
		_ = cancel.cancelled() => Err(Error::Cancelled),
		_ = tokio::time::sleep(delay) => Ok(()),
	}
}

/// Single-page fetcher that retries rate-limited responses with exponential backoff.
pub struct RateLimitedFetcher {
	provider: Arc<dyn SearchProvider>,
	upstream: Upstream,
	policy: RetryPolicy,
}
impl RateLimitedFetcher {
	pub fn new(provider: Arc<dyn SearchProvider>, upstream: Upstream, policy: RetryPolicy) -> Self {
		Self { provider, upstream, policy }
	}

	pub async fn fetch(&self, query: &PageQuery, cancel: &CancellationToken) -> Result<SearchPage> {
		let mut state = RetryState::new(&self.policy);

		loop {
			let result = tokio::select! {
				biased;
				_ = cancel.cancelled() => return Err(Error::Cancelled),
				result = self.provider.search_page(&self.upstream, query) => result,
			};
			let err = match result {
				Ok(page) => return Ok(page),
				Err(err) => err,
			};

			if !err.is_rate_limited() {
				tracing::warn!(
					status = ?err.status(),
					body = err.response_body().unwrap_or_default(),
					error = %err,
					"Log search failed."
				);

				return Err(err.into());
			}

			let Some(delay) = state.on_rate_limited(&self.policy) else {
				tracing::warn!(retries = state.attempt, "Log search rate limit retries exhausted.");

				if self.policy.max_retries == 0 {
					return Err(err.into());
				}

				return Err(Error::RateLimitExceeded { retries: state.attempt });
			};

			tracing::warn!(
				attempt = state.attempt,
				delay_ms = delay.as_millis() as u64,
				"Log search was rate limited. Backing off."
			);

			sleep_or_cancel(delay, cancel).await?;
		}
	}
}
