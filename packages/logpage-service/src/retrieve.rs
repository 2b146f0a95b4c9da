use std::{sync::Arc, time::Duration};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;

use crate::{CachedPage, Error, LogService, PageFingerprint, Result};
use logpage_providers::{LogEntry, PageQuery};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogQueryRequest {
	/// Free text in the user-facing grammar. Blank matches everything.
	#[serde(default)]
	pub query: String,
	#[serde(with = "logpage_providers::time_serde")]
	pub from: OffsetDateTime,
	#[serde(with = "logpage_providers::time_serde")]
	pub to: OffsetDateTime,
	/// Falls back to the configured default when absent or zero.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub page_size: Option<u32>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cursor: Option<String>,
}
impl LogQueryRequest {
	pub fn new(query: impl Into<String>, from: OffsetDateTime, to: OffsetDateTime) -> Self {
		Self { query: query.into(), from, to, page_size: None, cursor: None }
	}

	pub fn with_page_size(mut self, page_size: u32) -> Self {
		self.page_size = Some(page_size);

		self
	}

	pub fn with_cursor(mut self, cursor: impl Into<String>) -> Self {
		self.cursor = Some(cursor.into());

		self
	}
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogPage {
	pub entries: Vec<LogEntry>,
	/// Absent on the last page.
	pub next_cursor: Option<String>,
}
impl From<&CachedPage> for LogPage {
	fn from(page: &CachedPage) -> Self {
		Self { entries: page.entries.clone(), next_cursor: page.next_cursor.clone() }
	}
}

impl LogService {
	pub async fn retrieve(&self, request: &LogQueryRequest) -> Result<LogPage> {
		self.retrieve_with_cancel(request, &CancellationToken::new()).await
	}

	pub async fn retrieve_with_cancel(
		&self,
		request: &LogQueryRequest,
		cancel: &CancellationToken,
	) -> Result<LogPage> {
		let query = self.resolve(request)?;
		let page = self.fetch_page(&query, cancel).await?;

		Ok(LogPage::from(page.as_ref()))
	}

	/// Validates the request and turns it into the upstream page query.
	pub fn resolve(&self, request: &LogQueryRequest) -> Result<PageQuery> {
		if request.from > request.to {
			return Err(Error::InvalidRequest {
				message: "from must be earlier than or equal to to.".to_string(),
			});
		}

		let limits = &self.cfg.limits;
		let page_size = match request.page_size {
			None | Some(0) => limits.default_page_size,
			Some(page_size) => page_size,
		}
		.min(limits.max_page_size);

		Ok(PageQuery {
			query: logpage_query::translate(&request.query),
			from: truncate_to_millis(request.from)?,
			to: truncate_to_millis(request.to)?,
			cursor: request.cursor.clone().filter(|cursor| !cursor.is_empty()),
			limit: page_size,
		})
	}

	/// Serves one page from the cache or, on a miss, from the upstream under a gate permit.
	pub(crate) async fn fetch_page(
		&self,
		query: &PageQuery,
		cancel: &CancellationToken,
	) -> Result<Arc<CachedPage>> {
		let fingerprint = PageFingerprint::from_query(query);

		if let Some(page) = self.cache.get(&fingerprint, self.page_ttl()) {
			tracing::debug!(
				key = fingerprint.digest(),
				entries = page.entries.len(),
				"Log page served from cache."
			);

			return Ok(page);
		}

		tracing::debug!(key = fingerprint.digest(), "Log page cache miss.");

		let permit = self.gate.acquire(cancel).await?;
		let budget = Duration::from_millis(self.cfg.limits.fetch_timeout_ms);
		let result = tokio::time::timeout(budget, self.fetcher.fetch(query, cancel)).await;

		permit.release();

		let page = match result {
			Ok(result) => result?,
			Err(_) => {
				tracing::warn!(
					key = fingerprint.digest(),
					timeout_ms = self.cfg.limits.fetch_timeout_ms,
					"Log search exceeded its time budget."
				);

				return Err(Error::Timeout { message: "Log search request timed out.".to_string() });
			},
		};

		Ok(self.cache.put(&fingerprint, page.entries, page.next_cursor))
	}
}

// The cache key carries milliseconds, so the upstream must see the same bounds.
fn truncate_to_millis(ts: OffsetDateTime) -> Result<OffsetDateTime> {
	let nanos = ts.nanosecond() / 1_000_000 * 1_000_000;

	ts.replace_nanosecond(nanos)
		.map_err(|err| Error::InvalidRequest { message: format!("Invalid timestamp: {err}.") })
}
