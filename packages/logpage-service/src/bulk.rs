use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{LogQueryRequest, LogService, Result, fetcher};
use logpage_providers::LogEntry;

/// Several consecutive pages fetched in one call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkPage {
	pub entries: Vec<LogEntry>,
	pub pages: u32,
	/// Cursor to resume from. Absent once the upstream has no more pages.
	pub next_cursor: Option<String>,
	/// The run stopped early because the upstream kept rate limiting.
	pub rate_limited: bool,
}

impl LogService {
	pub async fn retrieve_bulk(&self, request: &LogQueryRequest) -> Result<BulkPage> {
		self.retrieve_bulk_with_cancel(request, &CancellationToken::new()).await
	}

	/// Follows cursors from `request` until the page or entry budget is spent, the upstream runs
	/// out of pages, or rate limiting stops the run. A rate limit returns what was collected so
	/// far instead of an error.
	///
	/// Each page asks for at most the entries left in the budget. Pages are never split, so
	/// resuming from `next_cursor` picks up exactly where the returned entries end.
	pub async fn retrieve_bulk_with_cancel(
		&self,
		request: &LogQueryRequest,
		cancel: &CancellationToken,
	) -> Result<BulkPage> {
		let cfg = &self.cfg.bulk;
		let max_entries = cfg.max_entries as usize;
		let max_delay = Duration::from_millis(cfg.max_inter_page_delay_ms);
		let mut delay = Duration::from_millis(cfg.inter_page_delay_ms);
		let mut query = self.resolve(request)?;
		let page_size = query.limit;
		let mut out = BulkPage { next_cursor: query.cursor.clone(), ..Default::default() };

		while out.pages < cfg.max_pages {
			let remaining = max_entries.saturating_sub(out.entries.len());

			if remaining == 0 {
				break;
			}
			if out.pages > 0 {
				fetcher::sleep_or_cancel(delay, cancel).await?;

				delay = delay.saturating_mul(2).min(max_delay);
			}

			query.limit = page_size.min(u32::try_from(remaining).unwrap_or(u32::MAX));

			let page = match self.fetch_page(&query, cancel).await {
				Ok(page) => page,
				Err(err) if err.is_rate_limit() => {
					tracing::warn!(
						pages = out.pages,
						entries = out.entries.len(),
						"Bulk log retrieval stopped by rate limiting."
					);

					out.rate_limited = true;

					break;
				},
				Err(err) => return Err(err),
			};

			// `next_cursor` still points at this page, so none of it is skipped.
			if page.entries.len() > remaining {
				tracing::debug!(
					returned = page.entries.len(),
					remaining,
					"Bulk log page exceeds the entry budget."
				);

				break;
			}

			out.pages += 1;
			out.entries.extend(page.entries.iter().cloned());
			out.next_cursor = page.next_cursor.clone();

			match page.next_cursor.as_ref() {
				Some(cursor) => query.cursor = Some(cursor.clone()),
				None => break,
			}
		}

		tracing::info!(
			pages = out.pages,
			entries = out.entries.len(),
			rate_limited = out.rate_limited,
			"Bulk log retrieval finished."
		);

		Ok(out)
	}
}
