use std::{
	sync::{Arc, Mutex, MutexGuard},
	time::Duration as StdDuration,
};

use ahash::AHashMap;
use time::{Duration, OffsetDateTime};
use tokio::{task::JoinHandle, time as tokio_time};
use tokio_util::sync::CancellationToken;

use crate::fingerprint::PageFingerprint;
use logpage_providers::LogEntry;

/// A fetched page. Never mutated after it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedPage {
	pub entries: Vec<LogEntry>,
	pub next_cursor: Option<String>,
	pub stored_at: OffsetDateTime,
}
impl CachedPage {
	pub fn is_expired(&self, ttl: Duration, now: OffsetDateTime) -> bool {
		now - self.stored_at > ttl
	}
}

/// In-memory page cache keyed by [`PageFingerprint::cache_key`].
///
/// Expired entries are dropped lazily on lookup or in bulk by [`PageCache::sweep_expired`].
#[derive(Debug, Default)]
pub struct PageCache {
	pages: Mutex<AHashMap<String, Arc<CachedPage>>>,
}
impl PageCache {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, fingerprint: &PageFingerprint, ttl: Duration) -> Option<Arc<CachedPage>> {
		self.get_at(fingerprint, ttl, OffsetDateTime::now_utc())
	}

	pub fn get_at(
		&self,
		fingerprint: &PageFingerprint,
		ttl: Duration,
		now: OffsetDateTime,
	) -> Option<Arc<CachedPage>> {
		let key = fingerprint.cache_key();
		let mut pages = self.lock();

		match pages.get(&key) {
			None => return None,
			Some(page) if !page.is_expired(ttl, now) => return Some(page.clone()),
			Some(_) => {},
		}

		pages.remove(&key);

		None
	}

	/// Stores a page, replacing whatever was cached under the same fingerprint.
	pub fn put(
		&self,
		fingerprint: &PageFingerprint,
		entries: Vec<LogEntry>,
		next_cursor: Option<String>,
	) -> Arc<CachedPage> {
		self.put_at(fingerprint, entries, next_cursor, OffsetDateTime::now_utc())
	}

	pub fn put_at(
		&self,
		fingerprint: &PageFingerprint,
		entries: Vec<LogEntry>,
		next_cursor: Option<String>,
		now: OffsetDateTime,
	) -> Arc<CachedPage> {
		let page = Arc::new(CachedPage { entries, next_cursor, stored_at: now });

		self.lock().insert(fingerprint.cache_key(), page.clone());

		page
	}

	/// Removes every expired entry and returns how many were dropped.
	pub fn sweep_expired(&self, ttl: Duration) -> usize {
		self.sweep_expired_at(ttl, OffsetDateTime::now_utc())
	}

	pub fn sweep_expired_at(&self, ttl: Duration, now: OffsetDateTime) -> usize {
		let mut pages = self.lock();
		let before = pages.len();

		pages.retain(|_, page| !page.is_expired(ttl, now));

		before - pages.len()
	}

	pub fn len(&self) -> usize {
		self.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.lock().is_empty()
	}

	pub fn clear(&self) {
		self.lock().clear();
	}

	fn lock(&self) -> MutexGuard<'_, AHashMap<String, Arc<CachedPage>>> {
		self.pages.lock().unwrap_or_else(|err| err.into_inner())
	}
}

/// Sweeps `cache` every `interval` until `cancel` fires.
pub fn spawn_sweeper(
	cache: Arc<PageCache>,
	ttl: Duration,
	interval: StdDuration,
	cancel: CancellationToken,
) -> JoinHandle<()> {
	tokio::spawn(async move {
		let mut ticker = tokio_time::interval(interval);

		ticker.set_missed_tick_behavior(tokio_time::MissedTickBehavior::Delay);
		// The first tick completes immediately.
		ticker.tick().await;

		loop {
			tokio::select! {
				_ = cancel.cancelled() => break,
				_ = ticker.tick() => {
					let count = cache.sweep_expired(ttl);

					if count > 0 {
						tracing::info!(count, "Swept expired log pages.");
					}
				},
			}
		}
	})
}
