use time::OffsetDateTime;

use logpage_providers::PageQuery;

pub const CACHE_NAMESPACE: &str = "logs";
pub const FIRST_PAGE: &str = "first";

/// Identity of one cached page. Equal fingerprints are interchangeable within the page TTL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageFingerprint {
	query: String,
	from_ms: i64,
	to_ms: i64,
	cursor: Option<String>,
	page_size: u32,
}
impl PageFingerprint {
	pub fn new(
		translated_query: &str,
		from: OffsetDateTime,
		to: OffsetDateTime,
		cursor: Option<&str>,
		page_size: u32,
	) -> Self {
		Self {
			query: translated_query.to_string(),
			from_ms: unix_millis(from),
			to_ms: unix_millis(to),
			cursor: cursor.filter(|cursor| !cursor.is_empty()).map(str::to_string),
			page_size,
		}
	}

	pub fn from_query(query: &PageQuery) -> Self {
		Self::new(&query.query, query.from, query.to, query.cursor.as_deref(), query.limit)
	}

	/// `logs:<query>:<fromMillis>:<toMillis>:<cursorOrFirst>:<pageSize>`.
	///
	/// `\` and `:` inside the query and cursor are backslash-escaped, and a cursor that would
	/// otherwise render as the first-page sentinel is written `\first`, so distinct
	/// fingerprints never share a key.
	pub fn cache_key(&self) -> String {
		let cursor = match self.cursor.as_deref() {
			None => FIRST_PAGE.to_string(),
			Some(cursor) => {
				let escaped = escape_component(cursor);

				if escaped == FIRST_PAGE { format!("\\{escaped}") } else { escaped }
			},
		};

		format!(
			"{CACHE_NAMESPACE}:{}:{}:{}:{cursor}:{}",
			escape_component(&self.query),
			self.from_ms,
			self.to_ms,
			self.page_size
		)
	}

	/// Short digest of the cache key, safe to log without exposing query text.
	pub fn digest(&self) -> String {
		let hash = blake3::hash(self.cache_key().as_bytes()).to_hex().to_string();

		hash[..12].to_string()
	}
}

pub(crate) fn unix_millis(ts: OffsetDateTime) -> i64 {
	(ts.unix_timestamp_nanos() / 1_000_000) as i64
}

fn escape_component(raw: &str) -> String {
	let mut out = String::with_capacity(raw.len());

	for ch in raw.chars() {
		if matches!(ch, '\\' | ':') {
			out.push('\\');
		}

		out.push(ch);
	}

	out
}
