use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::{Error, Result, entry::RawRecord};
use logpage_config::Upstream;

pub use crate::entry::LogEntry;

/// Largest page the search endpoint accepts.
pub const MAX_PAGE_LIMIT: u32 = 1_000;
pub const SORT_BY_TIMESTAMP: &str = "timestamp";

const MAX_ERROR_BODY_CHARS: usize = 1_024;

/// One page request in the upstream grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
	pub query: String,
	pub from: OffsetDateTime,
	pub to: OffsetDateTime,
	/// Continuation token from the previous page. `None` requests the first page.
	pub cursor: Option<String>,
	pub limit: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
	pub entries: Vec<LogEntry>,
	/// `None` when this is the last page.
	pub next_cursor: Option<String>,
}

#[derive(Debug, Serialize)]
struct SearchBody<'a> {
	filter: SearchFilter<'a>,
	sort: &'static str,
	page: SearchPageParams<'a>,
}

#[derive(Debug, Serialize)]
struct SearchFilter<'a> {
	query: &'a str,
	#[serde(with = "crate::time_serde")]
	from: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	to: OffsetDateTime,
}

#[derive(Debug, Serialize)]
struct SearchPageParams<'a> {
	limit: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	cursor: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
	data: Vec<RawRecord>,
	#[serde(default)]
	meta: Option<ResponseMeta>,
}

#[derive(Debug, Deserialize)]
struct ResponseMeta {
	#[serde(default)]
	page: Option<ResponsePage>,
}

#[derive(Debug, Deserialize)]
struct ResponsePage {
	#[serde(default)]
	after: Option<String>,
}

/// Sends exactly one search request. Retrying is left to the caller.
pub async fn search_page(client: &Client, cfg: &Upstream, query: &PageQuery) -> Result<SearchPage> {
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = build_search_body(query)?;
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.app_key, &cfg.default_headers)?)
		.timeout(Duration::from_millis(cfg.timeout_ms))
		.json(&body)
		.send()
		.await?;
	let status = res.status();

	if !status.is_success() {
		let text = res.text().await.unwrap_or_default();

		return Err(classify_status(status.as_u16(), truncate_body(&text)));
	}

	let raw = res.bytes().await?;

	parse_search_response(&raw)
}

pub fn build_search_body(query: &PageQuery) -> Result<Value> {
	let cursor = query.cursor.as_deref().filter(|cursor| !cursor.is_empty());
	let body = SearchBody {
		filter: SearchFilter { query: &query.query, from: query.from, to: query.to },
		sort: SORT_BY_TIMESTAMP,
		page: SearchPageParams { limit: query.limit.clamp(1, MAX_PAGE_LIMIT), cursor },
	};

	Ok(serde_json::to_value(body)?)
}

pub fn classify_status(status: u16, body: String) -> Error {
	match status {
		401 => Error::Authentication { status, body },
		403 => Error::Permission { status, body },
		429 => Error::RateLimited { status, body },
		408 => Error::Timeout { status: Some(status) },
		500..=599 => Error::UpstreamServer { status, body },
		_ => Error::Request { status, body },
	}
}

pub fn parse_search_response(raw: &[u8]) -> Result<SearchPage> {
	let response: SearchResponse = serde_json::from_slice(raw)
		.map_err(|err| Error::MalformedResponse { message: err.to_string() })?;
	let next_cursor = response
		.meta
		.and_then(|meta| meta.page)
		.and_then(|page| page.after)
		.filter(|after| !after.is_empty());
	let entries =
		response.data.into_iter().map(LogEntry::from_record).collect::<Result<Vec<_>>>()?;

	Ok(SearchPage { entries, next_cursor })
}

fn truncate_body(text: &str) -> String {
	if text.chars().count() <= MAX_ERROR_BODY_CHARS {
		return text.to_string();
	}

	let mut out: String = text.chars().take(MAX_ERROR_BODY_CHARS).collect();

	out.push_str("...");

	out
}
