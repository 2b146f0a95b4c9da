use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_SEARCH_PATH: &str = "/api/v2/logs/events/search";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub upstream: Upstream,
	#[serde(default)]
	pub retry: Retry,
	#[serde(default)]
	pub limits: Limits,
	#[serde(default)]
	pub cache: Cache,
	#[serde(default)]
	pub bulk: Bulk,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

/// Connection settings for the log-search service.
#[derive(Debug, Clone, Deserialize)]
pub struct Upstream {
	pub api_base: String,
	#[serde(default = "default_search_path")]
	pub path: String,
	pub api_key: String,
	pub app_key: String,
	/// Per-request HTTP timeout.
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Backoff applied to rate-limited responses only.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Retry {
	pub max_retries: u32,
	pub base_delay_ms: u64,
	pub max_delay_ms: u64,
}
impl Default for Retry {
	fn default() -> Self {
		Self { max_retries: 2, base_delay_ms: 2_000, max_delay_ms: 15_000 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Limits {
	pub max_concurrent_requests: u32,
	pub default_page_size: u32,
	pub max_page_size: u32,
	/// Budget for one fetch including every retry and backoff wait.
	pub fetch_timeout_ms: u64,
}
impl Default for Limits {
	fn default() -> Self {
		Self {
			max_concurrent_requests: 5,
			default_page_size: 100,
			max_page_size: 1_000,
			fetch_timeout_ms: 30_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Cache {
	pub page_ttl_ms: u64,
	pub sweep_interval_ms: u64,
}
impl Default for Cache {
	fn default() -> Self {
		Self { page_ttl_ms: 30_000, sweep_interval_ms: 60_000 }
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Bulk {
	pub max_pages: u32,
	pub max_entries: u32,
	pub inter_page_delay_ms: u64,
	pub max_inter_page_delay_ms: u64,
}
impl Default for Bulk {
	fn default() -> Self {
		Self {
			max_pages: 5,
			max_entries: 5_000,
			inter_page_delay_ms: 250,
			max_inter_page_delay_ms: 2_000,
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_search_path() -> String {
	DEFAULT_SEARCH_PATH.to_string()
}

fn default_timeout_ms() -> u64 {
	30_000
}
