mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Bulk, Cache, Config, DEFAULT_SEARCH_PATH, Limits, Retry, Service, Upstream};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::validation("service.http_bind", "must be non-empty."));
	}
	if cfg.upstream.api_base.trim().is_empty() {
		return Err(Error::validation("upstream.api_base", "must be non-empty."));
	}
	if !cfg.upstream.path.starts_with('/') {
		return Err(Error::validation("upstream.path", "must start with '/'."));
	}

	for (field, key) in
		[("upstream.api_key", &cfg.upstream.api_key), ("upstream.app_key", &cfg.upstream.app_key)]
	{
		if key.trim().is_empty() {
			return Err(Error::validation(field, "must be non-empty."));
		}
	}
	for (key, value) in &cfg.upstream.default_headers {
		if !value.is_string() {
			return Err(Error::validation(
				"upstream.default_headers",
				format!("value for {key} must be a string."),
			));
		}
	}

	if cfg.upstream.timeout_ms == 0 {
		return Err(Error::validation("upstream.timeout_ms", "must be greater than zero."));
	}
	if cfg.retry.base_delay_ms == 0 {
		return Err(Error::validation("retry.base_delay_ms", "must be greater than zero."));
	}
	if cfg.retry.base_delay_ms > cfg.retry.max_delay_ms {
		return Err(Error::validation(
			"retry.base_delay_ms",
			"must be less than or equal to retry.max_delay_ms.",
		));
	}
	if cfg.limits.max_concurrent_requests == 0 {
		return Err(Error::validation(
			"limits.max_concurrent_requests",
			"must be greater than zero.",
		));
	}
	if cfg.limits.default_page_size == 0 {
		return Err(Error::validation("limits.default_page_size", "must be greater than zero."));
	}
	if cfg.limits.default_page_size > cfg.limits.max_page_size {
		return Err(Error::validation(
			"limits.default_page_size",
			"must be less than or equal to limits.max_page_size.",
		));
	}
	if cfg.limits.fetch_timeout_ms == 0 {
		return Err(Error::validation("limits.fetch_timeout_ms", "must be greater than zero."));
	}
	if cfg.cache.page_ttl_ms == 0 {
		return Err(Error::validation("cache.page_ttl_ms", "must be greater than zero."));
	}
	if cfg.cache.sweep_interval_ms == 0 {
		return Err(Error::validation("cache.sweep_interval_ms", "must be greater than zero."));
	}
	if cfg.bulk.max_pages == 0 {
		return Err(Error::validation("bulk.max_pages", "must be greater than zero."));
	}
	if cfg.bulk.max_entries == 0 {
		return Err(Error::validation("bulk.max_entries", "must be greater than zero."));
	}
	if cfg.bulk.inter_page_delay_ms > cfg.bulk.max_inter_page_delay_ms {
		return Err(Error::validation(
			"bulk.inter_page_delay_ms",
			"must be less than or equal to bulk.max_inter_page_delay_ms.",
		));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}

	let trimmed = cfg.upstream.api_base.trim().trim_end_matches('/');

	if trimmed.len() != cfg.upstream.api_base.len() {
		cfg.upstream.api_base = trimmed.to_string();
	}
}
