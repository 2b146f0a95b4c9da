pub mod entry;
pub mod search;
pub mod time_serde;

mod error;

pub use entry::{LogEntry, LogMetadata};
pub use error::{Error, Result};
pub use search::{PageQuery, SearchPage};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

/// Header names are lowercase so they can be built with `HeaderName::from_static`.
pub const API_KEY_HEADER: &str = "dd-api-key";
pub const APP_KEY_HEADER: &str = "dd-application-key";

pub fn auth_headers(
	api_key: &str,
	app_key: &str,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	let mut api_key = HeaderValue::from_str(api_key)?;
	let mut app_key = HeaderValue::from_str(app_key)?;

	api_key.set_sensitive(true);
	app_key.set_sensitive(true);
	headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);
	headers.insert(HeaderName::from_static(APP_KEY_HEADER), app_key);

	Ok(headers)
}
