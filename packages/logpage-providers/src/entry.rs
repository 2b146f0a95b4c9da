use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::{Error, Result};

pub const UNKNOWN_LEVEL: &str = "UNKNOWN";

/// One normalized log record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
	pub id: String,
	#[serde(with = "crate::time_serde")]
	pub timestamp: OffsetDateTime,
	pub body: String,
	pub level: String,
	pub metadata: LogMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogMetadata {
	pub service: Option<String>,
	pub source: Option<String>,
	pub host: Option<String>,
	pub environment: Option<String>,
	pub version: Option<String>,
	/// `key:value` tags split on the first colon. Bare tags map to an empty value and repeated
	/// keys keep every value, comma separated, in arrival order.
	pub tags: BTreeMap<String, String>,
	pub attributes: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRecord {
	pub(crate) id: String,
	#[serde(default)]
	pub(crate) attributes: RawAttributes,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawAttributes {
	timestamp: Option<String>,
	message: Option<String>,
	status: Option<String>,
	service: Option<String>,
	source: Option<String>,
	host: Option<String>,
	#[serde(default)]
	tags: Vec<String>,
	#[serde(default)]
	attributes: Map<String, Value>,
	#[serde(flatten)]
	extra: Map<String, Value>,
}

impl LogEntry {
	pub(crate) fn from_record(record: RawRecord) -> Result<Self> {
		let RawRecord { id, attributes: raw } = record;
		let timestamp = raw.timestamp.as_deref().ok_or_else(|| Error::MalformedResponse {
			message: format!("Record {id} is missing a timestamp."),
		})?;
		let timestamp = crate::time_serde::parse(timestamp).map_err(|err| {
			Error::MalformedResponse { message: format!("Record {id} has an invalid timestamp: {err}.") }
		})?;
		let tags = parse_tags(&raw.tags);
		let mut attributes = raw.attributes;

		for (key, value) in raw.extra {
			attributes.entry(key).or_insert(value);
		}

		let environment = string_attribute(&attributes, &["env", "environment"])
			.or_else(|| tags.get("env").filter(|value| !value.is_empty()).cloned());
		let version = string_attribute(&attributes, &["version"])
			.or_else(|| tags.get("version").filter(|value| !value.is_empty()).cloned());
		let entry = Self {
			id,
			timestamp,
			body: raw.message.unwrap_or_default(),
			level: raw.status.unwrap_or_default(),
			metadata: LogMetadata {
				service: non_empty(raw.service),
				source: non_empty(raw.source),
				host: non_empty(raw.host),
				environment,
				version,
				tags,
				attributes,
			},
		};

		Ok(entry.sanitized())
	}

	/// Trims the body and upper-cases the level, defaulting it to [`UNKNOWN_LEVEL`].
	pub fn sanitized(mut self) -> Self {
		let body = self.body.trim();

		if body.len() != self.body.len() {
			self.body = body.to_string();
		}

		let level = self.level.trim();

		self.level = if level.is_empty() { UNKNOWN_LEVEL.to_string() } else { level.to_uppercase() };

		self
	}
}

fn parse_tags(raw: &[String]) -> BTreeMap<String, String> {
	let mut tags: BTreeMap<String, String> = BTreeMap::new();

	for tag in raw {
		let tag = tag.trim();

		if tag.is_empty() {
			continue;
		}

		let (key, value) = tag.split_once(':').unwrap_or((tag, ""));

		tags.entry(key.to_string())
			.and_modify(|existing| {
				if !value.is_empty() {
					if !existing.is_empty() {
						existing.push(',');
					}

					existing.push_str(value);
				}
			})
			.or_insert_with(|| value.to_string());
	}

	tags
}

fn string_attribute(attributes: &Map<String, Value>, keys: &[&str]) -> Option<String> {
	keys.iter()
		.filter_map(|key| attributes.get(*key).and_then(Value::as_str))
		.map(str::trim)
		.find(|value| !value.is_empty())
		.map(str::to_string)
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|value| !value.trim().is_empty())
}
