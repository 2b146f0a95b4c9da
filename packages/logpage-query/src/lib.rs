//! Normalizes free-text log searches into the upstream search grammar.
//!
//! [`translate`] runs a fixed pipeline of pure string rewrites. Each stage is public so it can be
//! exercised on its own:
//!
//! 1. [`default_empty`]
//! 2. [`normalize_facets`]
//! 3. [`alias_levels`]
//! 4. [`uppercase_operators`]
//! 5. [`collapse_wildcards`]
//! 6. [`collapse_whitespace`]
//!
//! Translation never fails. Text the pipeline does not understand is passed through.

pub mod facet;
pub mod level;
pub mod operator;
pub mod wildcard;

mod segment;

pub use facet::{FacetKind, classify, normalize_facets};
pub use level::alias_levels;
pub use operator::uppercase_operators;
pub use wildcard::collapse_wildcards;

/// Matches every record.
pub const MATCH_ALL: &str = "*";

pub fn translate(raw: &str) -> String {
	let query = default_empty(raw);
	let query = normalize_facets(&query);
	let query = alias_levels(&query);
	let query = uppercase_operators(&query);
	let query = collapse_wildcards(&query);

	collapse_whitespace(&query)
}

pub fn default_empty(raw: &str) -> String {
	if raw.trim().is_empty() { MATCH_ALL.to_string() } else { raw.to_string() }
}

/// Collapses whitespace runs outside quoted phrases to one space and trims both ends.
pub fn collapse_whitespace(input: &str) -> String {
	let collapsed = segment::map_bare(input, |text| {
		let mut out = String::with_capacity(text.len());
		let mut in_space = false;

		for ch in text.chars() {
			if ch.is_whitespace() {
				if !in_space {
					out.push(' ');
				}

				in_space = true;
			} else {
				out.push(ch);

				in_space = false;
			}
		}

		out
	});

	collapsed.trim().to_string()
}
