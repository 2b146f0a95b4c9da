use std::sync::LazyLock;

use regex::Regex;

use crate::{operator, segment};

/// Reserved attributes are addressed without the custom-attribute marker.
pub const RESERVED_FACETS: [&str; 5] = ["host", "service", "source", "status", "trace_id"];
/// Custom attributes must carry the `@` marker.
pub const CUSTOM_FACETS: [&str; 6] =
	["env", "environment", "version", "container_id", "container_name", "image_name"];
pub const CUSTOM_ATTRIBUTE_MARKER: char = '@';

static FACET_KEY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(-?)(@?)([A-Za-z_][A-Za-z0-9_.\-]*):").expect("Facet key pattern must compile.")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FacetKind {
	Reserved,
	Custom,
	Other,
}

pub fn classify(key: &str) -> FacetKind {
	let key = key.strip_prefix(CUSTOM_ATTRIBUTE_MARKER).unwrap_or(key);

	if RESERVED_FACETS.contains(&key) {
		FacetKind::Reserved
	} else if CUSTOM_FACETS.contains(&key) {
		FacetKind::Custom
	} else {
		FacetKind::Other
	}
}

/// Canonical spelling of a facet key: reserved keys drop `@`, custom keys gain it.
pub fn canonical_key(key: &str) -> String {
	let bare = key.strip_prefix(CUSTOM_ATTRIBUTE_MARKER).unwrap_or(key);

	match classify(bare) {
		FacetKind::Reserved => bare.to_string(),
		FacetKind::Custom => format!("{CUSTOM_ATTRIBUTE_MARKER}{bare}"),
		FacetKind::Other => key.to_string(),
	}
}

/// Rewrites facet keys to their canonical form and quotes multi-word values.
pub fn normalize_facets(input: &str) -> String {
	let mut out = String::with_capacity(input.len() + 8);
	let mut depth = 0usize;
	let mut pos = 0;

	while let Some(ch) = input[pos..].chars().next() {
		match ch {
			'"' => {
				let end = segment::quoted_end(input, pos);

				out.push_str(&input[pos..end]);

				pos = end;

				continue;
			},
			'(' => depth += 1,
			')' => depth = depth.saturating_sub(1),
			_ => {},
		}

		if at_token_start(input, pos)
			&& let Some(caps) = FACET_KEY.captures(&input[pos..])
		{
			let matched = caps.get(0).map(|m| m.len()).unwrap_or_default();
			let key = format!("{}{}", &caps[2], &caps[3]);

			out.push_str(&caps[1]);
			out.push_str(&canonical_key(&key));
			out.push(':');

			pos = push_value(input, pos + matched, depth, &mut out);

			continue;
		}

		out.push(ch);

		pos += ch.len_utf8();
	}

	out
}

fn at_token_start(input: &str, pos: usize) -> bool {
	match input[..pos].chars().next_back() {
		None => true,
		Some(prev) => prev.is_whitespace() || prev == '(',
	}
}

// Copies the value starting at `start` and returns the offset just past it.
fn push_value(input: &str, start: usize, depth: usize, out: &mut String) -> usize {
	let Some(first) = input[start..].chars().next() else {
		return start;
	};

	match first {
		'"' => {
			let end = segment::quoted_end(input, start);

			out.push_str(&input[start..end]);

			return end;
		},
		'(' | '[' | '{' => {
			let end = segment::group_end(input, start);

			out.push_str(&input[start..end]);

			return end;
		},
		_ if first.is_whitespace() => return start,
		_ => {},
	}

	if depth > 0 {
		let end = input[start..]
			.find(|ch: char| ch.is_whitespace() || ch == ')')
			.map(|offset| start + offset)
			.unwrap_or(input.len());

		out.push_str(&input[start..end]);

		return end;
	}

	let mut end = word_end(input, start);

	loop {
		let next = skip_whitespace(input, end);

		if next == input.len() {
			break;
		}

		let next_end = word_end(input, next);

		if is_value_boundary(&input[next..next_end]) {
			break;
		}

		end = next_end;
	}

	let value = &input[start..end];

	if value.contains('"') || !parens_balanced(value) || !needs_quotes(value) {
		out.push_str(value);
	} else {
		out.push('"');
		out.push_str(value);
		out.push('"');
	}

	end
}

fn word_end(input: &str, start: usize) -> usize {
	input[start..].find(char::is_whitespace).map(|offset| start + offset).unwrap_or(input.len())
}

fn skip_whitespace(input: &str, start: usize) -> usize {
	input[start..]
		.find(|ch: char| !ch.is_whitespace())
		.map(|offset| start + offset)
		.unwrap_or(input.len())
}

fn is_value_boundary(word: &str) -> bool {
	operator::is_operator(word)
		|| word.starts_with(['-', '(', ')'])
		|| word.contains(['"', '(', ')'])
		|| FACET_KEY.is_match(word)
}

fn needs_quotes(value: &str) -> bool {
	value.contains(|ch: char| ch.is_whitespace() || matches!(ch, '(' | ')' | '[' | ']' | '{' | '}'))
}

fn parens_balanced(value: &str) -> bool {
	let mut depth = 0i32;

	for ch in value.chars() {
		match ch {
			'(' => depth += 1,
			')' => {
				depth -= 1;

				if depth < 0 {
					return false;
				}
			},
			_ => {},
		}
	}

	depth == 0
}
