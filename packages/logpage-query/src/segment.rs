//! Quote-aware splitting shared by the rewriting stages.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
	/// Text outside double quotes.
	Bare(&'a str),
	/// A double-quoted phrase, quotes included. An unterminated quote runs to the end.
	Quoted(&'a str),
}

/// Returns the byte offset just past the quote that closes the phrase opened at `start`.
pub(crate) fn quoted_end(input: &str, start: usize) -> usize {
	let bytes = input.as_bytes();
	let mut idx = start + 1;

	while idx < bytes.len() {
		match bytes[idx] {
			b'\\' => idx += 2,
			b'"' => return idx + 1,
			_ => idx += 1,
		}
	}

	input.len()
}

/// Returns the byte offset just past the bracket that closes the group opened at `start`.
pub(crate) fn group_end(input: &str, start: usize) -> usize {
	let bytes = input.as_bytes();
	let mut depth = 0usize;
	let mut idx = start;

	while idx < bytes.len() {
		match bytes[idx] {
			b'"' => {
				idx = quoted_end(input, idx);

				continue;
			},
			b'(' | b'[' | b'{' => depth += 1,
			b')' | b']' | b'}' => {
				depth = depth.saturating_sub(1);

				if depth == 0 {
					return idx + 1;
				}
			},
			_ => {},
		}

		idx += 1;
	}

	input.len()
}

pub(crate) fn segments(input: &str) -> Vec<Segment<'_>> {
	let mut out = Vec::new();
	let mut bare_start = 0;
	let mut idx = 0;

	while let Some(offset) = input[idx..].find('"') {
		let quote_start = idx + offset;

		if quote_start > bare_start {
			out.push(Segment::Bare(&input[bare_start..quote_start]));
		}

		let quote_end = quoted_end(input, quote_start);

		out.push(Segment::Quoted(&input[quote_start..quote_end]));

		bare_start = quote_end;
		idx = quote_end;
	}

	if bare_start < input.len() {
		out.push(Segment::Bare(&input[bare_start..]));
	}

	out
}

/// Rewrites every bare segment with `f` and copies quoted phrases verbatim.
pub(crate) fn map_bare<F>(input: &str, mut f: F) -> String
where
	F: FnMut(&str) -> String,
{
	let mut out = String::with_capacity(input.len());

	for segment in segments(input) {
		match segment {
			Segment::Bare(text) => out.push_str(&f(text)),
			Segment::Quoted(text) => out.push_str(text),
		}
	}

	out
}

/// Rewrites each whitespace-delimited word with `f`, keeping the whitespace between words.
pub(crate) fn map_words<F>(text: &str, mut f: F) -> String
where
	F: FnMut(&str) -> String,
{
	let mut out = String::with_capacity(text.len());
	let mut word_start = None;

	for (idx, ch) in text.char_indices() {
		if ch.is_whitespace() {
			if let Some(start) = word_start.take() {
				out.push_str(&f(&text[start..idx]));
			}

			out.push(ch);
		} else if word_start.is_none() {
			word_start = Some(idx);
		}
	}

	if let Some(start) = word_start {
		out.push_str(&f(&text[start..]));
	}

	out
}
