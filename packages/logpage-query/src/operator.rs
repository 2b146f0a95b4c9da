use crate::segment;

pub const OPERATORS: [&str; 3] = ["AND", "OR", "NOT"];

pub fn is_operator(token: &str) -> bool {
	OPERATORS.iter().any(|op| token.eq_ignore_ascii_case(op))
}

/// Upper-cases standalone boolean keywords outside quoted phrases.
///
/// A keyword only counts when it is delimited by whitespace, parentheses, or the edges of the
/// text, so words such as `android` or `service:order` are left as they are.
pub fn uppercase_operators(input: &str) -> String {
	segment::map_bare(input, uppercase_segment)
}

fn uppercase_segment(text: &str) -> String {
	let mut out = String::with_capacity(text.len());
	let mut token_start = None;

	for (idx, ch) in text.char_indices() {
		if ch.is_whitespace() || ch == '(' || ch == ')' {
			if let Some(start) = token_start.take() {
				push_token(&mut out, &text[start..idx]);
			}

			out.push(ch);
		} else if token_start.is_none() {
			token_start = Some(idx);
		}
	}

	if let Some(start) = token_start {
		push_token(&mut out, &text[start..]);
	}

	out
}

fn push_token(out: &mut String, token: &str) {
	match OPERATORS.iter().find(|op| token.eq_ignore_ascii_case(op)) {
		Some(op) => out.push_str(op),
		None => out.push_str(token),
	}
}
