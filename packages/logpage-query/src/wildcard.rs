use crate::segment;

/// Collapses `term**` to `term*`. Quoted phrases and negated terms are left untouched.
pub fn collapse_wildcards(input: &str) -> String {
	segment::map_bare(input, |text| segment::map_words(text, collapse_word))
}

fn collapse_word(word: &str) -> String {
	if word.trim_start_matches('(').starts_with('-') {
		return word.to_string();
	}

	let without_closers = word.trim_end_matches(')');
	let term = without_closers.trim_end_matches('*');
	let stars = without_closers.len() - term.len();

	if stars < 2 || term.is_empty() {
		return word.to_string();
	}

	format!("{term}*{}", &word[without_closers.len()..])
}
