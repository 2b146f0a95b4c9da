use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::segment;

pub const SEVERITY_ATTRIBUTE: &str = "status";

static LEGACY_LEVEL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(^|[\s(\-])@?(?i:level):").expect("Legacy level pattern must compile.")
});
static STATUS_VALUE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(^|[\s(\-])(status:)((?i:debug|info|warning|warn|error|fatal|trace))\b")
		.expect("Status value pattern must compile.")
});
static STATUS_GROUP: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(^|[\s(\-])(status:)\(([^()]*)\)").expect("Status group pattern must compile.")
});
static SEVERITY_WORD: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"\b(?i:debug|info|warning|warn|error|fatal|trace)\b")
		.expect("Severity word pattern must compile.")
});

/// Renames the legacy `level` facet to `status` and upper-cases severity values.
pub fn alias_levels(input: &str) -> String {
	segment::map_bare(input, |text| {
		let renamed = LEGACY_LEVEL.replace_all(text, format!("${{1}}{SEVERITY_ATTRIBUTE}:"));
		let grouped = STATUS_GROUP.replace_all(&renamed, |caps: &Captures<'_>| {
			let inner =
				SEVERITY_WORD.replace_all(&caps[3], |word: &Captures<'_>| word[0].to_uppercase());

			format!("{}{}({inner})", &caps[1], &caps[2])
		});

		STATUS_VALUE
			.replace_all(&grouped, |caps: &Captures<'_>| {
				format!("{}{}{}", &caps[1], &caps[2], caps[3].to_uppercase())
			})
			.into_owned()
	})
}
