//! The one slug rule shared by tags (§4.6), permalinks (§4.8), and the
//! `slug` template filter (§9): lowercase, NFD diacritic-stripped, non-word
//! runs collapsed to a single hyphen, leading/trailing hyphens trimmed.
//!
//! `deunicode` stands in for a hand-rolled NFD table — it transliterates
//! accented and non-Latin characters to their closest ASCII form, which is
//! what diacritic-stripping amounts to in practice for the common case.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Slug a string per the rule above. Idempotent: `slug(slug(x)) == slug(x)`.
pub fn slug(input: &str) -> String {
    let transliterated = deunicode::deunicode(input);
    let lower = transliterated.to_lowercase();
    let collapsed = NON_WORD_RUN.replace_all(&lower, "-");
    collapsed.trim_matches('-').to_string()
}
