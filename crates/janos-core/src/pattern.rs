//! The glob subset shared by every stage (collections, permalinks, excerpts,
//! asset copying, …), per §4.3:
//!
//! - `*` matches within a path segment, never across `/`.
//! - `?` matches exactly one non-slash character.
//! - `**/` matches zero or more whole directory segments.
//! - a trailing `**` matches anything remaining.
//! - matching is full-string anchored; no brace expansion, no character
//!   classes.
//!
//! Implemented as a small recursive matcher over path segments rather than a
//! translation to `regex`, since the grammar is a strict subset and a direct
//! matcher is easier to keep provably anchored.

/// Normalize a path to forward slashes, as §4.3 requires before matching.
pub fn normalize(path: &str) -> String {
    path.replace('\\', "/")
}

/// Return `true` if `path` (already forward-slash form is not required; it
/// is normalized internally) matches `pattern`.
pub fn matches(pattern: &str, path: &str) -> bool {
    let pattern = normalize(pattern);
    let path = normalize(path);
    let pattern_segs: Vec<&str> = pattern.split('/').collect();
    let path_segs: Vec<&str> = path.split('/').collect();
    match_segments(&pattern_segs, &path_segs)
}

fn match_segments(pattern: &[&str], path: &[&str]) -> bool {
    match pattern.first() {
        None => path.is_empty(),
        Some(&"**") => {
            // Trailing `**` (or `**/` represented as a lone segment when
            // followed by nothing) matches anything remaining, including
            // zero segments.
            if pattern.len() == 1 {
                return true;
            }
            // `**/` mid-pattern: zero-or-more whole segments, then the rest.
            for skip in 0..=path.len() {
                if match_segments(&pattern[1..], &path[skip..]) {
                    return true;
                }
            }
            false
        }
        Some(seg) => {
            let Some((first, rest)) = path.split_first() else {
                return false;
            };
            segment_matches(seg, first) && match_segments(&pattern[1..], rest)
        }
    }
}

/// Match a single path segment against a single pattern segment containing
/// `*`/`?` wildcards (never `/`).
fn segment_matches(pattern: &str, segment: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let s: Vec<char> = segment.chars().collect();
    segment_matches_at(&p, &s)
}

fn segment_matches_at(pattern: &[char], segment: &[char]) -> bool {
    match pattern.first() {
        None => segment.is_empty(),
        Some('*') => {
            for skip in 0..=segment.len() {
                if segment_matches_at(&pattern[1..], &segment[skip..]) {
                    return true;
                }
            }
            false
        }
        Some('?') => {
            !segment.is_empty() && segment_matches_at(&pattern[1..], &segment[1..])
        }
        Some(c) => {
            segment.first() == Some(c) && segment_matches_at(&pattern[1..], &segment[1..])
        }
    }
}

/// Match against any of a list of glob patterns.
pub fn matches_any<'a>(patterns: impl IntoIterator<Item = &'a str>, path: &str) -> bool {
    patterns.into_iter().any(|p| matches(p, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn star_does_not_cross_segment_boundary() {
        assert!(matches("*.html", "index.html"));
        assert!(!matches("*.html", "blog/index.html"));
    }

    #[test]
    fn double_star_slash_matches_zero_or_more_segments() {
        assert!(matches("**/*.html", "index.html"));
        assert!(matches("**/*.html", "blog/a/b/index.html"));
    }

    #[test]
    fn trailing_double_star_matches_anything_remaining() {
        assert!(matches("assets/**", "assets/css/site.css"));
        assert!(matches("assets/**", "assets"));
    }

    #[test]
    fn question_mark_matches_single_char() {
        assert!(matches("post-?.md", "post-1.md"));
        assert!(!matches("post-?.md", "post-10.md"));
    }

    #[test]
    fn full_string_anchored() {
        assert!(!matches("*.md", "notes.md.bak"));
    }
}
