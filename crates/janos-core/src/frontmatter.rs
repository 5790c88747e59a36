//! Frontmatter decoding, per §4.2: split a leading `---`-delimited YAML-subset
//! block from the body, parse it with a YAML engine (`#`-prefixed comment
//! lines inside the block are stripped before parsing), and normalize the
//! parsed tree into [`Value`].

use crate::error::FrontmatterError;
use crate::value::{Metadata, Value};

/// The result of splitting and parsing a file's leading metadata block.
pub struct Decoded {
    /// Metadata parsed from the frontmatter block, empty if there was none.
    pub metadata: Metadata,
    /// The body text following the closing delimiter (or the whole input,
    /// if there was no frontmatter block at all).
    pub body: String,
}

/// Parse `raw`'s optional leading frontmatter block.
///
/// A file with no opening `---` on its first line has no frontmatter: the
/// whole input is the body. A file whose first line is `---` but which never
/// finds a closing `---` is a [`FrontmatterError::Unclosed`].
pub fn decode(path: &str, raw: &str) -> Result<Decoded, FrontmatterError> {
    let mut lines = raw.split('\n');
    let Some(first) = lines.next() else {
        return Ok(Decoded {
            metadata: Metadata::new(),
            body: String::new(),
        });
    };

    if first.trim_end_matches('\r') != "---" {
        return Ok(Decoded {
            metadata: Metadata::new(),
            body: raw.to_string(),
        });
    }

    let mut block_lines = Vec::new();
    let mut closed = false;
    let mut consumed = 1; // the opening delimiter line
    for line in lines.by_ref() {
        consumed += 1;
        if line.trim_end_matches('\r') == "---" {
            closed = true;
            break;
        }
        block_lines.push(line);
    }

    if !closed {
        return Err(FrontmatterError::Unclosed {
            path: path.to_string(),
            line: 1,
        });
    }

    let yaml_src: String = block_lines
        .iter()
        .filter(|l| !l.trim_start().starts_with('#'))
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");

    let metadata = if yaml_src.trim().is_empty() {
        Metadata::new()
    } else {
        let parsed: serde_yml::Value =
            serde_yml::from_str(&yaml_src).map_err(|source| FrontmatterError::Yaml {
                path: path.to_string(),
                source,
            })?;
        match Value::from(parsed) {
            Value::Map(m) => m,
            Value::Null => Metadata::new(),
            other => {
                let mut m = Metadata::new();
                m.insert("value".to_string(), other);
                m
            }
        }
    };

    let body: String = raw.splitn(consumed + 1, '\n').nth(consumed).unwrap_or("").to_string();

    Ok(Decoded { metadata, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_frontmatter_leaves_body_intact() {
        let decoded = decode("post.md", "# Hello\n\nBody text").unwrap();
        assert!(decoded.metadata.is_empty());
        assert_eq!(decoded.body, "# Hello\n\nBody text");
    }

    #[test]
    fn parses_scalars_and_lists() {
        let raw = "---\ntitle: Hello World\ndraft: true\ntags:\n  - rust\n  - ssg\n---\nBody here";
        let decoded = decode("post.md", raw).unwrap();
        assert_eq!(
            decoded.metadata.get("title").unwrap().as_str(),
            Some("Hello World")
        );
        assert_eq!(decoded.metadata.get("draft").unwrap().as_bool(), Some(true));
        assert_eq!(
            decoded.metadata.get("tags").unwrap().as_list().unwrap().len(),
            2
        );
        assert_eq!(decoded.body, "Body here");
    }

    #[test]
    fn date_scalar_promotes_to_date_value() {
        let raw = "---\ndate: 2024-03-01\n---\nBody";
        let decoded = decode("post.md", raw).unwrap();
        assert!(decoded.metadata.get("date").unwrap().as_date().is_some());
    }

    #[test]
    fn unclosed_block_is_an_error() {
        let raw = "---\ntitle: Oops\nno closing delimiter";
        let err = decode("post.md", raw).unwrap_err();
        match err {
            FrontmatterError::Unclosed { path, .. } => assert_eq!(path, "post.md"),
            other => panic!("expected Unclosed, got {other:?}"),
        }
    }

    #[test]
    fn comment_lines_are_ignored() {
        let raw = "---\n# a comment\ntitle: Hi\n---\nBody";
        let decoded = decode("post.md", raw).unwrap();
        assert_eq!(decoded.metadata.get("title").unwrap().as_str(), Some("Hi"));
    }
}
