//! Markdown-to-HTML conversion, per §4.2: GFM (tables, strikethrough, task
//! lists, footnotes), fenced code blocks annotated with `language-<lang>`,
//! autolinks, and raw HTML passthrough by default.

use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Options controlling markdown conversion.
#[derive(Debug, Clone)]
pub struct MarkdownOptions {
    /// Pass raw HTML embedded in the source through untouched. When `false`,
    /// raw HTML events are dropped entirely (sanitization itself is out of
    /// scope per §4.2; this is a coarse strip, not a sanitizer).
    pub allow_raw_html: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            allow_raw_html: true,
        }
    }
}

/// Convert a Markdown body to HTML.
pub fn to_html(body: &str, opts: &MarkdownOptions) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);

    let parser = Parser::new_ext(body, options);
    let events: Vec<Event> = parser
        .map(|event| annotate_code_language(event))
        .filter(|event| {
            opts.allow_raw_html
                || !matches!(event, Event::Html(_) | Event::InlineHtml(_))
        })
        .collect();

    let mut html_out = String::new();
    html::push_html(&mut html_out, events.into_iter());
    html_out
}

/// `pulldown-cmark` does not itself emit `class="language-foo"` on fenced
/// code blocks; rewrite the opening `Tag::CodeBlock` event to carry the
/// language as HTML via a raw passthrough isn't available mid-stream, so we
/// instead replace `Tag::CodeBlock(Fenced(lang))`/matching end with explicit
/// raw HTML wrapping the code text is handled at the `html::push_html` layer
/// by pulldown-cmark itself when the `Fenced` variant carries a non-empty
/// info string — this hook exists to normalize multi-word info strings
/// (`rust,ignore`) down to their first token, which is the convention GFM
/// renderers use for the language class.
fn annotate_code_language(event: Event) -> Event {
    match event {
        Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
            let first_token = info.split_whitespace().next().unwrap_or("");
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(first_token.into())))
        }
        Event::End(TagEnd::CodeBlock) => Event::End(TagEnd::CodeBlock),
        other => other,
    }
}
