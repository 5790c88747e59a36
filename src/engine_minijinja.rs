//! The MiniJinja-backed template engine, replacing hand-rolled
//! `{{placeholder}}` substitution with a real inheritance-capable engine.

use janos_core::error::TemplateError;
use janos_core::store::FileStore;
use janos_core::template_engine::{TemplateEngine, VirtualLoader};
use janos_core::value::Metadata;
use minijinja::{Environment, Error as MjError, ErrorKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// `renderFile`'s mandatory extensions, per §4.12.
const EXTENSIONS: &[&str] = &["njk", "nunjucks", "html"];

/// A MiniJinja engine mounted via the `TemplateEngine` trait.
#[derive(Debug, Default)]
pub struct MinijinjaEngine;

fn to_minijinja_value(metadata: &Metadata) -> minijinja::Value {
    let json: serde_json::Value = serde_json::Value::Object(
        metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.into()))
            .collect(),
    );
    minijinja::Value::from_serialize(&json)
}

fn base_environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.add_filter("date", date_filter);
    env.add_filter("readingTime", reading_time_filter);
    env.add_filter("slug", |s: String| janos_core::slug::slug(&s));
    env
}

/// Translate moment.js-style date tokens into formatted output, per
/// §4.12's required token set.
fn date_filter(value: String, format: String) -> String {
    let Some(dt) = janos_core::datefmt::parse_date_scalar(&value) else {
        return value;
    };
    format_date_tokens(&format, dt)
}

static TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"YYYY|YY|MMMM|MMM|MM|M|DD|D|dddd|ddd|HH|H|mm|m|ss|s|ZZ|Z").unwrap()
});

fn format_date_tokens(format: &str, dt: chrono::DateTime<chrono::Utc>) -> String {
    TOKEN
        .replace_all(format, |caps: &regex::Captures| match &caps[0] {
            "YYYY" => dt.format("%Y").to_string(),
            "YY" => dt.format("%y").to_string(),
            "MMMM" => dt.format("%B").to_string(),
            "MMM" => dt.format("%b").to_string(),
            "MM" => dt.format("%m").to_string(),
            "M" => dt.format("%-m").to_string(),
            "DD" => dt.format("%d").to_string(),
            "D" => dt.format("%-d").to_string(),
            "dddd" => dt.format("%A").to_string(),
            "ddd" => dt.format("%a").to_string(),
            "HH" => dt.format("%H").to_string(),
            "H" => dt.format("%-H").to_string(),
            "mm" => dt.format("%M").to_string(),
            "m" => dt.format("%-M").to_string(),
            "ss" => dt.format("%S").to_string(),
            "s" => dt.format("%-S").to_string(),
            "ZZ" => dt.format("%z").to_string(),
            "Z" => dt.format("%:z").to_string(),
            other => other.to_string(),
        })
        .into_owned()
}

static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Strip tags, count whitespace-separated tokens, divide by words-per-minute
/// (default 200), round up, per §4.12's exact wording.
fn reading_time_filter(value: String, words_per_minute: Option<u32>) -> String {
    let wpm = words_per_minute.unwrap_or(200).max(1);
    let stripped = TAG.replace_all(&value, " ");
    let words = WHITESPACE
        .split(stripped.trim())
        .filter(|w| !w.is_empty())
        .count();
    let minutes = (words as u32).div_ceil(wpm);
    match minutes {
        0 => "less than 1 min read".to_string(),
        1 => "1 min read".to_string(),
        n => format!("{n} min read"),
    }
}

fn to_template_error(template: &str, err: MjError) -> TemplateError {
    TemplateError::Render {
        template: template.to_string(),
        reason: err.to_string(),
    }
}

static REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\{%-?\s*(?:extends|include)\s+"([^"]+)""#).unwrap()
});

/// Eagerly resolve `name` and every `extends`/`include` name it references,
/// transitively, registering each under the exact literal name used in the
/// referencing template (the name minijinja will look up at render time).
/// Avoids needing a loader callback with a `'static` bound, since `files`
/// and `loader` only need to live for the duration of this call.
fn resolve_templates(
    name: &str,
    files: &FileStore,
    loader: &dyn VirtualLoader,
    env: &mut Environment<'static>,
    visited: &mut HashSet<String>,
) -> Result<(), TemplateError> {
    if visited.contains(name) {
        return Ok(());
    }
    visited.insert(name.to_string());

    let Some(source) = loader.load(files, name) else {
        return Err(TemplateError::NotFound {
            name: name.to_string(),
        });
    };

    for referenced in REFERENCE.captures_iter(&source).map(|c| c[1].to_string()) {
        resolve_templates(&referenced, files, loader, env, visited)?;
    }

    env.add_template_owned(name.to_string(), source)
        .map_err(|e| to_template_error(name, e))?;
    Ok(())
}

impl TemplateEngine for MinijinjaEngine {
    fn extensions(&self) -> &[&str] {
        EXTENSIONS
    }

    fn render(&self, template: &str, data: &Metadata) -> Result<String, TemplateError> {
        let env = base_environment();
        env.render_str(template, to_minijinja_value(data))
            .map_err(|e| to_template_error("<inline>", e))
    }

    fn render_file(
        &self,
        name: &str,
        data: &Metadata,
        files: &FileStore,
        loader: &dyn VirtualLoader,
    ) -> Result<String, TemplateError> {
        let mut env = base_environment();
        let mut visited = HashSet::new();
        resolve_templates(name, files, loader, &mut env, &mut visited)?;

        let tmpl = env.get_template(name).map_err(|e| {
            if e.kind() == ErrorKind::TemplateNotFound {
                TemplateError::NotFound {
                    name: name.to_string(),
                }
            } else {
                to_template_error(name, e)
            }
        })?;
        tmpl.render(to_minijinja_value(data))
            .map_err(|e| to_template_error(name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use janos_core::file::VirtualFile;

    struct FsLoader;
    impl VirtualLoader for FsLoader {
        fn load(&self, files: &FileStore, name: &str) -> Option<String> {
            let candidates = [
                format!("_layouts/{name}"),
                format!("_layouts/{name}.html"),
            ];
            candidates
                .iter()
                .find_map(|key| files.get(key).and_then(|f| f.contents_str()).map(String::from))
        }
    }

    #[test]
    fn reading_time_rounds_up_and_has_special_cases() {
        assert_eq!(reading_time_filter(String::new(), None), "less than 1 min read");
        assert_eq!(reading_time_filter("one two three".repeat(67), None), "1 min read");
    }

    #[test]
    fn date_filter_expands_tokens() {
        let out = date_filter("2024-03-05".to_string(), "YYYY-MM-DD".to_string());
        assert_eq!(out, "2024-03-05");
    }

    #[test]
    fn inline_render_substitutes_context() {
        let engine = MinijinjaEngine;
        let mut data = Metadata::new();
        data.insert("name".to_string(), janos_core::value::Value::from("World"));
        let out = engine.render("Hello {{ name }}", &data).unwrap();
        assert_eq!(out, "Hello World");
    }

    #[test]
    fn render_file_resolves_extends_via_loader() {
        let mut files = FileStore::new();
        files.set(
            "_layouts/base.html",
            VirtualFile::new("_layouts/base.html", b"<html>{% block body %}{% endblock %}</html>".to_vec()),
        );
        files.set(
            "_layouts/post.html",
            VirtualFile::new(
                "_layouts/post.html",
                b"{% extends \"base\" %}{% block body %}{{ contents }}{% endblock %}".to_vec(),
            ),
        );
        let engine = MinijinjaEngine;
        let mut data = Metadata::new();
        data.insert("contents".to_string(), janos_core::value::Value::from("Body"));
        let out = engine.render_file("post", &data, &files, &FsLoader).unwrap();
        assert_eq!(out, "<html>Body</html>");
    }
}
