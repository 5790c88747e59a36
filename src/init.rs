//! `janos init`: scaffolds a new project's `_src/`, `_layouts/`, and
//! `janos.config.json`, ensuring each directory exists before seeding it.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"{
  "site": {
    "title": "My Site",
    "baseUrl": "https://example.com",
    "description": "",
    "language": "en"
  },
  "sourceDir": "_src",
  "outputDir": ".",
  "layoutsDir": "_layouts",
  "mode": "development",
  "pipeline": [
    "markdown",
    "excerpts",
    "tags",
    "collections",
    "permalinks",
    "coordination",
    "layouts",
    "assets",
    "sitemap",
    "feeds",
    "robots",
    "manifest"
  ]
}
"#;

const DEFAULT_LAYOUT: &str = r#"<!doctype html>
<html lang="{{ site_language | default(value="en") }}">
<head>
  <meta charset="utf-8">
  <title>{{ title }} - {{ site_title }}</title>
</head>
<body>
  {% block body %}{{ contents | safe }}{% endblock %}
</body>
</html>
"#;

const DEFAULT_INDEX: &str = r#"---
title: Welcome
layout: base
---

# Welcome to your new site

Edit `_src/index.md` to get started.
"#;

fn ensure_directory(dir: &Path) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        anyhow::bail!("{} exists and is not a directory", dir.display());
    }
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))
}

fn write_if_absent(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        log::info!("{} already exists, leaving it untouched", path.display());
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("writing {}", path.display()))
}

/// Scaffold a new project rooted at `directory`.
pub fn scaffold(directory: &Path) -> Result<()> {
    ensure_directory(directory)?;
    let source_dir = directory.join("_src");
    let layouts_dir = directory.join("_layouts");
    ensure_directory(&source_dir)?;
    ensure_directory(&layouts_dir)?;

    write_if_absent(&directory.join("janos.config.json"), DEFAULT_CONFIG)?;
    write_if_absent(&layouts_dir.join("base.html"), DEFAULT_LAYOUT)?;
    write_if_absent(&source_dir.join("index.md"), DEFAULT_INDEX)?;

    println!("  - {}", directory.join("janos.config.json").display());
    println!("  - {}", layouts_dir.join("base.html").display());
    println!("  - {}", source_dir.join("index.md").display());
    Ok(())
}
