//! Benchmarks for the two hottest per-file operations in a full build:
//! frontmatter splitting/parsing and permalink resolution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use janos_core::context::Context;
use janos_core::file::VirtualFile;
use janos_core::frontmatter;
use janos_core::stage::Stage;
use janos_core::stages::permalinks::PermalinksStage;
use janos_core::store::FileStore;

const POST_SOURCE: &str = r#"---
title: A Benchmark Post About Rust Pipelines
date: 2024-03-14
tags:
  - rust
  - performance
layout: post
# a trailing comment line the parser must ignore
---

# A Benchmark Post

Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed do eiusmod
tempor incididunt ut labore et dolore magna aliqua.
"#;

fn bench_frontmatter_decode(c: &mut Criterion) {
    c.bench_function("frontmatter::decode", |b| {
        b.iter(|| frontmatter::decode(black_box("posts/bench-post.md"), black_box(POST_SOURCE)))
    });
}

fn sample_store(n: usize) -> FileStore {
    let mut store = FileStore::new();
    for i in 0..n {
        let mut file = VirtualFile::new(format!("posts/post-{i}.html"), Vec::new());
        file.metadata
            .insert("title".to_string(), janos_core::value::Value::from(format!("Post Number {i}")));
        file.metadata.insert(
            "date".to_string(),
            janos_core::value::Value::from(format!("2024-01-{:02}", (i % 28) + 1)),
        );
        store.set(file.path.clone(), file);
    }
    store
}

fn bench_permalinks_apply(c: &mut Criterion) {
    let stage = PermalinksStage {
        match_patterns: vec!["**/*.html".to_string()],
        linksets: Vec::new(),
        pattern: Some("/blog/:year/:month/:slug/".to_string()),
        trailing_slash: true,
    };

    c.bench_function("permalinks::apply (200 files)", |b| {
        b.iter_batched(
            || sample_store(200),
            |mut files| {
                let mut ctx = Context::default();
                stage.apply(black_box(&mut files), &mut ctx).unwrap();
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_frontmatter_decode, bench_permalinks_apply);
criterion_main!(benches);
