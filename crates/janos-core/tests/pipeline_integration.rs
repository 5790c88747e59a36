//! End-to-end wiring of several stages through a real [`Pipeline`]: decode
//! frontmatter/Markdown, normalize tags, drop drafts, build a collection,
//! then assign permalinks.

use janos_core::context::{BuildMode, SiteConfig};
use janos_core::file::VirtualFile;
use janos_core::pipeline::Pipeline;
use janos_core::stages::collections::{CollectionConfig, CollectionsStage};
use janos_core::stages::content_decoder::ContentDecoderStage;
use janos_core::stages::permalinks::PermalinksStage;
use janos_core::stages::publish::PublishStage;
use janos_core::stages::tags::TagsStage;
use janos_core::store::FileStore;
use std::collections::HashMap;

fn site() -> SiteConfig {
    SiteConfig {
        title: "Test Site".to_string(),
        base_url: "https://example.com".to_string(),
        ..Default::default()
    }
}

#[test]
fn full_pipeline_decodes_tags_filters_and_links_posts() {
    let mut files = FileStore::new();
    files.set(
        "posts/hello.md".to_string(),
        VirtualFile::new(
            "posts/hello.md",
            b"---\ntitle: Hello World\ndate: 2024-01-05\ntags: [rust, ssg]\n---\n\n# Hi\n\nBody text.\n"
                .to_vec(),
        ),
    );
    files.set(
        "posts/secret-draft.md".to_string(),
        VirtualFile::new(
            "posts/secret-draft.md",
            b"---\ntitle: Not Ready\ndraft: true\n---\n\nShh.\n".to_vec(),
        ),
    );

    let mut collections = HashMap::new();
    collections.insert(
        "posts".to_string(),
        CollectionConfig {
            patterns: vec!["posts/**/*.html".to_string()],
            sort_by: Some("date".to_string()),
            reverse: true,
            refer: true,
            limit: None,
            filter: Vec::new(),
        },
    );

    let mut pipeline = Pipeline::new(site(), BuildMode::Production);
    pipeline
        .use_stage(Box::new(ContentDecoderStage::default()))
        .use_stage(Box::new(TagsStage::default()))
        .use_stage(Box::new(PublishStage::default()))
        .use_stage(Box::new(CollectionsStage { collections }))
        .use_stage(Box::new(PermalinksStage {
            pattern: Some("/blog/:year/:month/:slug/".to_string()),
            ..Default::default()
        }));

    let result = pipeline.process(&mut files).expect("pipeline should succeed");
    assert_eq!(result.files_processed, 2);

    assert!(
        files.get("posts/secret-draft.md").is_none() && files.get("posts/secret-draft.html").is_none(),
        "the draft must not survive a production build"
    );

    let published = files
        .iter()
        .find(|(_, f)| f.metadata.get("title").and_then(|v| v.as_str()) == Some("Hello World"))
        .map(|(path, _)| path.clone())
        .expect("the published post should remain in the store");

    assert!(published.starts_with("blog/2024/01/"), "got path {published}");
    assert!(published.ends_with("index.html"));

    assert_eq!(pipeline.context().collections.get("posts").map(Vec::len), Some(1));
    assert_eq!(pipeline.context().all_tags.len(), 2);
}

#[test]
fn development_mode_keeps_drafts() {
    let mut files = FileStore::new();
    files.set(
        "posts/draft.md".to_string(),
        VirtualFile::new("posts/draft.md", b"---\ntitle: WIP\ndraft: true\n---\n\nBody.\n".to_vec()),
    );

    let mut pipeline = Pipeline::new(site(), BuildMode::Development);
    pipeline
        .use_stage(Box::new(ContentDecoderStage::default()))
        .use_stage(Box::new(PublishStage::default()));

    pipeline.process(&mut files).expect("pipeline should succeed");

    assert!(
        files.iter().any(|(_, f)| f.metadata.get("title").and_then(|v| v.as_str()) == Some("WIP")),
        "development mode should keep drafts visible"
    );
}
