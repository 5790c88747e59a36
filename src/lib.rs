// Copyright © 2023 Shokunin (職人). All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT
//!
//! # janos 🦀
//!
//! A staged content pipeline for building static sites: a filesystem- and
//! network-free core engine (`janos-core`) driven by a host shell that
//! loads content from disk, resolves templates, fetches webmentions, and
//! encodes responsive images.
//!
//! ## CLI
//!
//! ```shell
//! janos init
//! janos build
//! janos serve
//! ```

#![forbid(unsafe_code)]
#![warn(unreachable_pub)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

use anyhow::{Context, Result};
use janos_core::store::FileStore;
use std::fs;
use std::path::Path;
use std::time::Instant;

/// Parses CLI arguments via `clap` derive.
pub mod cli;
/// Filesystem-backed webmention cache.
#[cfg(feature = "webmentions")]
pub mod cache;
/// Reads and validates `janos.config.json`, assembling the pipeline.
pub mod config_loader;
/// The MiniJinja-backed template engine.
#[cfg(feature = "templates")]
pub mod engine_minijinja;
/// The `reqwest`-blocking webmention fetcher.
#[cfg(feature = "webmentions")]
pub mod fetch;
/// The `image`-crate-backed responsive-image codec.
#[cfg(feature = "image-optimization")]
pub mod image_impl;
/// Scaffolds a new project's directory layout.
pub mod init;
/// Walks a source directory into a `FileStore`.
pub mod loader;
/// A minimal static file server for previewing build output.
pub mod serve;

/// Parsed command-line invocation and its subcommand.
pub use cli::{Cli, Commands};

fn print_banner() {
    let title = "janos 🦀";
    let description = "A staged content pipeline for static sites";
    let width = title.len().max(description.len()) + 4;
    let horizontal_line = "─".repeat(width - 2);

    println!("\n┌{}┐", horizontal_line);
    println!("│{: ^width$}│", title, width = width - 5);
    println!("├{}┤", horizontal_line);
    println!("│{: ^width$}│", description, width = width - 2);
    println!("└{}┘", horizontal_line);
}

/// Write every file in `files` out under `output_dir`, creating parent
/// directories as needed.
fn write_output(files: &FileStore, output_dir: &Path) -> Result<()> {
    for (path, file) in files.iter() {
        let dest = output_dir.join(path);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        fs::write(&dest, &file.contents).with_context(|| format!("writing {}", dest.display()))?;
    }
    Ok(())
}

/// Run a single build: load the source directory, run the pipeline, and
/// write the result to the configured output directory. Returns the
/// resolved directory layout so callers (e.g. `serve`) can reuse it.
pub fn build(config_path: &Path) -> Result<config_loader::ResolvedPaths> {
    let started = Instant::now();
    let (mut pipeline, paths) = config_loader::load(config_path)?;

    println!("❯ Loading source files from {}", paths.source_dir.display());
    let mut files = loader::load_directory(&paths.source_dir)
        .with_context(|| format!("reading {}", paths.source_dir.display()))?;
    println!("  Found {} files.\n", files.len());

    println!("❯ Running pipeline...");
    let result = pipeline
        .process(&mut files)
        .map_err(|e| anyhow::anyhow!("stage '{}' failed: {}", e.stage, e.source))?;
    println!(
        "  {} files in, {} files out, {:?}\n",
        result.files_processed, result.files_output, result.duration
    );
    for warning in &result.warnings {
        eprintln!("  ⚠ {warning}");
    }
    for error in &result.errors {
        eprintln!("  ✗ {error}");
    }

    println!("❯ Writing output to {}", paths.output_dir.display());
    write_output(&files, &paths.output_dir)?;
    println!("  Done in {:?}.\n", started.elapsed());

    Ok(paths)
}

/// Dispatch a parsed [`Cli`] invocation. The only subcommand that touches
/// the content pipeline is `Build`; `Serve` builds first, then serves.
pub fn run(cli: Cli) -> Result<()> {
    print_banner();

    match cli.command {
        Commands::Init { directory } => {
            println!("\n❯ Scaffolding a new project at \"{}\"", directory.display());
            init::scaffold(&directory)?;
            println!("\n✅ All Done");
            Ok(())
        }
        Commands::Build { config } => {
            build(&config)?;
            println!("✅ All Done");
            Ok(())
        }
        Commands::Serve { config, address } => {
            let paths = build(&config)?;
            serve::start(&address, &paths.output_dir.to_string_lossy())?;
            Ok(())
        }
        Commands::Deploy { config, target } => {
            build(&config)?;
            match target {
                Some(target) => println!("\n❯ Deploy target \"{target}\" is not wired up yet."),
                None => println!("\n❯ No deploy target configured; build output is ready to ship manually."),
            }
            println!("✅ All Done");
            Ok(())
        }
    }
}
