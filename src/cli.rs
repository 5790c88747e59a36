//! The command-line surface, per §6: `init`, `build`, `serve`, `deploy`.
//! Only `build` touches the content pipeline; the others are host-side
//! scaffolding and delivery concerns.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// janos — a staged static-site content pipeline.
#[derive(Debug, Parser)]
#[command(name = "janos", author, version, about)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scaffold a new project: `_src/`, `_layouts/`, and `janos.config.json`.
    Init {
        /// Directory to scaffold into. Defaults to the current directory.
        #[arg(value_name = "DIR", default_value = ".")]
        directory: PathBuf,
    },

    /// Run the content pipeline once and write the output directory.
    Build {
        /// Path to `janos.config.json`.
        #[arg(long, short, value_name = "CONFIG", default_value = "janos.config.json")]
        config: PathBuf,
    },

    /// Build, then serve the output directory over HTTP.
    Serve {
        /// Path to `janos.config.json`.
        #[arg(long, short, value_name = "CONFIG", default_value = "janos.config.json")]
        config: PathBuf,

        /// Address to bind the development server to.
        #[arg(long, value_name = "ADDRESS", default_value = "127.0.0.1:8080")]
        address: String,
    },

    /// Build, then hand the output directory to a deploy target.
    Deploy {
        /// Path to `janos.config.json`.
        #[arg(long, short, value_name = "CONFIG", default_value = "janos.config.json")]
        config: PathBuf,

        /// Deploy target name (e.g. a configured remote).
        #[arg(long, value_name = "TARGET")]
        target: Option<String>,
    },
}
