// Copyright © 2023-2024 Shokunin Static Site Generator. All rights reserved.
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The entry point: parses CLI arguments and dispatches into `janos::run`.
//!
//! If the run fails, the error is printed to standard error and the
//! process exits with a non-zero status code.

use clap::Parser;
use janos::Cli;

fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(err) = janos::run(cli) {
        eprintln!("❌ Error: {err:#}");
        std::process::exit(1);
    }
}
