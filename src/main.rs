// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use dot_user_git::{
    config::Cli,
    flow::{Initializer, RunSummary, Templates},
    prompt::InquirePrompter,
};

use anyhow::{Context, Result};
use std::process::exit;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .without_time();
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    match run() {
        Ok(summary) => {
            if summary.aborted() {
                warn!("quit on request");
            }
            exit(summary.exit_code())
        }
        Err(error) => {
            error!("{error:?}");
            exit(1)
        }
    }
}

fn run() -> Result<RunSummary> {
    let (settings, repositories) = Cli::parse_args()
        .validate()
        .context("error validating app config")?;
    let templates = Templates::list(&settings).with_context(|| {
        format!(
            "error listing executables in template directory {:?}",
            settings.template_dir.display()
        )
    })?;

    let mut initializer = Initializer::new(&settings, templates, InquirePrompter::new());
    let summary = initializer.run(&repositories)?;

    Ok(summary)
}
