// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Decision flow.
//!
//! Each batch of repositories walks through the same sequence of stages:
//!
//! ```text
//! Start -> SkipCheck -> InitialPrompt -> SelectionPrompt -> GitignorePrompt -> Apply -> Done
//! ```
//!
//! Any prompt stage may end in `Aborted` when the user quits. Skips and "no"
//! answers end the batch early in `Done` without touching the filesystem.
//! Apply is always the last stage, so quitting never leaves a batch half
//! written.
//!
//! # Batches
//!
//! By default every input repository forms one batch. In per repository mode
//! each repository is its own batch, handled fully before the next one starts.
//! Answering "no" to the initial prompt skips just that repository in per
//! repository mode, but stops the whole run otherwise.

use crate::{
    apply::{self, ApplyError},
    config::{GitignoreChoice, Settings},
    preselect,
    probe::{self, ProbeError},
    prompt::{PromptError, Prompter, YesNo},
    repo::{Batch, Repository},
    state::{self, StateError},
};

use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::{info, instrument, warn};

/// Stages a batch moves through.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Stage {
    /// Read target folder and gitignore state.
    Start,

    /// Decide whether the batch is skipped entirely.
    SkipCheck,

    /// Confirm batch with user.
    InitialPrompt,

    /// Pick template entries.
    SelectionPrompt,

    /// Decide on gitignore registration.
    GitignorePrompt,

    /// Write selection to filesystem.
    Apply,
}

impl Display for Stage {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Start => "start",
            Self::SkipCheck => "skip check",
            Self::InitialPrompt => "initial prompt",
            Self::SelectionPrompt => "selection prompt",
            Self::GitignorePrompt => ".gitignore prompt",
            Self::Apply => "apply",
        };
        fmt.write_str(name)
    }
}

/// Reason a batch was skipped without prompting.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SkipReason {
    /// Every repository already has a target folder.
    TargetExists,

    /// Every repository already gitignores the target folder.
    Gitignored,
}

/// How a batch ended.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BatchOutcome {
    /// Selection was written.
    Applied {
        /// Gitignore registration was requested.
        gitignore: bool,
    },

    /// Batch skipped by configuration.
    Skipped(SkipReason),

    /// User answered no, run continues.
    Declined,

    /// User answered no, run stops without failure.
    Stopped,

    /// User quit, run stops with failure.
    Aborted,
}

impl BatchOutcome {
    /// Check if outcome ends the whole run.
    pub fn halts_run(&self) -> bool {
        matches!(self, Self::Stopped | Self::Aborted)
    }
}

/// Outcomes of every batch handled in a run.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct RunSummary {
    /// Outcome per batch in processing order.
    pub outcomes: Vec<BatchOutcome>,
}

impl RunSummary {
    /// Check if user quit at some point.
    pub fn aborted(&self) -> bool {
        self.outcomes.last() == Some(&BatchOutcome::Aborted)
    }

    /// Process exit code for the run.
    ///
    /// Only quitting fails the run. Skips, declines, and a voluntary stop
    /// all exit cleanly.
    pub fn exit_code(&self) -> i32 {
        if self.aborted() {
            1
        } else {
            0
        }
    }
}

/// Template entries available for a run.
///
/// Listed once at the start of a run. The order never changes afterwards, and
/// every preselection and selection vector lines up with it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Templates {
    entries: Vec<String>,
}

impl Templates {
    /// List executable entries at the top level of the template directory.
    ///
    /// # Errors
    ///
    /// - Return [`ProbeError::ReadDir`] if template directory cannot be read.
    pub fn list(settings: &Settings) -> Result<Self, ProbeError> {
        let entries = probe::list_top_level_executables(&settings.template_dir)?;
        if entries.is_empty() {
            warn!(
                "no executables found in template directory {:?}",
                settings.template_dir.display()
            );
        }

        Ok(Self { entries })
    }

    /// Entry names in run order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// Drives batches through the decision flow.
#[derive(Debug)]
pub struct Initializer<'cfg, P>
where
    P: Prompter,
{
    settings: &'cfg Settings,
    templates: Templates,
    prompter: P,
}

impl<'cfg, P> Initializer<'cfg, P>
where
    P: Prompter,
{
    /// Construct new initializer.
    pub fn new(settings: &'cfg Settings, templates: Templates, prompter: P) -> Self {
        Self {
            settings,
            templates,
            prompter,
        }
    }

    /// Give back prompter.
    pub fn into_prompter(self) -> P {
        self.prompter
    }

    /// Run every batch for given repositories.
    ///
    /// Stops at the first batch that halts the run.
    ///
    /// # Errors
    ///
    /// - Return [`FlowError`] at the first batch that fails.
    pub fn run(&mut self, repos: &[Repository]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        if self.settings.per_repo_mode {
            for batch in Batch::each(repos) {
                let outcome = self.run_batch(batch)?;
                summary.outcomes.push(outcome);
                if outcome.halts_run() {
                    break;
                }
            }
        } else {
            summary.outcomes.push(self.run_batch(Batch::whole(repos))?);
        }

        Ok(summary)
    }

    /// Run one batch through the decision flow.
    ///
    /// # Errors
    ///
    /// - Return [`FlowError::State`] if target folder, gitignore, or
    ///   preselection state cannot be read.
    /// - Return [`FlowError::Prompt`] if a prompt fails.
    /// - Return [`FlowError::Apply`] if selection cannot be written.
    #[instrument(skip_all, level = "debug")]
    pub fn run_batch(&mut self, batch: Batch<'_>) -> Result<BatchOutcome> {
        let settings = self.settings;
        let target = &settings.target;

        // Start.
        let target_presence =
            state::target_presence(&batch, target).map_err(FlowError::state(Stage::Start))?;
        let gitignore_presence =
            state::gitignore_presence(&batch, target).map_err(FlowError::state(Stage::Start))?;
        let all_gitignored = gitignore_presence.iter().all(|present| *present);

        // Skip check.
        if settings.skip_where_target_exists && target_presence.iter().all(|present| *present) {
            self.report_skip(&batch, SkipReason::TargetExists);
            return Ok(BatchOutcome::Skipped(SkipReason::TargetExists));
        }
        if settings.skip_where_gitignored && all_gitignored {
            self.report_skip(&batch, SkipReason::Gitignored);
            return Ok(BatchOutcome::Skipped(SkipReason::Gitignored));
        }

        // Initial prompt.
        if settings.yes_initial_prompt {
            info!("initialize/update {} repositories", batch.len());
        } else {
            let question = initial_question(&batch, &target_presence);
            let answer = self
                .prompter
                .confirm(&question, !settings.per_repo_mode)
                .map_err(FlowError::prompt(Stage::InitialPrompt))?;
            if let Some(outcome) = halting_answer(answer) {
                return Ok(outcome);
            }
            if !answer.result {
                info!("skip {} repositories on request", batch.len());
                return Ok(BatchOutcome::Declined);
            }
        }

        // Selection prompt.
        let entries = self.templates.entries();
        let preselection = preselect::resolve(settings.preselection(), &batch, target, entries)
            .map_err(FlowError::state(Stage::SelectionPrompt))?;
        let header = selection_header(&batch);
        let selection = self
            .prompter
            .multi_select(&header, entries, &preselection)
            .map_err(FlowError::prompt(Stage::SelectionPrompt))?;
        if selection.quit {
            return Ok(BatchOutcome::Aborted);
        }

        // Gitignore prompt.
        let gitignore = match settings.gitignore {
            GitignoreChoice::Include => true,
            GitignoreChoice::Omit => false,
            GitignoreChoice::Ask if all_gitignored => false,
            GitignoreChoice::Ask => {
                let question = format!("Do you want to add {:?} to .gitignore", target.as_str());
                let answer = self
                    .prompter
                    .confirm(&question, false)
                    .map_err(FlowError::prompt(Stage::GitignorePrompt))?;
                if let Some(outcome) = halting_answer(answer) {
                    return Ok(outcome);
                }
                answer.result
            }
        };

        // Apply.
        apply::install_selection(
            &batch,
            &settings.template_dir,
            target,
            entries,
            &selection.selected,
            settings.force_reinitialize,
        )
        .map_err(FlowError::apply(Stage::Apply))?;
        if gitignore {
            apply::register_gitignore(&batch, target, &gitignore_presence)
                .map_err(FlowError::apply(Stage::Apply))?;
        }

        Ok(BatchOutcome::Applied { gitignore })
    }

    fn report_skip(&self, batch: &[Repository], reason: SkipReason) {
        let why = match reason {
            SkipReason::TargetExists => "target directory found",
            SkipReason::Gitignored => "target directory already in .gitignore",
        };

        if self.settings.per_repo_mode {
            for repo in batch {
                warn!("skipping repository {:?} - {why}", repo.as_path().display());
            }
        } else {
            warn!("skipping all repositories - {why} everywhere");
        }
    }
}

fn halting_answer(answer: YesNo) -> Option<BatchOutcome> {
    match (answer.quit, answer.entered) {
        (true, true) => Some(BatchOutcome::Stopped),
        (true, false) => Some(BatchOutcome::Aborted),
        (false, _) => None,
    }
}

fn initial_question(batch: &[Repository], target_presence: &[bool]) -> String {
    let mut question = String::from("Do you want to initialize/update following repositories\n");
    for (repo, exists) in batch.iter().zip(target_presence) {
        let operation = if *exists { "UPDATE" } else { "CREATE" };
        question.push_str(&format!("* {:?} [{operation}]\n", repo.as_path().display()));
    }

    question
}

fn selection_header(batch: &[Repository]) -> String {
    let mut header = String::from("Pick entries for following repositories\n");
    for repo in batch {
        header.push_str(&format!("* {:?}\n", repo.as_path().display()));
    }

    header
}

/// Decision flow error types.
///
/// Each variant names the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Batch state cannot be read.
    #[error("failed to read repository state during {stage}")]
    State {
        #[source]
        source: StateError,
        stage: Stage,
    },

    /// Prompt fails.
    #[error("encountered prompt error during {stage}")]
    Prompt {
        #[source]
        source: PromptError,
        stage: Stage,
    },

    /// Selection cannot be written.
    #[error("failed to initialize repositories during {stage}")]
    Apply {
        #[source]
        source: ApplyError,
        stage: Stage,
    },
}

impl FlowError {
    fn state(stage: Stage) -> impl Fn(StateError) -> Self {
        move |source| Self::State { source, stage }
    }

    fn prompt(stage: Stage) -> impl Fn(PromptError) -> Self {
        move |source| Self::Prompt { source, stage }
    }

    fn apply(stage: Stage) -> impl Fn(ApplyError) -> Self {
        move |source| Self::Apply { source, stage }
    }

    /// Stage that failed.
    pub fn stage(&self) -> Stage {
        match self {
            Self::State { stage, .. } | Self::Prompt { stage, .. } | Self::Apply { stage, .. } => {
                *stage
            }
        }
    }
}

/// Friendly result alias :3
pub type Result<T, E = FlowError> = std::result::Result<T, E>;
