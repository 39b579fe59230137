// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive prompts.
//!
//! The decision flow only ever asks two kinds of questions: a yes/no
//! confirmation, and a multi-select over template entries. Both are modal and
//! blocking. The [`Prompter`] trait is the seam between the flow and whatever
//! draws the prompt, so the flow can be driven by a terminal or by a script.

use inquire::{Confirm, InquireError, MultiSelect};
use tracing::warn;

/// Final state of a yes/no prompt.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct YesNo {
    /// Answer given.
    pub result: bool,

    /// An answer was actually entered.
    pub entered: bool,

    /// Caller should stop.
    pub quit: bool,
}

impl YesNo {
    /// Plain yes.
    pub fn yes() -> Self {
        Self {
            result: true,
            entered: true,
            quit: false,
        }
    }

    /// Plain no, quitting if asked to treat no as quit.
    pub fn no(quit_on_no: bool) -> Self {
        Self {
            result: false,
            entered: true,
            quit: quit_on_no,
        }
    }

    /// Quit signal without any answer.
    pub fn quit() -> Self {
        Self {
            result: false,
            entered: false,
            quit: true,
        }
    }
}

/// Final state of a multi-select prompt.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Selection {
    /// Checked state per option, aligned with the option list.
    pub selected: Vec<bool>,

    /// Caller should stop.
    pub quit: bool,
}

impl Selection {
    /// Quit signal without any selection.
    pub fn quit(len: usize) -> Self {
        Self {
            selected: vec![false; len],
            quit: true,
        }
    }
}

/// Blocking interactive prompt backend.
pub trait Prompter {
    /// Ask a yes/no question.
    ///
    /// When `quit_on_no` is set, answering no also raises the quit signal.
    fn confirm(&mut self, question: &str, quit_on_no: bool) -> Result<YesNo>;

    /// Let user toggle options starting from a preselection.
    ///
    /// The returned selection has the same length and order as `options`.
    fn multi_select(
        &mut self,
        header: &str,
        options: &[String],
        preselection: &[bool],
    ) -> Result<Selection>;
}

/// Terminal prompts drawn through inquire.
///
/// Escape and Ctrl-C both count as the quit signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct InquirePrompter;

impl InquirePrompter {
    /// Construct new terminal prompter.
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for InquirePrompter {
    fn confirm(&mut self, question: &str, quit_on_no: bool) -> Result<YesNo> {
        let answer = Confirm::new(question)
            .with_default(true)
            .with_help_message("y/n to answer, esc/ctrl-c to quit")
            .prompt();

        match answer {
            Ok(true) => Ok(YesNo::yes()),
            Ok(false) => Ok(YesNo::no(quit_on_no)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                Ok(YesNo::quit())
            }
            Err(err) => Err(PromptError::Inquire(err)),
        }
    }

    fn multi_select(
        &mut self,
        header: &str,
        options: &[String],
        preselection: &[bool],
    ) -> Result<Selection> {
        check_alignment(options, preselection)?;

        // INVARIANT: Inquire refuses an empty option list.
        if options.is_empty() {
            warn!("nothing to select from");
            return Ok(Selection::default());
        }

        let defaults = preselection
            .iter()
            .enumerate()
            .filter_map(|(index, checked)| checked.then_some(index))
            .collect::<Vec<_>>();
        let answer = MultiSelect::new(header, options.to_vec())
            .with_default(&defaults)
            .with_help_message("arrows/j/k to move, space to toggle, enter to submit, esc to quit")
            .raw_prompt();

        match answer {
            Ok(picked) => {
                let mut selected = vec![false; options.len()];
                for option in picked {
                    selected[option.index] = true;
                }
                Ok(Selection {
                    selected,
                    quit: false,
                })
            }
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                Ok(Selection::quit(options.len()))
            }
            Err(err) => Err(PromptError::Inquire(err)),
        }
    }
}

/// Check that preselection lines up with option list.
///
/// # Errors
///
/// - Return [`PromptError::Misaligned`] if lengths differ.
pub fn check_alignment(options: &[String], preselection: &[bool]) -> Result<()> {
    if options.len() != preselection.len() {
        return Err(PromptError::Misaligned {
            options: options.len(),
            preselection: preselection.len(),
        });
    }

    Ok(())
}

/// Prompt error types.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// Terminal prompt fails.
    #[error(transparent)]
    Inquire(#[from] InquireError),

    /// Preselection does not line up with options.
    #[error("preselection has {preselection} entries but there are {options} options")]
    Misaligned { options: usize, preselection: usize },
}

/// Friendly result alias :3
pub type Result<T, E = PromptError> = std::result::Result<T, E>;
