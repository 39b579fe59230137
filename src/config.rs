// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layer.
//!
//! Every setting can come from a command flag or an environment variable.
//! Flags win over the environment. Parse through [`Cli::try_parse_args`] so
//! the gitignore switches get resolved. Parsed options are then validated into
//! [`Settings`] plus the list of [`Repository`] values to process, before any
//! repository is touched.

use crate::{
    preselect::PreselectionMode,
    probe::{self, ProbeError},
    repo::{RepoError, Repository, TargetFolder},
};

use clap::{
    builder::BoolishValueParser, error::ErrorKind, ArgAction, ArgMatches, CommandFactory,
    FromArgMatches, Parser,
};
use std::{
    ffi::OsString,
    path::{absolute, PathBuf},
};

/// Command line interface options.
#[derive(Debug, Clone, Parser)]
#[command(
    about = "Copy template scripts into a user-specific folder of git repositories",
    override_usage = "dot-user-git [options] [repository]...",
    version
)]
pub struct Cli {
    /// Repositories to initialize, defaults to current directory.
    #[arg(value_name = "repository")]
    pub repositories: Vec<PathBuf>,

    /// Template directory holding executable scripts.
    #[arg(long = "template-dir", value_name = "path", env = "DOT_USER_GIT_UTIL_TEMPLATE_DIRECTORY")]
    pub template_dir: String,

    /// Target folder in repositories.
    #[arg(short, long, value_name = "name", env = "DOT_USER_GIT_UTIL_TARGET_FOLDER")]
    pub target_folder: String,

    /// Run prompts for each repository.
    #[arg(short, long, env = "DOT_USER_GIT_UTIL_PER_REPO_MODE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub per_repo_mode: bool,

    /// Yes for initial prompt.
    #[arg(short = 'y', long = "yes", env = "DOT_USER_GIT_UTIL_YES_INITIAL_PROMPT", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub yes_initial_prompt: bool,

    /// Yes for .gitignore prompt.
    #[arg(long = "gitignore-yes", env = "DOT_USER_GIT_UTIL_GITIGNORE_INCLUDE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub gitignore_include: bool,

    /// No for .gitignore prompt.
    #[arg(long = "gitignore-no", env = "DOT_USER_GIT_UTIL_GITIGNORE_OMIT", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub gitignore_omit: bool,

    /// Skip repositories where target folder already exists.
    #[arg(short = 'e', long, env = "DOT_USER_GIT_UTIL_SKIP_WHERE_TARGET_EXISTS", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub skip_where_target_exists: bool,

    /// Skip repositories where target folder is already in .gitignore.
    #[arg(short = 'g', long, env = "DOT_USER_GIT_UTIL_SKIP_WHERE_GITIGNORED", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub skip_where_gitignored: bool,

    /// Remove previous target folder contents on visit, and disable preselection.
    #[arg(short = 'f', long = "force-reinit", env = "DOT_USER_GIT_UTIL_FORCE_REINITIALIZE", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub force_reinitialize: bool,

    /// Preselect scripts found in at least one repository, no effect in per-repo mode.
    #[arg(short, long, env = "DOT_USER_GIT_UTIL_UNION_PRESELECTIONS", action = ArgAction::SetTrue, value_parser = BoolishValueParser::new())]
    pub union_preselections: bool,

    /// Gitignore decision resolved from both gitignore switches.
    #[arg(skip)]
    pub gitignore: GitignoreChoice,
}

impl Cli {
    /// Parse options from process arguments, exiting on failure.
    pub fn parse_args() -> Self {
        match Self::try_parse_args(std::env::args_os()) {
            Ok(cli) => cli,
            Err(error) => error.exit(),
        }
    }

    /// Parse options from given arguments.
    ///
    /// A gitignore switch given on the command line beats the opposite
    /// switch coming from the environment. Falsy environment values count
    /// as unset.
    ///
    /// # Errors
    ///
    /// - Return [`clap::Error`] if arguments are malformed, or both gitignore
    ///   switches are set from the same source.
    pub fn try_parse_args<I, T>(args: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let matches = Self::command().try_get_matches_from(args)?;
        let mut cli = Self::from_arg_matches(&matches)?;
        cli.gitignore = gitignore_choice(&matches)?;

        Ok(cli)
    }

    /// Validate options into settings and repositories.
    ///
    /// Template directory is shell expanded. Repository paths are made
    /// absolute, falling back to the current directory when none are given.
    ///
    /// # Errors
    ///
    /// - Return [`ValidationError::ShellExpansion`] if template directory
    ///   references an unset variable.
    /// - Return [`ValidationError::MissingTemplateDir`] if template directory
    ///   is not an existing directory.
    /// - Return [`ValidationError::Repository`] if target folder is invalid,
    ///   or a repository path is not a git repository.
    /// - Return [`ValidationError::Absolute`] if repository path cannot be
    ///   made absolute.
    pub fn validate(self) -> Result<(Settings, Vec<Repository>)> {
        let template_dir = PathBuf::from(shellexpand::full(&self.template_dir)?.into_owned());
        if !probe::directory_exists(&template_dir)? {
            return Err(ValidationError::MissingTemplateDir(template_dir));
        }

        let target = TargetFolder::new(self.target_folder)?;

        let inputs = if self.repositories.is_empty() {
            vec![PathBuf::from(".")]
        } else {
            self.repositories
        };
        let repositories = inputs
            .into_iter()
            .map(|input| -> Result<Repository> {
                let path = absolute(&input).map_err(|err| ValidationError::Absolute {
                    source: err,
                    path: input.clone(),
                })?;
                Ok(Repository::open(path)?)
            })
            .collect::<Result<Vec<_>>>()?;

        let settings = Settings {
            template_dir,
            target,
            per_repo_mode: self.per_repo_mode,
            yes_initial_prompt: self.yes_initial_prompt,
            gitignore: self.gitignore,
            skip_where_target_exists: self.skip_where_target_exists,
            skip_where_gitignored: self.skip_where_gitignored,
            force_reinitialize: self.force_reinitialize,
            union_preselections: self.union_preselections,
        };

        Ok((settings, repositories))
    }
}

/// Validated run settings.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Settings {
    /// Existing template directory.
    pub template_dir: PathBuf,

    /// Folder receiving scripts in each repository.
    pub target: TargetFolder,

    /// Process each repository as its own batch.
    pub per_repo_mode: bool,

    /// Auto-accept initial prompt.
    pub yes_initial_prompt: bool,

    /// How to decide on gitignore registration.
    pub gitignore: GitignoreChoice,

    /// Skip batch when every repository has a target folder.
    pub skip_where_target_exists: bool,

    /// Skip batch when every repository gitignores the target folder.
    pub skip_where_gitignored: bool,

    /// Purge target folder contents before copying, and preselect nothing.
    pub force_reinitialize: bool,

    /// Preselect entries found in at least one repository of a batch.
    pub union_preselections: bool,
}

impl Settings {
    /// Preselection resolution mode.
    pub fn preselection(&self) -> PreselectionMode {
        PreselectionMode::from_flags(self.force_reinitialize, self.union_preselections)
    }
}

/// Gitignore registration decision source.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum GitignoreChoice {
    /// Ask user unless already gitignored everywhere.
    #[default]
    Ask,

    /// Always register.
    Include,

    /// Never register.
    Omit,
}

fn gitignore_choice(matches: &ArgMatches) -> std::result::Result<GitignoreChoice, clap::Error> {
    let source_if_set = |id: &str| {
        matches
            .get_flag(id)
            .then(|| matches.value_source(id))
            .flatten()
    };

    let choice = match (source_if_set("gitignore_include"), source_if_set("gitignore_omit")) {
        (Some(include), Some(omit)) if include == omit => {
            return Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--gitignore-yes cannot be used with --gitignore-no",
            ));
        }
        (Some(include), Some(omit)) if omit > include => GitignoreChoice::Omit,
        (Some(_), _) => GitignoreChoice::Include,
        (None, Some(_)) => GitignoreChoice::Omit,
        (None, None) => GitignoreChoice::Ask,
    };

    Ok(choice)
}

/// Configuration validation error types.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    /// Template directory does not exist.
    #[error("template directory {:?} doesn't exist", .0.display())]
    MissingTemplateDir(PathBuf),

    /// Template directory path cannot be expanded.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Repository path cannot be made absolute.
    #[error("error resolving absolute path of input argument {:?}", path.display())]
    Absolute {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Repository or target folder is invalid.
    #[error(transparent)]
    Repository(#[from] RepoError),

    /// Template directory cannot be probed.
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// Friendly result alias :3
type Result<T, E = ValidationError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::{env::current_dir, fs};

    #[sealed_test(env = [
        ("DOT_USER_GIT_UTIL_TEMPLATE_DIRECTORY", "/env/templates"),
        ("DOT_USER_GIT_UTIL_TARGET_FOLDER", ".env-scripts"),
        ("DOT_USER_GIT_UTIL_PER_REPO_MODE", "1"),
        ("DOT_USER_GIT_UTIL_UNION_PRESELECTIONS", "true"),
        ("DOT_USER_GIT_UTIL_GITIGNORE_OMIT", "yes"),
    ])]
    fn environment_fills_options() -> anyhow::Result<()> {
        let cli = Cli::try_parse_args(["dot-user-git"])?;

        assert_eq!(cli.template_dir, "/env/templates");
        assert_eq!(cli.target_folder, ".env-scripts");
        assert!(cli.per_repo_mode);
        assert!(cli.union_preselections);
        assert!(cli.gitignore_omit);
        assert_eq!(cli.gitignore, GitignoreChoice::Omit);
        assert!(!cli.yes_initial_prompt);
        assert!(cli.repositories.is_empty());

        Ok(())
    }

    #[sealed_test(env = [
        ("DOT_USER_GIT_UTIL_TEMPLATE_DIRECTORY", "/env/templates"),
        ("DOT_USER_GIT_UTIL_TARGET_FOLDER", ".env-scripts"),
        ("DOT_USER_GIT_UTIL_FORCE_REINITIALIZE", "false"),
    ])]
    fn flags_override_environment() -> anyhow::Result<()> {
        let cli = Cli::try_parse_args([
            "dot-user-git",
            "--template-dir",
            "/flag/templates",
            "-t",
            ".flag-scripts",
            "-f",
            "repo-a",
            "repo-b",
        ])?;

        assert_eq!(cli.template_dir, "/flag/templates");
        assert_eq!(cli.target_folder, ".flag-scripts");
        assert!(cli.force_reinitialize);
        assert_eq!(
            cli.repositories,
            vec![PathBuf::from("repo-a"), PathBuf::from("repo-b")]
        );

        Ok(())
    }

    #[sealed_test]
    fn missing_required_options_fail() {
        assert!(Cli::try_parse_args(["dot-user-git", "-t", "scripts"]).is_err());
        assert!(Cli::try_parse_args(["dot-user-git", "--template-dir", "/x"]).is_err());
    }

    #[sealed_test]
    fn gitignore_flags_conflict() {
        let result = Cli::try_parse_args([
            "dot-user-git",
            "--template-dir",
            "/x",
            "-t",
            "scripts",
            "--gitignore-yes",
            "--gitignore-no",
        ]);
        assert!(matches!(result, Err(error) if error.kind() == ErrorKind::ArgumentConflict));
    }

    #[sealed_test(env = [
        ("DOT_USER_GIT_UTIL_GITIGNORE_INCLUDE", "1"),
        ("DOT_USER_GIT_UTIL_GITIGNORE_OMIT", "1"),
    ])]
    fn gitignore_environment_conflict() {
        let result = Cli::try_parse_args(["dot-user-git", "--template-dir", "/x", "-t", "scripts"]);
        assert!(matches!(result, Err(error) if error.kind() == ErrorKind::ArgumentConflict));
    }

    #[sealed_test(env = [("DOT_USER_GIT_UTIL_GITIGNORE_INCLUDE", "false")])]
    fn falsy_gitignore_environment_is_unset() -> anyhow::Result<()> {
        let cli = Cli::try_parse_args([
            "dot-user-git",
            "--template-dir",
            "/x",
            "-t",
            "scripts",
            "--gitignore-no",
        ])?;
        assert_eq!(cli.gitignore, GitignoreChoice::Omit);

        let cli = Cli::try_parse_args(["dot-user-git", "--template-dir", "/x", "-t", "scripts"])?;
        assert_eq!(cli.gitignore, GitignoreChoice::Ask);

        Ok(())
    }

    #[sealed_test(env = [("DOT_USER_GIT_UTIL_GITIGNORE_INCLUDE", "1")])]
    fn gitignore_flag_overrides_opposite_environment() -> anyhow::Result<()> {
        let cli = Cli::try_parse_args([
            "dot-user-git",
            "--template-dir",
            "/x",
            "-t",
            "scripts",
            "--gitignore-no",
        ])?;
        assert_eq!(cli.gitignore, GitignoreChoice::Omit);

        let cli = Cli::try_parse_args(["dot-user-git", "--template-dir", "/x", "-t", "scripts"])?;
        assert_eq!(cli.gitignore, GitignoreChoice::Include);

        Ok(())
    }

    #[sealed_test(env = [("DOT_USER_GIT_UTIL_GITIGNORE_OMIT", "on")])]
    fn gitignore_yes_flag_overrides_omit_environment() -> anyhow::Result<()> {
        let cli = Cli::try_parse_args([
            "dot-user-git",
            "--template-dir",
            "/x",
            "-t",
            "scripts",
            "--gitignore-yes",
        ])?;
        assert_eq!(cli.gitignore, GitignoreChoice::Include);

        Ok(())
    }

    #[sealed_test(env = [("TEMPLATES", "templates")])]
    fn validate_resolves_settings() -> anyhow::Result<()> {
        let cwd = current_dir()?;
        fs::create_dir_all("templates")?;
        fs::create_dir_all(".git")?;
        fs::create_dir_all("other/.git")?;

        let cli = Cli::try_parse_args([
            "dot-user-git",
            "--template-dir",
            "$TEMPLATES",
            "-t",
            ".scripts",
            "-u",
            "--gitignore-yes",
        ])?;
        let (settings, repos) = cli.validate()?;

        assert_eq!(settings.template_dir, PathBuf::from("templates"));
        assert_eq!(settings.target, TargetFolder::new(".scripts")?);
        assert_eq!(settings.gitignore, GitignoreChoice::Include);
        assert_eq!(settings.preselection(), PreselectionMode::Union);
        assert_eq!(repos, vec![Repository::open(cwd.join("."))?]);

        let cli = Cli::try_parse_args([
            "dot-user-git",
            "--template-dir",
            "templates",
            "-t",
            ".scripts",
            "-u",
            "-f",
            "other",
        ])?;
        let (settings, repos) = cli.validate()?;
        assert_eq!(settings.preselection(), PreselectionMode::ForceReset);
        assert_eq!(repos, vec![Repository::open(cwd.join("other"))?]);

        Ok(())
    }

    #[sealed_test]
    fn validate_rejects_bad_input() -> anyhow::Result<()> {
        fs::create_dir_all("templates")?;
        fs::create_dir_all("plain")?;

        let parse = |args: &[&str]| {
            let mut full = vec!["dot-user-git", "--template-dir", args[0], "-t", args[1]];
            full.extend(&args[2..]);
            Cli::try_parse_args(full)
        };

        let result = parse(&["missing", ".scripts", "plain"])?.validate();
        assert!(matches!(result, Err(ValidationError::MissingTemplateDir(_))));

        let result = parse(&["templates", ".scripts", "plain"])?.validate();
        assert!(matches!(
            result,
            Err(ValidationError::Repository(RepoError::NotRepository(_)))
        ));

        let result = parse(&["templates", "a/b", "plain"])?.validate();
        assert!(matches!(
            result,
            Err(ValidationError::Repository(RepoError::InvalidTargetFolder(_)))
        ));

        let result = parse(&["$UNSET_TEMPLATE_VAR", ".scripts"])?.validate();
        assert!(matches!(result, Err(ValidationError::ShellExpansion(_))));

        Ok(())
    }
}
