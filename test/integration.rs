// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{repositories, settings, template_dir, Answer, RepoFixture, ScriptedPrompter};

use dot_user_git::{
    config::GitignoreChoice,
    flow::{BatchOutcome, FlowError, Initializer, SkipReason, Stage, Templates},
    state::{self, StateError},
};

use anyhow::Result;
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;

#[sealed_test]
fn fresh_repository_starts_unselected() -> Result<()> {
    let settings = settings(template_dir(&[("a.sh", 0o755), ("b.sh", 0o755)])?)?;
    let fixture = RepoFixture::new("repo")?;
    let repos = repositories(&[&fixture])?;

    assert_eq!(state::target_presence(&repos, &settings.target)?, vec![false]);

    let templates = Templates::list(&settings)?;
    let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Pick(vec![true, true]), Answer::Yes]);
    let mut initializer = Initializer::new(&settings, templates, prompter);
    let summary = initializer.run(&repos)?;
    let prompter = initializer.into_prompter();

    assert_eq!(summary.outcomes, vec![BatchOutcome::Applied { gitignore: true }]);
    assert_eq!(prompter.preselections, vec![vec![false, false]]);
    assert!(prompter.questions[0].contains("[CREATE]"));
    assert_eq!(fixture.read(".scripts/a.sh")?, "#!/bin/sh\necho a.sh\n");
    assert_eq!(fixture.read(".gitignore")?, ".scripts/\n");
    assert!(fixture.is_ignored(".scripts/a.sh")?);

    Ok(())
}

#[sealed_test]
fn union_and_intersection_across_repositories() -> Result<()> {
    let mut settings = settings(template_dir(&[("a.sh", 0o755), ("b.sh", 0o755)])?)?;
    settings.gitignore = GitignoreChoice::Omit;
    let first = RepoFixture::new("first")?;
    let second = RepoFixture::new("second")?;
    first.write(".scripts/a.sh", "#!/bin/sh\n", 0o755)?;
    second.write(".scripts/a.sh", "#!/bin/sh\n", 0o755)?;
    second.write(".scripts/b.sh", "#!/bin/sh\n", 0o755)?;
    let repos = repositories(&[&first, &second])?;

    for (force, union, expect) in [
        (false, false, vec![true, false]),
        (false, true, vec![true, true]),
        (true, true, vec![false, false]),
    ] {
        settings.force_reinitialize = force;
        settings.union_preselections = union;
        let templates = Templates::list(&settings)?;
        let prompter = ScriptedPrompter::new([Answer::No]);
        let mut initializer = Initializer::new(&settings, templates, prompter);

        // Answering no to the initial prompt never reaches selection.
        assert_eq!(initializer.run(&repos)?.outcomes, vec![BatchOutcome::Stopped]);

        let templates = Templates::list(&settings)?;
        let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Quit]);
        let mut initializer = Initializer::new(&settings, templates, prompter);
        let summary = initializer.run(&repos)?;
        assert!(summary.aborted());
        assert_eq!(initializer.into_prompter().preselections, vec![expect]);
    }

    Ok(())
}

#[sealed_test]
fn non_executable_copy_fails_with_every_path() -> Result<()> {
    let mut settings = settings(template_dir(&[("a.sh", 0o755)])?)?;
    settings.yes_initial_prompt = true;
    let first = RepoFixture::new("first")?;
    let second = RepoFixture::new("second")?;
    first.write(".scripts/a.sh", "#!/bin/sh\n", 0o644)?;
    second.write(".scripts/a.sh", "#!/bin/sh\n", 0o600)?;
    let repos = repositories(&[&first, &second])?;

    let templates = Templates::list(&settings)?;
    let mut initializer = Initializer::new(&settings, templates, ScriptedPrompter::default());
    let error = initializer.run(&repos).unwrap_err();

    assert_eq!(error.stage(), Stage::SelectionPrompt);
    match error {
        FlowError::State {
            source: StateError::PermissionAggregate(failures),
            ..
        } => {
            assert_eq!(
                failures.paths(),
                &[
                    first.workdir().join(".scripts/a.sh"),
                    second.workdir().join(".scripts/a.sh"),
                ]
            );
        }
        other => panic!("expected aggregated permission error, got {other:?}"),
    }

    Ok(())
}

#[sealed_test]
fn gitignore_detection_needs_exact_line() -> Result<()> {
    let fixture = RepoFixture::new("repo")?;
    fixture.write(".gitignore", "build/\n", 0o644)?;
    let repos = repositories(&[&fixture])?;

    let target = dot_user_git::repo::TargetFolder::new("build")?;
    assert_eq!(state::gitignore_presence(&repos, &target)?, vec![true]);

    let target = dot_user_git::repo::TargetFolder::new("build2")?;
    assert_eq!(state::gitignore_presence(&repos, &target)?, vec![false]);

    Ok(())
}

#[sealed_test]
fn per_repo_mode_handles_each_repository() -> Result<()> {
    let mut settings = settings(template_dir(&[("a.sh", 0o755), ("b.sh", 0o755)])?)?;
    settings.per_repo_mode = true;
    settings.skip_where_gitignored = true;
    let done = RepoFixture::new("done")?;
    let skipped = RepoFixture::new("skipped")?;
    let fresh = RepoFixture::new("fresh")?;
    done.write(".gitignore", "target/\n.scripts/\n", 0o644)?;
    let repos = repositories(&[&done, &skipped, &fresh])?;

    let templates = Templates::list(&settings)?;
    let prompter = ScriptedPrompter::new([
        Answer::No,
        Answer::Yes,
        Answer::Pick(vec![false, true]),
        Answer::Yes,
    ]);
    let mut initializer = Initializer::new(&settings, templates, prompter);
    let summary = initializer.run(&repos)?;

    assert_eq!(
        summary.outcomes,
        vec![
            BatchOutcome::Skipped(SkipReason::Gitignored),
            BatchOutcome::Declined,
            BatchOutcome::Applied { gitignore: true },
        ]
    );
    assert!(!skipped.workdir().join(".scripts").exists());
    assert!(fresh.workdir().join(".scripts/b.sh").is_file());
    assert!(!fresh.workdir().join(".scripts/a.sh").exists());
    assert_eq!(fresh.read(".gitignore")?, ".scripts/\n");

    // Second pass skips everything that is now gitignored.
    let templates = Templates::list(&settings)?;
    let prompter = ScriptedPrompter::new([Answer::Yes, Answer::Pick(vec![true, true]), Answer::No]);
    let mut initializer = Initializer::new(&settings, templates, prompter);
    let summary = initializer.run(&repos)?;
    assert_eq!(
        summary.outcomes,
        vec![
            BatchOutcome::Skipped(SkipReason::Gitignored),
            BatchOutcome::Applied { gitignore: false },
            BatchOutcome::Skipped(SkipReason::Gitignored),
        ]
    );
    assert!(skipped.workdir().join(".scripts/a.sh").is_file());

    Ok(())
}

#[sealed_test]
fn apply_then_probe_is_all_present() -> Result<()> {
    let mut settings = settings(template_dir(&[("a.sh", 0o755), ("b.sh", 0o700), ("c.txt", 0o644)])?)?;
    settings.yes_initial_prompt = true;
    settings.gitignore = GitignoreChoice::Include;
    let first = RepoFixture::new("first")?;
    let second = RepoFixture::new("second")?;
    first.write(".gitignore", "node_modules/", 0o644)?;
    let repos = repositories(&[&first, &second])?;

    let templates = Templates::list(&settings)?;
    assert_eq!(templates.entries(), &["a.sh".to_string(), "b.sh".to_string()]);
    let prompter = ScriptedPrompter::new([Answer::Pick(vec![true, true])]);
    let mut initializer = Initializer::new(&settings, templates.clone(), prompter);
    initializer.run(&repos)?;

    for entry in templates.entries() {
        assert_eq!(
            state::executable_occurrence(&repos, &settings.target, entry)?,
            vec![true, true]
        );
    }
    assert_eq!(first.read(".gitignore")?, "node_modules/\n.scripts/\n");

    // Forced include on a second run never duplicates the pattern.
    let prompter = ScriptedPrompter::new([Answer::Pick(vec![true, true])]);
    let mut initializer = Initializer::new(&settings, templates, prompter);
    initializer.run(&repos)?;
    assert_eq!(first.read(".gitignore")?, "node_modules/\n.scripts/\n");
    assert_eq!(second.read(".gitignore")?, ".scripts/\n");

    Ok(())
}
