use assert_fs::TempDir;
use assert_fs::prelude::{FileWriteStr, PathChild};
use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use std::path::PathBuf;
use twig::areas::repository::Repository;
use twig::artifacts::objects::commit::Author;
use twig::artifacts::objects::object_id::ObjectId;
use twig::artifacts::status::file_change::FileStatus;
use twig::errors::{ErrorKind, TwigError};

fn author() -> Author {
    let timestamp = chrono::DateTime::parse_from_rfc3339("2024-03-01T09:30:00+02:00")
        .expect("valid timestamp");

    Author::new_with_timestamp("Tester".to_string(), "tester@example.com".to_string(), timestamp)
}

fn paths(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

#[fixture]
fn repository() -> (TempDir, Repository) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let mut repository =
        Repository::new(dir.path(), Box::new(std::io::sink())).expect("Failed to open repository");
    repository.init(None).expect("Failed to init repository");

    (dir, repository)
}

#[rstest]
fn hello_world_commit_tracks_the_file(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (dir, repository) = repository;
    dir.child("hello.txt").write_str("hello\n")?;

    repository.stage_all(&paths(&["hello.txt"]))?;
    let (commit_oid, commit) = repository.create_commit("Initial commit", author())?;

    assert!(commit.parents().is_empty());
    assert_eq!(repository.refs().read_head()?, Some(commit_oid.clone()));

    let files = repository.database().commit_files(&commit_oid)?;
    let blob_oid = ObjectId::try_parse("ce013625030ba8dba906f756967f9e9ca394464a".to_string())?;
    assert_eq!(files.get(&PathBuf::from("hello.txt")), Some(&blob_oid));
    assert!(repository.status_report()?.is_clean());

    Ok(())
}

#[rstest]
fn commits_chain_through_their_parents(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (dir, repository) = repository;

    let mut oids = Vec::new();
    for round in 0..3 {
        dir.child("counter.txt").write_str(&round.to_string())?;
        repository.stage_all(&paths(&["."]))?;
        let (oid, _) = repository.create_commit(&format!("round {round}"), author())?;
        oids.push(oid);
    }

    let history = repository
        .rev_list()?
        .map(|entry| entry.map(|(oid, _)| oid))
        .collect::<anyhow::Result<Vec<_>>>()?;
    oids.reverse();
    assert_eq!(history, oids);

    let limited = repository.rev_list()?.take(2).count();
    assert_eq!(limited, 2);

    Ok(())
}

#[rstest]
fn index_is_empty_after_a_commit(repository: (TempDir, Repository)) -> anyhow::Result<()> {
    let (dir, repository) = repository;
    dir.child("a.txt").write_str("a")?;

    repository.stage_all(&paths(&["a.txt"]))?;
    assert_eq!(repository.load_index()?.len(), 1);

    repository.create_commit("Add a", author())?;
    assert!(repository.load_index()?.is_empty());

    let error = repository
        .create_commit("Again", author())
        .expect_err("an unchanged tree must not be committed");
    assert_eq!(ErrorKind::classify(&error), ErrorKind::NothingStaged);

    Ok(())
}

#[rstest]
fn checkout_round_trips_between_branches(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (dir, repository) = repository;
    dir.child("shared.txt").write_str("shared")?;
    repository.stage_all(&paths(&["shared.txt"]))?;
    repository.create_commit("Base", author())?;

    repository.create_branch("feature")?;
    dir.child("docs").child("guide.md").write_str("guide")?;
    dir.child("shared.txt").write_str("shared, on feature")?;
    repository.stage_all(&paths(&["."]))?;
    repository.create_commit("Feature", author())?;

    repository.checkout_branch("master")?;
    assert!(!dir.child("docs").path().exists());
    assert_eq!(std::fs::read_to_string(dir.child("shared.txt").path())?, "shared");
    assert_eq!(repository.refs().current_branch()?.to_string(), "master");

    repository.checkout_branch("feature")?;
    assert_eq!(
        std::fs::read_to_string(dir.child("docs").child("guide.md").path())?,
        "guide"
    );
    assert!(repository.status_report()?.is_clean());

    Ok(())
}

#[rstest]
fn status_reports_one_category_per_path(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (dir, repository) = repository;
    dir.child("kept.txt").write_str("kept")?;
    dir.child("gone.txt").write_str("gone")?;
    repository.stage_all(&paths(&["."]))?;
    repository.create_commit("Base", author())?;

    dir.child("kept.txt").write_str("edited")?;
    std::fs::remove_file(dir.child("gone.txt").path())?;
    dir.child("fresh.txt").write_str("fresh")?;

    let status = repository.status_report()?;
    assert_eq!(status.get(&PathBuf::from("kept.txt")), Some(FileStatus::UnstagedModified));
    assert_eq!(status.get(&PathBuf::from("gone.txt")), Some(FileStatus::Deleted));
    assert_eq!(status.get(&PathBuf::from("fresh.txt")), Some(FileStatus::Untracked));
    assert!(!status.has_staged_changes());

    repository.stage_all(&paths(&["."]))?;

    let status = repository.status_report()?;
    assert_eq!(status.get(&PathBuf::from("kept.txt")), Some(FileStatus::StagedModified));
    assert_eq!(status.get(&PathBuf::from("gone.txt")), Some(FileStatus::StagedDeleted));
    assert_eq!(status.get(&PathBuf::from("fresh.txt")), Some(FileStatus::StagedNew));

    Ok(())
}

#[rstest]
fn deleting_the_current_branch_needs_a_fallback(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (_dir, repository) = repository;

    let error = repository
        .delete_branch("master")
        .expect_err("the default branch cannot fall back to itself");
    assert!(matches!(
        error.downcast_ref::<TwigError>(),
        Some(TwigError::CannotDeleteCurrentBranch(_))
    ));

    repository.create_branch("topic")?;
    assert_eq!(repository.delete_branch("topic")?, None);
    assert_eq!(repository.refs().current_branch()?.to_string(), "master");
    assert_eq!(
        repository
            .list_branches()?
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>(),
        vec!["master".to_string()]
    );

    Ok(())
}

#[rstest]
fn switch_branch_moves_head_only(repository: (TempDir, Repository)) -> anyhow::Result<()> {
    let (dir, repository) = repository;
    dir.child("a.txt").write_str("a")?;
    repository.stage_all(&paths(&["a.txt"]))?;
    repository.create_commit("Base", author())?;
    repository.create_branch("side")?;

    repository.switch_branch("master")?;
    assert_eq!(repository.refs().current_branch()?.to_string(), "master");
    assert!(dir.child("a.txt").path().exists());

    let error = repository.switch_branch("ghost").expect_err("missing branch");
    assert_eq!(ErrorKind::classify(&error), ErrorKind::BranchNotFound);

    Ok(())
}

#[rstest]
fn checkout_refuses_to_clobber_untracked_files(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (dir, repository) = repository;
    dir.child("x").write_str("tracked on master")?;
    repository.stage_all(&paths(&["x"]))?;
    repository.create_commit("Add x", author())?;

    repository.create_branch("feature")?;
    std::fs::remove_file(dir.child("x").path())?;
    repository.stage_all(&paths(&["x"]))?;
    repository.create_commit("Remove x", author())?;

    dir.child("x").child("precious.txt").write_str("keep me")?;
    assert_eq!(
        repository.status_report()?.get(&PathBuf::from("x/precious.txt")),
        Some(FileStatus::Untracked)
    );

    let error = repository.checkout_branch("master").expect_err("untracked file in the way");
    assert!(matches!(
        error.downcast_ref::<TwigError>(),
        Some(TwigError::UntrackedOverwrite(path)) if path == &PathBuf::from("x/precious.txt")
    ));
    assert_eq!(ErrorKind::classify(&error), ErrorKind::Usage);

    assert_eq!(
        std::fs::read_to_string(dir.child("x").child("precious.txt").path())?,
        "keep me"
    );
    assert_eq!(repository.refs().current_branch()?.to_string(), "feature");

    std::fs::remove_dir_all(dir.child("x").path())?;
    repository.checkout_branch("master")?;
    assert_eq!(std::fs::read_to_string(dir.child("x").path())?, "tracked on master");

    Ok(())
}

#[rstest]
fn author_that_would_corrupt_the_commit_is_refused(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (dir, repository) = repository;
    dir.child("a").write_str("a")?;
    repository.stage_all(&paths(&["a"]))?;

    let error = repository
        .resolve_author(Some("Eve\nmallory <e@x>"))
        .expect_err("line break in name");
    assert!(matches!(
        error.downcast_ref::<TwigError>(),
        Some(TwigError::InvalidAuthor(_))
    ));

    let timestamp = author().timestamp();
    let forged =
        Author::new_with_timestamp("Eve".to_string(), "e@x>\nparent".to_string(), timestamp);
    let error = repository.create_commit("one", forged).expect_err("forged email");
    assert_eq!(ErrorKind::classify(&error), ErrorKind::Usage);
    assert_eq!(repository.refs().read_head()?, None);

    let (commit_oid, _) = repository.create_commit("one", author())?;
    let history = repository
        .rev_list()?
        .map(|entry| entry.map(|(oid, _)| oid))
        .collect::<anyhow::Result<Vec<_>>>()?;
    assert_eq!(history, vec![commit_oid]);

    Ok(())
}

#[rstest]
fn configured_author_is_checked_before_committing(
    repository: (TempDir, Repository),
) -> anyhow::Result<()> {
    let (dir, repository) = repository;
    let config_path = repository.config_path();
    drop(repository);
    std::fs::write(&config_path, "[user]\nname = \"Eve <evil>\"\nemail = \"e@x\"\n")?;

    let repository = Repository::open(dir.path(), Box::new(std::io::sink()))?;
    let error = repository.resolve_author(None).expect_err("angle brackets in name");
    assert!(matches!(
        error.downcast_ref::<TwigError>(),
        Some(TwigError::InvalidAuthor(_))
    ));

    Ok(())
}
