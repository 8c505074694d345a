use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const AUTHOR_NAME: &str = "fake_user";
pub const AUTHOR_EMAIL: &str = "fake_email@email.com";
pub const AUTHOR_DATE: &str = "2023-01-01 12:00:00 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Repository with one commit holding `1.txt`, `a/2.txt` and `a/b/3.txt`
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_twig_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    let file1 = FileSpec::new(repository_dir.path().join("1.txt"), "one".to_string());
    write_file(file1);

    let file2 = FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "two".to_string(),
    );
    write_file(file2);

    let file3 = FileSpec::new(
        repository_dir.path().join("a").join("b").join("3.txt"),
        "three".to_string(),
    );
    write_file(file3);

    run_twig_command(repository_dir.path(), &["add", "."])
        .assert()
        .success();

    twig_commit(repository_dir.path(), "Initial commit")
        .assert()
        .success();

    repository_dir
}

pub fn run_twig_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("twig").expect("Failed to find twig binary");
    cmd.env_remove("TWIG_LOG");
    cmd.env("NO_COLOR", "1");
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn twig_commit(dir: &Path, message: &str) -> Command {
    let mut cmd = run_twig_command(dir, &["commit", "-m", message]);
    cmd.envs(vec![
        ("TWIG_AUTHOR_NAME", AUTHOR_NAME),
        ("TWIG_AUTHOR_EMAIL", AUTHOR_EMAIL),
        ("TWIG_AUTHOR_DATE", AUTHOR_DATE), // %Y-%m-%d %H:%M:%S %z
    ]);
    cmd
}

/// Stdout of a successful command
pub fn twig_stdout(dir: &Path, args: &[&str]) -> String {
    let output = run_twig_command(dir, args).assert().success();

    String::from_utf8(output.get_output().stdout.clone()).expect("stdout is not UTF-8")
}

/// Full id of the current branch tip, read through `log`
pub fn head_oid(dir: &Path) -> String {
    let stdout = twig_stdout(dir, &["log", "-n", "1", "--no-pager"]);

    stdout
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("commit "))
        .expect("log printed no commit")
        .to_string()
}
