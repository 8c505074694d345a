use crate::common::command::{
    init_repository_dir, repository_dir, run_twig_command, twig_stdout,
};
use crate::common::file::{FileSpec, delete_path, write_file};
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn print_nothing_when_no_files_are_changed(init_repository_dir: TempDir) {
    let repository_dir = init_repository_dir;

    assert_eq!(twig_stdout(repository_dir.path(), &["status", "--porcelain"]), "");
    assert_eq!(
        twig_stdout(repository_dir.path(), &["status"]),
        "On branch master\nnothing to commit, working tree clean\n"
    );
}

#[rstest]
fn print_nothing_if_a_file_is_rewritten_with_the_same_content(init_repository_dir: TempDir) {
    let repository_dir = init_repository_dir;
    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "one".to_string()));

    assert_eq!(twig_stdout(repository_dir.path(), &["status", "--porcelain"]), "");
}

#[rstest]
fn list_untracked_files_in_name_order(repository_dir: TempDir) {
    run_twig_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    write_file(FileSpec::new(repository_dir.path().join("file.txt"), String::new()));
    write_file(FileSpec::new(repository_dir.path().join("another.txt"), String::new()));
    write_file(FileSpec::new(
        repository_dir.path().join("dir").join("nested.txt"),
        String::new(),
    ));

    assert_eq!(
        twig_stdout(repository_dir.path(), &["status", "--porcelain"]),
        "?? another.txt\n?? dir/nested.txt\n?? file.txt\n"
    );
}

#[rstest]
fn do_not_list_empty_untracked_directories(repository_dir: TempDir) -> Result<(), Box<dyn std::error::Error>> {
    run_twig_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    std::fs::create_dir_all(repository_dir.path().join("outer").join("inner"))?;

    assert_eq!(twig_stdout(repository_dir.path(), &["status", "--porcelain"]), "");

    Ok(())
}

#[rstest]
fn report_files_with_modified_contents(init_repository_dir: TempDir) {
    let repository_dir = init_repository_dir;
    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "changed".to_string()));
    write_file(FileSpec::new(
        repository_dir.path().join("a").join("2.txt"),
        "modified".to_string(),
    ));

    assert_eq!(
        twig_stdout(repository_dir.path(), &["status", "--porcelain"]),
        " M 1.txt\n M a/2.txt\n"
    );
}

#[rstest]
fn report_modified_files_with_unchanged_size(init_repository_dir: TempDir) {
    let repository_dir = init_repository_dir;
    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "uno".to_string()));

    assert_eq!(
        twig_stdout(repository_dir.path(), &["status", "--porcelain"]),
        " M 1.txt\n"
    );
}

#[rstest]
fn report_files_in_deleted_directories(init_repository_dir: TempDir) {
    let repository_dir = init_repository_dir;
    delete_path(&repository_dir.path().join("a"));

    assert_eq!(
        twig_stdout(repository_dir.path(), &["status", "--porcelain"]),
        " D a/2.txt\n D a/b/3.txt\n"
    );
}

#[rstest]
fn report_staged_changes_of_every_kind(init_repository_dir: TempDir) {
    let repository_dir = init_repository_dir;
    write_file(FileSpec::new(repository_dir.path().join("new.txt"), "new".to_string()));
    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "uno".to_string()));
    delete_path(&repository_dir.path().join("a").join("2.txt"));

    run_twig_command(repository_dir.path(), &["add", "new.txt", "1.txt", "a/2.txt"])
        .assert()
        .success();

    assert_eq!(
        twig_stdout(repository_dir.path(), &["status", "--porcelain"]),
        "M  1.txt\nD  a/2.txt\nA  new.txt\n"
    );
}

#[rstest]
fn staged_change_takes_precedence_over_a_later_edit(init_repository_dir: TempDir) {
    let repository_dir = init_repository_dir;
    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "uno".to_string()));
    run_twig_command(repository_dir.path(), &["add", "1.txt"])
        .assert()
        .success();
    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "eins".to_string()));

    assert_eq!(
        twig_stdout(repository_dir.path(), &["status", "--porcelain"]),
        "M  1.txt\n"
    );
}

#[rstest]
fn long_format_groups_changes_by_section(init_repository_dir: TempDir) {
    let repository_dir = init_repository_dir;
    write_file(FileSpec::new(repository_dir.path().join("new.txt"), "new".to_string()));
    run_twig_command(repository_dir.path(), &["add", "new.txt"])
        .assert()
        .success();
    write_file(FileSpec::new(repository_dir.path().join("1.txt"), "uno".to_string()));
    write_file(FileSpec::new(repository_dir.path().join("notes.md"), "notes".to_string()));

    let expected = "On branch master\n\
        Changes to be committed:\n        new file:   new.txt\n\n\
        Changes not staged for commit:\n        modified:   1.txt\n\n\
        Untracked files:\n        notes.md\n\n";

    assert_eq!(twig_stdout(repository_dir.path(), &["status"]), expected);
}

#[rstest]
fn metadata_directory_is_never_reported(repository_dir: TempDir) {
    run_twig_command(repository_dir.path(), &["init"])
        .assert()
        .success();
    write_file(FileSpec::new(
        repository_dir.path().join(".git").join("config"),
        String::new(),
    ));

    assert_eq!(twig_stdout(repository_dir.path(), &["status", "--porcelain"]), "");
}
