//! CLI tests for the teachkit binary.
//!
//! Spawns the binary with an explicit working directory and environment and
//! checks exit codes, stdout and the files left behind.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use teachkit::exit_codes;
use teachkit::test_support::TestGroup;

fn teachkit(cwd: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_teachkit"));
    cmd.current_dir(cwd)
        .args(args)
        .arg("--install-config")
        .arg(cwd.join("no-install-config.toml"))
        .env_remove("RUST_LOG")
        .env("NAMING_PLATFORM", "posix");
    cmd
}

fn run(cmd: &mut Command) -> Output {
    cmd.output().expect("spawn teachkit")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn group_add_creates_layout() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = run(&mut teachkit(
        temp.path(),
        &["group", "add", "Morning Group", "--name", "Morning Group", "--code", "MG"],
    ));

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let root = temp.path().join("morning_group");
    for dir in [".metadata/config", ".metadata/logs", ".metadata/unenrolled", "~resources"] {
        assert!(root.join(dir).is_dir(), "{dir}");
    }
    let group = fs::read_to_string(root.join(".metadata/config/group.toml")).expect("group file");
    assert!(group.contains("[group]"));
    assert!(group.contains("code = \"MG\""));
}

#[test]
fn student_commands_inside_group() {
    let group = TestGroup::new();

    let output = run(&mut teachkit(group.root(), &["student", "add", "Ana", "Ruiz"]));
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(group.root().join("ana_ruiz").is_dir());

    let output = run(&mut teachkit(group.root(), &["student", "list"]));
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let listing = stdout(&output);
    assert!(listing.lines().next().is_some_and(|line| line.starts_with("P  C. date")));
    assert!(listing.contains("ana_ruiz"));

    let log = group.root().join(".metadata/logs/teachkit.log");
    let log = fs::read_to_string(log).expect("log file");
    assert!(log.contains("student enrolled"));
}

#[test]
fn workspace_flag_selects_root() {
    let group = TestGroup::new();

    let output = run(&mut teachkit(group.parent(), &["-C", "group", "group", "print"]));

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(stdout(&output).contains("Name......: Test Group"));
}

#[test]
fn commands_outside_a_workspace_fail() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = run(&mut teachkit(temp.path(), &["student", "list"]));

    assert_eq!(output.status.code(), Some(exit_codes::NOT_A_WORKSPACE));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("teachkit: the provided folder"));
}

#[test]
fn deleting_group_from_inside_is_refused() {
    let group = TestGroup::new();
    let inside = group.root().join("~resources");

    let output = run(&mut teachkit(&inside, &["group", "del", ".."]));

    assert_eq!(output.status.code(), Some(exit_codes::POLICY));
    assert!(group.root().join(".metadata").is_dir());

    let output = run(&mut teachkit(group.parent(), &["group", "del", "group"]));
    assert_eq!(output.status.code(), Some(exit_codes::OK));
    assert!(!group.root().exists());
}

#[test]
fn config_show_applies_environment_and_flags() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = run(
        teachkit(temp.path(), &["config", "show", "--min-word-length", "3"])
            .env("NAMING_MAX_LEN", "40")
            .env("NAMING_UNIDECODE", "maybe"),
    );

    assert_eq!(output.status.code(), Some(exit_codes::OK));
    let shown = stdout(&output);
    assert!(shown.contains("max_len = 40"));
    assert!(shown.contains("min_word_length = 3"));
    assert!(shown.contains("unidecode = true"));
}

#[test]
fn deleting_missing_resource_is_not_found() {
    let group = TestGroup::new();

    let output = run(&mut teachkit(group.root(), &["resource", "del", "missing"]));

    assert_eq!(output.status.code(), Some(exit_codes::NOT_A_WORKSPACE));
}
