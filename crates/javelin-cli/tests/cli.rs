use assert_cmd::Command;
use predicates::prelude::*;

fn javelin() -> Command {
    Command::cargo_bin("javelin").expect("binary builds")
}

fn dirty_file(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("Dirty.java");
    std::fs::write(&path, "class Dirty {   \n}").unwrap();
    path
}

#[test]
fn check_reports_violations_and_exits_one() {
    let dir = tempfile::tempdir().unwrap();
    let path = dirty_file(&dir);

    javelin()
        .arg("check")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("trailing-whitespace"))
        .stdout(predicate::str::contains("final-newline"));

    // Check mode never touches the file.
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "class Dirty {   \n}"
    );
}

#[test]
fn clean_file_exits_zero() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Clean.java");
    std::fs::write(&path, "class Clean {}\n").unwrap();

    javelin()
        .arg("check")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 violations"));
}

#[test]
fn fix_rewrites_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let path = dirty_file(&dir);

    javelin().arg("fix").arg(&path).assert().success();

    let fixed = std::fs::read_to_string(&path).unwrap();
    assert_eq!(fixed, "class Dirty {\n}\n");
}

#[test]
fn json_output_is_a_well_formed_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let path = dirty_file(&dir);

    let output = javelin()
        .arg("check")
        .arg("--json")
        .arg(&path)
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();

    let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert!(value["violations"].is_array());
    assert!(value["summary"]["total"].as_u64().unwrap() >= 2);
    assert!(value["summary"]["byRule"]["trailing-whitespace"].is_number());
}

#[test]
fn parse_dumps_the_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("A.java");
    std::fs::write(&path, "class A {}\n").unwrap();

    javelin()
        .arg("parse")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("CompilationUnit"))
        .stdout(predicate::str::contains("ClassDeclaration"));
}

#[test]
fn missing_paths_are_a_usage_error() {
    javelin().arg("check").assert().code(2);
}

#[test]
fn directories_are_searched_for_java_files() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("src").join("main");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(nested.join("A.java"), "class A {}\n").unwrap();
    std::fs::write(nested.join("README.md"), "not java\n").unwrap();

    javelin()
        .arg("check")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("in 1 files"));
}
