use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

#[allow(deprecated)]
fn thoughtbot_bin() -> Command {
    Command::cargo_bin("thoughtbot").unwrap()
}

fn thoughtbot_cmd(data_file: &Path) -> Command {
    let mut cmd = thoughtbot_bin();
    cmd.env_remove("THOUGHTBOT_FILE")
        .env_remove("THOUGHTBOT_EMPTY_TAGS")
        .env_remove("THOUGHTBOT_WIDTH")
        .env("NO_COLOR", "1")
        .arg("--file")
        .arg(data_file);
    cmd
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_new_then_load() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    thoughtbot_cmd(&data)
        .args(["new", "--tag", "work", "finish", "report"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Thought 1 added"));

    thoughtbot_cmd(&data)
        .args(["new", "-t", "home", "-t", "errands", "buy milk"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Thought 2 added"));

    thoughtbot_cmd(&data)
        .args(["load", "work"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1       finish report"))
        .stdout(predicate::str::contains("buy milk").not());

    thoughtbot_cmd(&data)
        .args(["load"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1       finish report"))
        .stdout(predicate::str::contains("2       buy milk"));
}

#[test]
fn test_data_file_created_on_first_run() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("nested").join("data.json");

    thoughtbot_cmd(&data).args(["tags"]).assert().success();

    assert!(data.exists());
    let json = read_json(&data);
    assert_eq!(json["tags"], serde_json::json!({}));
    assert_eq!(json["entries"], serde_json::json!({}));
}

#[test]
fn test_data_file_from_environment() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("from-env.json");

    thoughtbot_bin()
        .env("THOUGHTBOT_FILE", &data)
        .env("NO_COLOR", "1")
        .args(["new", "-t", "idea", "try the env var"])
        .assert()
        .success();

    let json = read_json(&data);
    assert_eq!(json["entries"]["1"], "try the env var");
    assert_eq!(json["tags"]["idea"], serde_json::json!([1]));
}

#[test]
fn test_tags_listing() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    thoughtbot_cmd(&data)
        .args(["new", "-t", "work", "-t", "urgent", "finish report"])
        .assert()
        .success();
    thoughtbot_cmd(&data)
        .args(["new", "-t", "home", "buy milk"])
        .assert()
        .success();

    thoughtbot_cmd(&data)
        .args(["tags"])
        .assert()
        .success()
        .stdout(predicate::str::contains("work\nurgent\nhome"));

    thoughtbot_cmd(&data)
        .args(["tags", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("work urgent"));

    thoughtbot_cmd(&data)
        .args(["tags", "9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No entry with entry number 9"));
}

#[test]
fn test_new_rejects_marker_as_tag() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    thoughtbot_cmd(&data)
        .args(["new", "-t", "thought_", "sneaky"])
        .assert()
        .failure();

    thoughtbot_cmd(&data).args(["tags"]).assert().success().stdout(predicate::str::contains("thought_").not());
}

#[test]
fn test_load_rejects_marker_as_tag() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    thoughtbot_cmd(&data)
        .args(["new", "-t", "work", "finish report"])
        .assert()
        .success();

    thoughtbot_cmd(&data)
        .args(["load", "work", "thought_"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid tag: \"thought_\""));

    // The shell rejects it the same way
    thoughtbot_cmd(&data)
        .write_stdin("load thought_\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("Invalid tag: \"thought_\""));
}

#[test]
fn test_delete_requires_force_without_terminal() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    thoughtbot_cmd(&data)
        .args(["new", "-t", "work", "finish report"])
        .assert()
        .success();

    thoughtbot_cmd(&data)
        .args(["delete", "1"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    assert_eq!(read_json(&data)["entries"]["1"], "finish report");

    thoughtbot_cmd(&data)
        .args(["delete", "1", "--force"])
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::contains("Thought 1 deleted"));

    let json = read_json(&data);
    assert_eq!(json["entries"], serde_json::json!({}));
    assert_eq!(json["tags"], serde_json::json!({}));

    thoughtbot_cmd(&data)
        .args(["delete", "1", "--force"])
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No entry with entry number 1"));
}

#[test]
fn test_ids_not_reused_after_delete() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    thoughtbot_cmd(&data).args(["new", "-t", "a", "one"]).assert().success();
    thoughtbot_cmd(&data).args(["new", "-t", "a", "two"]).assert().success();
    thoughtbot_cmd(&data)
        .args(["delete", "2", "--force"])
        .write_stdin("")
        .assert()
        .success();

    thoughtbot_cmd(&data)
        .args(["new", "-t", "a", "three"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Thought 3 added"));
}

#[test]
fn test_edit() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    thoughtbot_cmd(&data)
        .args(["new", "-t", "b", "-t", "c", "draft"])
        .assert()
        .success();

    thoughtbot_cmd(&data)
        .args(["edit", "1", "--tag", "a", "--tag", "b", "--text", "final"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Thought 1 updated"));

    let json = read_json(&data);
    assert_eq!(json["entries"]["1"], "final");
    assert_eq!(json["tags"]["a"], serde_json::json!([1]));
    assert_eq!(json["tags"]["b"], serde_json::json!([1]));
    assert!(json["tags"].get("c").is_none());

    thoughtbot_cmd(&data)
        .args(["edit", "1", "--clear-tags"])
        .assert()
        .success();
    assert_eq!(read_json(&data)["tags"], serde_json::json!({}));

    thoughtbot_cmd(&data)
        .args(["edit", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Nothing to edit"));
}

#[test]
fn test_width_wraps_text() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    thoughtbot_cmd(&data)
        .args(["new", "-t", "t", "alpha beta gamma delta"])
        .assert()
        .success();

    thoughtbot_cmd(&data)
        .args(["--width", "20", "load"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1       alpha beta\n        gamma delta\n"));
}

#[test]
fn test_piped_shell_session() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    let input = "\
new work thought_ finish report
new home thought_ buy milk

load
bogus
delete 1
tags
exit
new never thought_ reached
";

    thoughtbot_cmd(&data)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("1       finish report"))
        .stdout(predicate::str::contains("2       buy milk"))
        .stdout(predicate::str::contains("Thought 1 deleted"))
        .stdout(predicate::str::contains("home"))
        .stderr(predicate::str::contains("Unknown command"));

    let json = read_json(&data);
    assert_eq!(json["entries"], serde_json::json!({"2": "buy milk"}));
    assert_eq!(json["tags"], serde_json::json!({"home": [2]}));
}

#[test]
fn test_shell_errors_do_not_stop_the_session() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    let input = "\
new work finish report
new work thought_
edit 4 thought_ nope
new work thought_ finally
";

    thoughtbot_cmd(&data)
        .arg("shell")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains("Thought 1 added"))
        .stderr(predicate::str::contains("Missing `thought_` marker"))
        .stderr(predicate::str::contains("No thought given"))
        .stderr(predicate::str::contains("No entry with entry number 4"));
}

#[test]
fn test_empty_tags_policy() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");
    let input = "new a b thought_ one\nedit 1 tags_ thought_ renamed\n";

    thoughtbot_cmd(&data).write_stdin(input).assert().success();
    let json = read_json(&data);
    assert_eq!(json["entries"]["1"], "renamed");
    assert_eq!(json["tags"]["a"], serde_json::json!([1]));

    let cleared = temp.path().join("cleared.json");
    thoughtbot_cmd(&cleared)
        .args(["--empty-tags", "clear"])
        .write_stdin(input)
        .assert()
        .success();
    let json = read_json(&cleared);
    assert_eq!(json["entries"]["1"], "renamed");
    assert_eq!(json["tags"], serde_json::json!({}));
}

#[test]
fn test_help_in_shell() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data.json");

    thoughtbot_cmd(&data)
        .write_stdin("help\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("thought_ <text>"));
}
