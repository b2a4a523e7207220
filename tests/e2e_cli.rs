//! End-to-end tests of the `yabt` binary.

mod common;

use common::cli::{YabtWorkspace, run_yabt, run_yabt_with_env};
use std::fs;

fn add_user(ws: &YabtWorkspace, first: &str, last: &str) -> String {
    let email = format!("{}@springfield.test", first.to_lowercase());
    let run = run_yabt(
        ws,
        [
            "--json",
            "user",
            "add",
            "--first-name",
            first,
            "--last-name",
            last,
            "--email",
            &email,
        ],
        &format!("user_add_{first}"),
    );
    assert!(run.status.success(), "user add failed: {}", run.stderr);
    run.json()["id"].as_str().unwrap().to_string()
}

#[test]
fn e2e_item_create_list_and_show() {
    let ws = YabtWorkspace::new();
    let homer = add_user(&ws, "Homer", "Simpson");
    assert_eq!(homer, "1-A");

    let create = run_yabt(
        &ws,
        [
            "--json", "--user", "1-A", "item", "create", "Fix the TV", "-t", "bug", "--tag",
            "home,urgent", "--severity", "major",
        ],
        "item_create",
    );
    assert!(create.status.success(), "create failed: {}", create.stderr);
    let created = create.json();
    assert_eq!(created["id"], "1-A");
    assert_eq!(created["type"], "bug");
    assert_eq!(created["severity"], "major");
    assert!(ws.root.join("yabt.db").exists());

    let list = run_yabt(&ws, ["--json", "item", "list", "--tag", "URGENT"], "item_list");
    assert!(list.status.success(), "list failed: {}", list.stderr);
    let page = list.json();
    assert_eq!(page["totalRecords"], 1);
    assert_eq!(page["entries"][0]["title"], "Fix the TV");

    let show = run_yabt(&ws, ["item", "show", "1-A"], "item_show");
    assert!(show.status.success());
    assert!(show.stdout.contains("Fix the TV"));
    assert!(show.stdout.contains("by Simpson, H."));
}

#[test]
fn e2e_state_assign_and_comment() {
    let ws = YabtWorkspace::new();
    add_user(&ws, "Homer", "Simpson");
    add_user(&ws, "Marge", "Simpson");
    let create = run_yabt(&ws, ["-u", "1-A", "item", "create", "Paint fence"], "create");
    assert!(create.status.success(), "{}", create.stderr);
    assert!(create.stdout.contains("Created 1-A: Paint fence"));

    let state = run_yabt(&ws, ["-u", "1-A", "item", "state", "1-A", "inProgress"], "state");
    assert!(state.status.success(), "{}", state.stderr);
    assert!(state.stdout.contains("1-A is now inProgress"));

    let assign = run_yabt(&ws, ["-u", "1-A", "item", "assign", "1-A", "2-A"], "assign");
    assert!(assign.status.success());
    assert!(assign.stdout.contains("Assigned 1-A to Marge Simpson"));

    let comment = run_yabt(
        &ws,
        ["--json", "-u", "2-A", "comment", "add", "1-A", "Use the blue paint"],
        "comment_add",
    );
    assert!(comment.status.success(), "{}", comment.stderr);
    let comment_id = comment.json()["id"].as_str().unwrap().to_string();

    let forbidden = run_yabt(
        &ws,
        ["-u", "1-A", "comment", "delete", "1-A", &comment_id],
        "comment_delete_forbidden",
    );
    assert_eq!(forbidden.status.code(), Some(4));
    assert!(forbidden.stderr.contains("FORBIDDEN"));

    let listed = run_yabt(&ws, ["--json", "comment", "list", "1-A"], "comment_list");
    assert_eq!(listed.json()[0]["message"], "Use the blue paint");
}

#[test]
fn e2e_user_rename_and_delete_follow_into_items() {
    let ws = YabtWorkspace::new();
    add_user(&ws, "Homer", "Simpson");
    let create = run_yabt(
        &ws,
        ["-u", "1-A", "item", "create", "Eat donut", "--assignee", "1-A"],
        "create",
    );
    assert!(create.status.success(), "{}", create.stderr);

    let rename = run_yabt(&ws, ["user", "update", "1-A", "--first-name", "Max", "--last-name", "Power"], "rename");
    assert!(rename.status.success(), "{}", rename.stderr);

    let show = run_yabt(&ws, ["--json", "item", "show", "1-A"], "show_renamed");
    assert_eq!(show.json()["assignee"]["fullName"], "Max Power");

    let delete = run_yabt(&ws, ["user", "delete", "1-A"], "delete_user");
    assert!(delete.status.success(), "{}", delete.stderr);

    let show = run_yabt(&ws, ["--json", "item", "show", "1-A"], "show_deleted");
    let item = show.json();
    assert!(item["assignee"].is_null());
    assert!(item["created"]["actionedBy"]["id"].is_null());
    assert_eq!(item["created"]["actionedBy"]["fullName"], "Max Power");
}

#[test]
fn e2e_errors_set_exit_codes() {
    let ws = YabtWorkspace::new();

    let missing_db = run_yabt(&ws, ["item", "list"], "missing_db");
    assert_eq!(missing_db.status.code(), Some(2));
    assert!(missing_db.stderr.contains("DATABASE_NOT_FOUND"));

    add_user(&ws, "Homer", "Simpson");

    let no_user = run_yabt(&ws, ["item", "create", "Anonymous"], "no_user");
    assert_eq!(no_user.status.code(), Some(4));
    assert!(no_user.stderr.contains("CURRENT_USER_REQUIRED"));

    let not_found = run_yabt(&ws, ["item", "show", "9-A"], "not_found");
    assert_eq!(not_found.status.code(), Some(3));
    assert!(not_found.stderr.contains("BACKLOG_ITEM_NOT_FOUND"));

    let bad_state = run_yabt(&ws, ["-u", "1-A", "item", "list", "--state", "someday"], "bad_state");
    assert_eq!(bad_state.status.code(), Some(4));
    assert!(bad_state.stderr.contains("INVALID_STATE"));
}

#[test]
fn e2e_current_user_from_config_and_env() {
    let ws = YabtWorkspace::new();
    add_user(&ws, "Homer", "Simpson");
    add_user(&ws, "Marge", "Simpson");

    fs::write(ws.root.join("yabt.yaml"), "current-user: 1-A\n").unwrap();
    let from_config = run_yabt(&ws, ["--json", "item", "create", "Configured"], "from_config");
    assert!(from_config.status.success(), "{}", from_config.stderr);
    assert_eq!(from_config.json()["created"]["actionedBy"]["id"], "1-A");

    let from_env = run_yabt_with_env(
        &ws,
        ["--json", "item", "create", "From env"],
        [("YABT_CURRENT_USER", "2-A")],
        "from_env",
    );
    assert!(from_env.status.success(), "{}", from_env.stderr);
    assert_eq!(from_env.json()["created"]["actionedBy"]["id"], "2-A");

    let from_flag = run_yabt_with_env(
        &ws,
        ["--json", "--user", "1-A", "item", "create", "From flag"],
        [("YABT_CURRENT_USER", "2-A")],
        "from_flag",
    );
    assert_eq!(from_flag.json()["created"]["actionedBy"]["id"], "1-A");
}

#[test]
fn e2e_custom_field_values() {
    let ws = YabtWorkspace::new();
    add_user(&ws, "Homer", "Simpson");

    let field = run_yabt(
        &ws,
        ["--json", "field", "add", "Budget", "--type", "numeric", "--for", "feature,task"],
        "field_add",
    );
    assert!(field.status.success(), "{}", field.stderr);
    assert_eq!(field.json()["id"], "1-A");

    let create = run_yabt(
        &ws,
        ["--json", "-u", "1-A", "item", "create", "Bowling alley", "-t", "feature", "-f", "1-A=2500"],
        "create_with_field",
    );
    assert!(create.status.success(), "{}", create.stderr);
    assert_eq!(create.json()["customFields"][0]["value"], 2500);

    let wrong_type = run_yabt(
        &ws,
        ["-u", "1-A", "item", "create", "Bad budget", "-t", "task", "-f", "1-A=lots"],
        "create_bad_field",
    );
    assert_eq!(wrong_type.status.code(), Some(4));

    let delete = run_yabt(&ws, ["field", "delete", "1-A"], "field_delete");
    assert!(delete.status.success(), "{}", delete.stderr);
    let show = run_yabt(&ws, ["--json", "item", "show", "1-A"], "show_after_field_delete");
    assert_eq!(show.json()["customFields"], serde_json::json!([]));
}

#[test]
fn e2e_completions_emit_script() {
    let ws = YabtWorkspace::new();
    let run = run_yabt(&ws, ["completions", "bash"], "completions");
    assert!(run.status.success());
    assert!(run.stdout.contains("_yabt"));
}

#[test]
fn e2e_version_and_help() {
    use assert_cmd::Command;
    use predicates::prelude::*;

    let ws = YabtWorkspace::new();
    Command::new(assert_cmd::cargo::cargo_bin!("yabt"))
        .current_dir(&ws.root)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("yabt "));

    Command::new(assert_cmd::cargo::cargo_bin!("yabt"))
        .current_dir(&ws.root)
        .args(["item", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("create").and(predicate::str::contains("assign")));
}
