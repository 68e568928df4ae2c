use assert_cmd::Command;
use predicates::prelude::*;

fn bridge() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mcp-relay-bridge"));
    cmd.env_remove("MCP_API_KEY")
        .env_remove("LOG_LEVEL")
        .env_remove("LOG_FORMAT");
    cmd
}

#[test]
fn test_help_names_endpoint() {
    bridge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("ENDPOINT"))
        .stdout(predicate::str::contains("--debug"));
}

#[test]
fn test_missing_endpoint_fails() {
    bridge().assert().failure();
}

#[test]
fn test_invalid_endpoint_fails_before_serving() {
    bridge()
        .arg("not a url")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid endpoint URL"));

    bridge()
        .arg("ftp://relay.example.com")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("must use http or https"));
}

#[test]
fn test_empty_stdin_exits_cleanly() {
    // Nothing on stdout besides protocol frames
    bridge()
        .arg("http://127.0.0.1:1")
        .write_stdin("")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_invalid_log_level_rejected() {
    bridge()
        .arg("http://127.0.0.1:1")
        .env("LOG_LEVEL", "loud")
        .write_stdin("")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid LOG_LEVEL"));
}

#[test]
fn test_unreachable_endpoint_lists_nothing_and_logs() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":1,"method":"tools/list"}"#,
        "\n"
    );
    bridge()
        .arg("http://127.0.0.1:1")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""tools":[]"#))
        .stdout(predicate::str::contains(r#""id":1"#))
        .stderr(predicate::str::contains("Forwarding failed"))
        .stderr(predicate::str::contains("Successfully loaded 0 tools"));
}

#[test]
fn test_local_replies_survive_closed_stdin() {
    let input = concat!(
        r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#,
        "\n"
    );
    bridge()
        .arg("http://127.0.0.1:1")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id":7"#))
        .stdout(predicate::str::contains(r#""result":{}"#));
}
