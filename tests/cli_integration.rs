// CLI integration tests for the apply/arch/fetch flows.
use std::process::Command;

use serde_json::Value;

fn cmd() -> Command {
    let exe = env!("CARGO_BIN_EXE_linkhook");
    Command::new(exe)
}

fn parse_json(value: &str) -> Value {
    serde_json::from_str(value).expect("valid json")
}

#[test]
fn apply_reports_links_and_fired_hooks() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        temp.path().join("lib.json"),
        r#"{"on_linked_as_dependency": [{"set_property": {"name": "uses-lib", "value": "1"}}]}"#,
    )
    .expect("write hook");
    let manifest = temp.path().join("build.json");
    std::fs::write(
        &manifest,
        r#"{
            "targets": [
                {"name": "app"},
                {"name": "lib", "hooks": ["lib.json"]},
                {"name": "headers", "kind": "interface-only"}
            ],
            "links": [
                {"consumer": "app", "args": ["lib", "PRIVATE", "m", "INTERFACE", "headers"]}
            ]
        }"#,
    )
    .expect("write manifest");

    let output = cmd()
        .args(["apply", manifest.to_str().unwrap(), "--json"])
        .output()
        .expect("apply");
    assert!(output.status.success());

    let report = parse_json(std::str::from_utf8(&output.stdout).expect("utf8"));
    let links = report["report"]["links"].as_array().expect("links");
    assert_eq!(links.len(), 3);
    assert_eq!(links[0]["dep"], "lib");
    assert_eq!(links[0]["scope"], "public");
    assert_eq!(links[0]["external"], false);
    assert_eq!(links[1]["dep"], "m");
    assert_eq!(links[1]["scope"], "private");
    assert_eq!(links[1]["external"], true);
    assert_eq!(links[2]["dep"], "headers");
    assert_eq!(links[2]["scope"], "interface");

    let fired = report["report"]["fired_hooks"].as_array().expect("fired");
    assert_eq!(fired.len(), 1);
    assert!(fired[0].as_str().unwrap().ends_with("lib.json"));

    let targets = report["report"]["targets"].as_array().expect("targets");
    let app = targets
        .iter()
        .find(|target| target["name"] == "app")
        .expect("app");
    assert_eq!(app["properties"]["uses-lib"], "1");
}

#[test]
fn apply_missing_manifest_exits_with_not_found() {
    let output = cmd()
        .args(["apply", "/nonexistent/build.json"])
        .output()
        .expect("apply");
    assert_eq!(output.status.code(), Some(3));
    let error = parse_json(std::str::from_utf8(&output.stderr).expect("utf8"));
    assert_eq!(error["error"]["kind"], "NotFound");
}

#[test]
fn apply_broken_hook_file_is_fatal() {
    let temp = tempfile::tempdir().expect("tempdir");
    std::fs::write(temp.path().join("bad.json"), "{not json").expect("write hook");
    let manifest = temp.path().join("build.json");
    std::fs::write(
        &manifest,
        r#"{
            "targets": [{"name": "app"}, {"name": "lib", "hooks": ["bad.json"]}],
            "links": [{"consumer": "app", "args": ["lib"]}]
        }"#,
    )
    .expect("write manifest");

    let output = cmd()
        .args(["apply", manifest.to_str().unwrap()])
        .output()
        .expect("apply");
    assert_eq!(output.status.code(), Some(5));
    let error = parse_json(std::str::from_utf8(&output.stderr).expect("utf8"));
    assert_eq!(error["error"]["kind"], "Malformed");
}

#[test]
fn arch_probe_emits_cpu_and_platform() {
    let output = cmd()
        .args(["arch", "/usr/bin/aarch64-linux-gnu-gcc", "--json"])
        .output()
        .expect("arch");
    assert!(output.status.success());
    let value = parse_json(std::str::from_utf8(&output.stdout).expect("utf8"));
    assert_eq!(value["arch"]["cpu"], "aarch64");
    assert_eq!(value["arch"]["platform"], "linux");
}

#[test]
fn arch_probe_unrecognized_compiler_is_fatal() {
    let output = cmd()
        .args(["arch", "/opt/weird/mycompiler"])
        .output()
        .expect("arch");
    assert_eq!(output.status.code(), Some(6));
    let error = parse_json(std::str::from_utf8(&output.stderr).expect("utf8"));
    assert_eq!(error["error"]["kind"], "Toolchain");
}

#[cfg(unix)]
#[test]
fn fetch_js_succeeds_with_zero_exit_program() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = cmd()
        .args([
            "fetch",
            "js",
            "--dir",
            temp.path().to_str().unwrap(),
            "--program",
            "true",
        ])
        .output()
        .expect("fetch");
    assert!(output.status.success());
}

#[cfg(unix)]
#[test]
fn fetch_native_nonzero_exit_is_fatal() {
    let temp = tempfile::tempdir().expect("tempdir");
    let output = cmd()
        .args([
            "fetch",
            "native",
            "--dir",
            temp.path().to_str().unwrap(),
            "--program",
            "false",
        ])
        .output()
        .expect("fetch");
    assert_eq!(output.status.code(), Some(7));
    let error = parse_json(std::str::from_utf8(&output.stderr).expect("utf8"));
    assert_eq!(error["error"]["kind"], "Process");
}

#[test]
fn bare_invocation_prints_help_not_an_error_envelope() {
    let output = cmd().output().expect("run");
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage: linkhook"));
    assert!(serde_json::from_str::<Value>(&stderr).is_err());
}

#[test]
fn missing_argument_yields_one_line_message_and_hint() {
    let output = cmd().arg("apply").output().expect("run");
    assert_eq!(output.status.code(), Some(2));
    let error = parse_json(std::str::from_utf8(&output.stderr).expect("utf8"));
    let message = error["error"]["message"].as_str().expect("message");
    assert!(!message.contains('\n'));
    assert!(message.contains("required argument"));
    assert_eq!(error["error"]["hint"], "Try `linkhook apply --help`.");
}

#[test]
fn completion_writes_a_script() {
    let output = cmd().args(["completion", "bash"]).output().expect("completion");
    assert!(output.status.success());
    assert!(!output.stdout.is_empty());
}
