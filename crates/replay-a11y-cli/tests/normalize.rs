use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;

const ENGINE_RESULTS: &str = r##"{
  "violations": [
    {
      "id": "image-alt",
      "help": "Images must have alternate text",
      "helpUrl": "https://dequeuniversity.com/rules/axe/4.8/image-alt",
      "impact": "critical",
      "nodes": [
        {
          "html": "<img src=\"logo.png\">",
          "target": ["#logo"],
          "any": [{"id": "has-alt", "message": "Element does not have an alt attribute"}]
        }
      ]
    }
  ]
}"##;

#[test]
fn normalize_file_as_json_stamps_timestamp() {
    let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write(file.path(), ENGINE_RESULTS).unwrap();

    let output = Command::cargo_bin("replay-a11y")
        .unwrap()
        .args([
            "normalize",
            "--json",
            "--timestamp",
            "1234",
            file.path().to_str().unwrap(),
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let issues: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(issues[0]["id"], "image-alt");
    assert_eq!(
        issues[0]["help_url"],
        "https://dequeuniversity.com/rules/axe/4.8/image-alt"
    );
    assert_eq!(issues[0]["timestamp"], 1234.0);
    assert_eq!(issues[0]["elements"][0]["alternatives"][0]["id"], "has-alt");
}

#[test]
fn normalize_stdin_with_malformed_timestamp_uses_zero() {
    Command::cargo_bin("replay-a11y")
        .unwrap()
        .args(["normalize", "--timestamp", "abc"])
        .write_stdin(ENGINE_RESULTS)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 issue(s) affecting 1 element(s) at session time 0"))
        .stdout(predicate::str::contains("image-alt [critical]"));
}

#[test]
fn normalize_rejects_invalid_json() {
    Command::cargo_bin("replay-a11y")
        .unwrap()
        .arg("normalize")
        .write_stdin("not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("engine results are not valid JSON"));
}
