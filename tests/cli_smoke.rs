use assert_cmd::Command;
use serde_json::json;

fn scenario_json() -> String {
    json!({
        "name": "Login flow",
        "requirements": "A user can log in with valid credentials",
        "url": "https://example.test/login",
        "steps": [
            {
                "step_number": 1,
                "description": "Open the login page",
                "action": "navigate",
                "expected_result": "Login form is shown",
            },
            {
                "step_number": 2,
                "description": "Click the Log in button",
                "action": "click",
                "target": "blue 'Log in' button",
                "expected_result": "Dashboard is shown",
                "depends_on": [1],
            },
        ],
    })
    .to_string()
}

#[test]
fn plan_only_validates_and_prints_the_plan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("login.json");
    std::fs::write(&path, scenario_json()).unwrap();

    Command::cargo_bin("gridpilot")
        .unwrap()
        .arg(&path)
        .arg("--plan-only")
        .assert()
        .success()
        .stdout(predicates::str::contains("Plan is valid."))
        .stdout(predicates::str::contains("Log in"));
}

#[test]
fn rehearsal_run_writes_summary_and_journal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("login.json");
    std::fs::write(&path, scenario_json()).unwrap();
    let output = dir.path().join("reports");

    Command::cargo_bin("gridpilot")
        .unwrap()
        .arg(&path)
        .arg("--output")
        .arg(&output)
        .assert()
        .success();

    let summary = std::fs::read_to_string(output.join("summary.json")).unwrap();
    assert!(summary.contains("\"completed\""));
    let journal = std::fs::read_to_string(output.join("journal.json")).unwrap();
    assert!(journal.contains("step 1"));
}

#[test]
fn missing_scenario_file_is_an_error() {
    Command::cargo_bin("gridpilot")
        .unwrap()
        .arg("does-not-exist.json")
        .assert()
        .failure();
}

#[test]
fn cyclic_scenario_fails_plan_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cycle.json");
    let scenario = json!({
        "name": "Cycle",
        "requirements": "impossible ordering",
        "url": "https://example.test",
        "steps": [
            {"step_number": 1, "description": "a", "action": "click",
             "expected_result": "x", "depends_on": [2]},
            {"step_number": 2, "description": "b", "action": "click",
             "expected_result": "y", "depends_on": [1]},
        ],
    });
    std::fs::write(&path, scenario.to_string()).unwrap();

    Command::cargo_bin("gridpilot")
        .unwrap()
        .arg(&path)
        .arg("--plan-only")
        .assert()
        .failure()
        .stderr(predicates::str::contains("cyclic dependency"));
}
