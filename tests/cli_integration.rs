#[allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

// ─── helpers ───────────────────────────────────────────────────────

struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("create tempdir");
        std::process::Command::new("git")
            .args(["init"])
            .current_dir(dir.path())
            .output()
            .expect("git init");
        Self { dir }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("coordai").expect("binary");
        cmd.current_dir(self.dir.path())
            .env_remove("COORDAI_LOOKBACK_DAYS")
            .env_remove("COORDAI_LOG");
        cmd
    }

    fn parse(stdout: &[u8]) -> Value {
        let stdout = String::from_utf8_lossy(stdout);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("parse JSON failed: {e}\nstdout: {stdout}"))
    }

    fn run_json(&self, args: &[&str]) -> Value {
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self.cmd().args(&a).output().expect("run");
        Self::parse(&output.stdout)
    }

    fn run_ok(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], true, "expected success=true: {v}");
        v
    }

    fn run_err(&self, args: &[&str]) -> Value {
        let v = self.run_json(args);
        assert_eq!(v["success"], false, "expected success=false: {v}");
        v
    }

    fn write_input(&self, filename: &str, content: &str) -> PathBuf {
        let p = self.dir.path().join(filename);
        fs::write(&p, content).expect("write input file");
        p
    }

    /// Run with `content` on stdin; returns (exit code, parsed stdout).
    fn run_stdin(&self, args: &[&str], content: &str) -> (i32, Value) {
        let p = self.write_input("_input.json", content);
        let mut a: Vec<&str> = args.to_vec();
        a.push("--json");
        let output = self
            .cmd()
            .args(&a)
            .pipe_stdin(&p)
            .unwrap()
            .output()
            .expect("run with stdin");
        (output.status.code().unwrap_or(-1), Self::parse(&output.stdout))
    }

    fn load_project(&self, content: &str) -> Value {
        let (code, v) = self.run_stdin(&["project", "load"], content);
        assert_eq!(v["success"], true, "project load failed: {v}");
        assert_eq!(code, 0);
        v
    }
}

fn scenario_json() -> String {
    serde_json::json!({
        "name": "maison-dupont",
        "description": "Villa, lot unique",
        "trades": [
            {"id": "terr", "name": "Terrassement"},
            {"id": "plb", "name": "Plomberie"},
            {"id": "elec", "name": "Électricité"}
        ],
        "tasks": [
            {"id": "fouilles", "name": "Fouilles", "trade": "terr",
             "planned_start": "2024-01-01", "planned_end": "2024-01-10", "status": "completed"},
            {"id": "reseaux", "name": "Réseaux EU/EV", "trade": "plb",
             "planned_start": "2024-01-08", "planned_end": "2024-01-20", "status": "in_progress"},
            {"id": "gaines", "name": "Passage de gaines", "trade": "elec",
             "planned_start": "2024-01-21", "planned_end": "2024-01-25", "after": ["reseaux"]}
        ]
    })
    .to_string()
}

fn setup_with_project(env: &TestEnv) -> Value {
    env.run_ok(&["init"]);
    env.load_project(&scenario_json())
}

fn task_id(load_result: &Value, temp_id: &str) -> String {
    load_result["data"]["id_mapping"]["tasks"][temp_id]
        .as_str()
        .unwrap()
        .to_string()
}

fn ids(values: &Value, keys: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = keys
        .iter()
        .map(|k| values[*k].as_str().unwrap().to_string())
        .collect();
    out.sort();
    out
}

// ─── init / store ──────────────────────────────────────────────────

#[test]
fn test_init_creates_store() {
    let env = TestEnv::new();
    let v = env.run_ok(&["init"]);
    assert!(v["data"]["path"].as_str().unwrap().ends_with("coordai.db"));
    assert!(env.dir.path().join(".coordai/coordai.db").exists());
}

#[test]
fn test_commands_require_init() {
    let env = TestEnv::new();
    let v = env.run_err(&["project", "list"]);
    assert_eq!(v["error"]["code"], "NOT_INITIALIZED");
}

#[test]
fn test_text_error_goes_to_stderr() {
    let env = TestEnv::new();
    env.cmd()
        .args(["project", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("coordai init"));
}

// ─── projects ──────────────────────────────────────────────────────

#[test]
fn test_project_create_list_activate_delete() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let created = env.run_ok(&["project", "create", "villa", "--description", "Villa R+1"]);
    assert_eq!(created["data"]["name"], "villa");

    let v = env.run_err(&["project", "create", "villa"]);
    assert_eq!(v["error"]["code"], "PROJECT_NAME_CONFLICT");
    let v = env.run_err(&["project", "create", "Villa Dupont"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");

    env.run_ok(&["project", "activate", "villa"]);
    let list = env.run_ok(&["project", "list"]);
    assert_eq!(list["data"]["projects"][0]["active"], true);

    env.run_ok(&["project", "delete", "villa"]);
    let v = env.run_err(&["trade", "list"]);
    assert_eq!(v["error"]["code"], "NO_ACTIVE_PROJECT");
}

#[test]
fn test_project_load_maps_ids_and_activates() {
    let env = TestEnv::new();
    let loaded = setup_with_project(&env);
    assert_eq!(loaded["data"]["tasks_created"], 3);
    assert_eq!(loaded["data"]["trades_created"], 3);
    assert_eq!(loaded["data"]["activated"], true);

    let show = env.run_ok(&["project", "show", "maison-dupont"]);
    assert_eq!(show["data"]["tasks"].as_array().unwrap().len(), 3);
    assert_eq!(show["data"]["trades"].as_array().unwrap().len(), 3);

    let gaines = task_id(&loaded, "gaines");
    let reseaux = task_id(&loaded, "reseaux");
    let task = env.run_ok(&["task", "show", &gaines]);
    assert_eq!(task["data"]["task"]["trade"]["name"], "Électricité");
    assert_eq!(task["data"]["dependencies"][0]["id"], reseaux.as_str());

    let upstream = env.run_ok(&["task", "show", &reseaux]);
    assert_eq!(upstream["data"]["downstream"][0]["id"], gaines.as_str());
}

#[test]
fn test_project_load_rejects_invalid_input() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);

    for (bad, needle) in [
        (r#"{"name":"p","tasks":[{"id":"a"},{"id":"a"}]}"#, "duplicate"),
        (r#"{"name":"p","tasks":[{"id":"a","after":["a"]}]}"#, "itself"),
        (r#"{"name":"p","tasks":[{"id":"a","after":["ghost"]}]}"#, "ghost"),
        (r#"{"name":"p","tasks":[{"id":"a","planned_start":"2024-13-01"}]}"#, "planned_start"),
        (r#"{"name":"p","tasks":[{"id":"a","status":"paused"}]}"#, "paused"),
        (r#"{"name":"p","trades":[]}"#, "tasks"),
    ] {
        let (code, v) = env.run_stdin(&["project", "load"], bad);
        assert_eq!(code, 1, "{bad}");
        assert_eq!(v["error"]["code"], "VALIDATION_ERROR", "{bad}");
        assert!(
            v["error"]["message"].as_str().unwrap().contains(needle),
            "{bad}: {v}"
        );
    }

    // Nothing was written.
    let list = env.run_ok(&["project", "list"]);
    assert!(list["data"]["projects"].as_array().unwrap().is_empty());
}

// ─── tasks ─────────────────────────────────────────────────────────

#[test]
fn test_task_add_with_trade_and_dependency() {
    let env = TestEnv::new();
    let loaded = setup_with_project(&env);
    let gaines = task_id(&loaded, "gaines");

    let added = env.run_ok(&[
        "task", "add", "Appareillage", "--trade", "Électricité", "--start", "2024-01-26",
        "--end", "2024-01-30", "--after", &gaines,
    ]);
    let new_id = added["data"]["task"]["id"].as_str().unwrap().to_string();
    assert_eq!(added["data"]["task"]["trade"]["name"], "Électricité");
    assert_eq!(added["data"]["task"]["depends_on"][0], gaines.as_str());

    let v = env.run_err(&["task", "add", "Peinture", "--trade", "Peinture"]);
    assert_eq!(v["error"]["code"], "TRADE_NOT_FOUND");
    let v = env.run_err(&["task", "add", "Ravalement", "--status", "paused"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");

    let v = env.run_err(&["task", "dep", "add", &new_id, &new_id]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");

    env.run_ok(&["task", "dep", "remove", &new_id, &gaines]);
    let shown = env.run_ok(&["task", "show", &new_id]);
    assert!(shown["data"]["dependencies"].as_array().unwrap().is_empty());

    let list = env.run_ok(&["task", "list"]);
    assert_eq!(list["data"]["tasks"].as_array().unwrap().len(), 4);
}

#[test]
fn test_task_status_and_dates() {
    let env = TestEnv::new();
    let loaded = setup_with_project(&env);
    let gaines = task_id(&loaded, "gaines");

    let v = env.run_ok(&["task", "status", &gaines, "delayed"]);
    assert_eq!(v["data"]["task"]["previous"], "planned");
    assert_eq!(v["data"]["task"]["status"], "delayed");

    let v = env.run_ok(&["task", "dates", &gaines, "--actual-start", "2024-01-23"]);
    assert_eq!(v["data"]["task"]["actual_start"], "2024-01-23");
    assert_eq!(v["data"]["task"]["planned_start"], "2024-01-21");

    let v = env.run_err(&["task", "dates", &gaines]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

// ─── analyze ───────────────────────────────────────────────────────

#[test]
fn test_analyze_reports_overlap_and_exit_code() {
    let env = TestEnv::new();
    let loaded = setup_with_project(&env);

    let output = env.cmd().args(["analyze", "--json"]).output().expect("analyze");
    assert_eq!(output.status.code(), Some(2));
    let v = TestEnv::parse(&output.stdout);
    assert_eq!(v["success"], true);

    let data = &v["data"];
    assert_eq!(data["project"], "maison-dupont");
    assert_eq!(data["lookback_days"], 5);
    assert_eq!(data["confirmed_count"], 1);
    assert!(data["conflicts"].as_array().unwrap().is_empty());
    assert!(data["missing_dependencies"].as_array().unwrap().is_empty());

    let overlap = &data["overlaps"][0];
    assert_eq!(
        ids(overlap, &["task1_id", "task2_id"]),
        {
            let mut expected = vec![task_id(&loaded, "fouilles"), task_id(&loaded, "reseaux")];
            expected.sort();
            expected
        }
    );
    assert_eq!(overlap["overlap_start"], "2024-01-08");
    assert_eq!(overlap["overlap_end"], "2024-01-10");
    assert_eq!(overlap["overlap_days"], 3);
    assert_eq!(data["findings"][0]["kind"], "confirmed");
    assert_eq!(data["findings"][0]["finding"]["type"], "overlap");
}

#[test]
fn test_analyze_detects_conflict_with_downstream_impact() {
    let env = TestEnv::new();
    let loaded = setup_with_project(&env);
    let gaines = task_id(&loaded, "gaines");
    let reseaux = task_id(&loaded, "reseaux");

    env.run_ok(&["task", "add", "Appareillage", "--start", "2024-01-26", "--after", &gaines]);
    env.run_ok(&["task", "dates", &gaines, "--start", "2024-01-18"]);

    let v = env.run_ok(&["analyze"]);
    let data = &v["data"];
    let conflict = &data["conflicts"][0];
    assert_eq!(conflict["task_id"], gaines.as_str());
    assert_eq!(conflict["dependency_id"], reseaux.as_str());
    assert_eq!(conflict["conflict_days"], 2);
    assert_eq!(data["downstream_impact"][&gaines].as_array().unwrap().len(), 1);
}

#[test]
fn test_analyze_text_output() {
    let env = TestEnv::new();
    setup_with_project(&env);
    env.cmd()
        .args(["analyze"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("[OVERLAP]"))
        .stdout(predicate::str::contains("08/01/2024"));
}

#[test]
fn test_analyze_rejected_while_run_in_flight() {
    let env = TestEnv::new();
    let loaded = setup_with_project(&env);
    let project_id = loaded["data"]["project"]["id"].as_str().unwrap();

    let conn = rusqlite::Connection::open(env.dir.path().join(".coordai/coordai.db")).unwrap();
    conn.execute(
        "INSERT INTO analysis_runs (project_id) VALUES (?1)",
        rusqlite::params![project_id],
    )
    .unwrap();

    let v = env.run_err(&["analyze"]);
    assert_eq!(v["error"]["code"], "ANALYSIS_IN_PROGRESS");

    conn.execute("DELETE FROM analysis_runs", []).unwrap();
    let output = env.cmd().args(["analyze", "--json"]).output().expect("analyze");
    assert_eq!(output.status.code(), Some(2));
}

fn handoff_snapshot() -> &'static str {
    r#"{"name":"garage","tasks":[
        {"id":"dalle","planned_start":"2024-03-01","planned_end":"2024-03-05"},
        {"id":"murs","planned_start":"2024-03-08","planned_end":"2024-03-15"},
        {"id":"toiture","planned_start":"2024-03-18","planned_end":"2024-03-22","after":["murs"]},
        {"id":"broken","planned_start":"2024-02-30"},
        {"name":"no id"}
    ]}"#
}

#[test]
fn test_analyze_stdin_skips_bad_records_and_suggests() {
    let env = TestEnv::new();
    let (code, v) = env.run_stdin(&["analyze", "--stdin"], handoff_snapshot());
    assert_eq!(code, 0, "suggestions alone do not fail: {v}");

    let data = &v["data"];
    assert_eq!(data["project"], "garage");
    assert_eq!(data["task_count"], 3);
    assert_eq!(data["skipped"]["count"], 2);
    assert_eq!(data["skipped"]["records"][0]["id"], "broken");

    let missing = data["missing_dependencies"].as_array().unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0]["task_id"], "murs");
    assert_eq!(missing[0]["candidate_predecessor_ids"][0], "dalle");
    assert_eq!(data["findings"][0]["kind"], "candidate");
}

#[test]
fn test_lookback_flag_and_env_override() {
    let env = TestEnv::new();

    let (_, v) = env.run_stdin(&["analyze", "--stdin", "--lookback-days", "2"], handoff_snapshot());
    assert_eq!(v["data"]["lookback_days"], 2);
    assert!(v["data"]["missing_dependencies"].as_array().unwrap().is_empty());

    let p = env.write_input("_handoff.json", handoff_snapshot());
    let output = env
        .cmd()
        .env("COORDAI_LOOKBACK_DAYS", "2")
        .args(["analyze", "--stdin", "--json"])
        .pipe_stdin(&p)
        .unwrap()
        .output()
        .expect("analyze");
    let v = TestEnv::parse(&output.stdout);
    assert_eq!(v["data"]["lookback_days"], 2);
    assert!(v["data"]["missing_dependencies"].as_array().unwrap().is_empty());

    let (code, v) = env.run_stdin(&["analyze", "--stdin", "--lookback-days", "-1"], handoff_snapshot());
    assert_eq!(code, 1);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_config_set_lookback() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    env.run_ok(&["config", "set-lookback", "0"]);
    let v = env.run_ok(&["config", "show"]);
    assert_eq!(v["data"]["lookback_days"], 0);
    assert_eq!(v["data"]["effective_lookback_days"], 0);

    let v = env.run_err(&["config", "set-lookback", "-3"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

// ─── report ────────────────────────────────────────────────────────

#[test]
fn test_report_groups_by_trade_with_counts() {
    let env = TestEnv::new();
    setup_with_project(&env);

    let v = env.run_ok(&["report"]);
    let report = &v["data"];
    assert_eq!(report["project_name"], "maison-dupont");
    assert_eq!(report["total_tasks"], 3);
    assert_eq!(report["completed_tasks"], 1);
    assert_eq!(report["in_progress_tasks"], 1);
    assert_eq!(report["planned_tasks"], 1);
    assert_eq!(report["delayed_tasks"], 0);
    assert!(report.get("findings").is_none());

    let groups = report["tasks_by_trade"].as_object().unwrap();
    let keys: Vec<&str> = groups.keys().map(String::as_str).collect();
    assert_eq!(keys.len(), 3);
    assert!(keys.contains(&"Électricité"));
    assert_eq!(groups["Plomberie"][0]["planned_start"], "08/01/2024");
    assert_eq!(groups["Plomberie"][0]["name"], "Réseaux EU/EV");

    let v = env.run_ok(&["report", "--with-findings"]);
    assert_eq!(v["data"]["findings"]["overlaps"].as_array().unwrap().len(), 1);
}

#[test]
fn test_report_absent_project_is_null() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    let output = env
        .cmd()
        .args(["report", "--project", "nowhere", "--json"])
        .output()
        .expect("report");
    assert_eq!(output.status.code(), Some(0));
    let v = TestEnv::parse(&output.stdout);
    assert_eq!(v["success"], true);
    assert!(v["data"].is_null());

    let (code, v) = env.run_stdin(&["report", "--stdin"], "  \n");
    assert_eq!(code, 0);
    assert!(v["data"].is_null());
}

#[test]
fn test_report_stdin_unassigned_and_skipped() {
    let env = TestEnv::new();
    let (code, v) = env.run_stdin(
        &["report", "--stdin"],
        r#"{"name":"atelier","trades":[{"id":"plb","name":"Plomberie"}],"tasks":[
            {"id":"a","trade":"plb","status":"completed"},
            {"id":"b","trade":"ghost","status":"delayed"},
            {"id":"c"},
            {"id":"d","status":"paused"}
        ]}"#,
    );
    assert_eq!(code, 0);
    let report = &v["data"];
    assert_eq!(report["total_tasks"], 3);
    assert_eq!(report["skipped_records"], 1);
    assert_eq!(report["completed_tasks"], 1);
    assert_eq!(report["delayed_tasks"], 1);
    assert_eq!(report["planned_tasks"], 1);
    assert_eq!(report["tasks_by_trade"]["unassigned"].as_array().unwrap().len(), 2);
}

#[test]
fn test_malformed_config_is_validation_error() {
    let env = TestEnv::new();
    env.run_ok(&["init"]);
    env.write_input(".coordai/config.json", r#"{"lookback_days":"seven"}"#);

    let (code, v) = env.run_stdin(&["analyze", "--stdin"], r#"{"tasks":[]}"#);
    assert_eq!(code, 1);
    assert_eq!(v["success"], false);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
    assert!(v["error"]["message"].as_str().unwrap().contains("config.json"));

    let v = env.run_err(&["config", "show"]);
    assert_eq!(v["error"]["code"], "VALIDATION_ERROR");
}

#[test]
fn test_report_without_resolvable_active_project_is_null() {
    let env = TestEnv::new();
    setup_with_project(&env);

    env.write_input(".coordai/config.json", r#"{"active_project_id":"01STALE"}"#);
    let output = env.cmd().args(["report", "--json"]).output().expect("report");
    assert_eq!(output.status.code(), Some(0));
    assert!(TestEnv::parse(&output.stdout)["data"].is_null());

    env.run_ok(&["project", "activate", "maison-dupont"]);
    env.run_ok(&["project", "delete", "maison-dupont"]);
    let output = env.cmd().args(["report", "--json"]).output().expect("report");
    assert_eq!(output.status.code(), Some(0));
    assert!(TestEnv::parse(&output.stdout)["data"].is_null());
}

#[test]
fn test_analyze_stdin_skips_inverted_range() {
    let env = TestEnv::new();
    let (code, v) = env.run_stdin(
        &["analyze", "--stdin"],
        r#"{"trades":[{"id":"a","name":"Maçonnerie"},{"id":"b","name":"Plomberie"}],"tasks":[
            {"id":"inv","trade":"a","planned_start":"2024-01-10","planned_end":"2024-01-05"},
            {"id":"wide","trade":"b","planned_start":"2024-01-01","planned_end":"2024-01-20"}
        ]}"#,
    );
    assert_eq!(code, 0);
    assert!(v["data"]["overlaps"].as_array().unwrap().is_empty());
    assert_eq!(v["data"]["skipped"]["count"], 1);
    assert_eq!(v["data"]["skipped"]["records"][0]["id"], "inv");
}
