//! E2E tests for counter allocation and permission checks.

mod common;

use common::Workspace;
use predicates::str::contains;
use std::collections::BTreeSet;

// ─── Counters ──────────────────────────────────────────────────────

#[test]
fn counter_starts_at_floor_and_survives_restarts() {
    let ws = Workspace::new();
    assert_eq!(ws.run_ok(&["next-id", "invoice"]), "1000");
    assert_eq!(ws.run_ok(&["next-id", "invoice"]), "1001");
    assert_eq!(ws.stored()["counters"]["invoice"], 1001);
}

#[test]
fn counter_with_prefix_and_start() {
    let ws = Workspace::new();
    assert_eq!(
        ws.run_ok(&["next-id", "receipt", "--prefix", "RCPT"]),
        "RCPT-1000"
    );
    assert_eq!(ws.run_ok(&["next-id", "transfer", "--start", "1"]), "1");
    // The floor only applies to a counter that does not exist yet.
    assert_eq!(ws.run_ok(&["next-id", "transfer", "--start", "500"]), "2");
}

#[test]
fn scoped_counters_are_independent() {
    let ws = Workspace::new();
    assert_eq!(ws.run_ok(&["next-id", "posDaily", "--scope", "u1"]), "1000");
    assert_eq!(ws.run_ok(&["next-id", "posDaily", "--scope", "u2"]), "1000");
    assert_eq!(ws.run_ok(&["next-id", "posDaily", "--scope", "u1"]), "1001");
    assert_eq!(ws.stored()["counters"]["posDaily:u1"], 1001);
}

#[test]
fn counter_start_from_env_and_project_config() {
    let ws = Workspace::new();
    ws.write_project_config("[counter]\nstart_from = 42\n");
    assert_eq!(ws.run_ok(&["next-id", "a"]), "42");

    let out = ws
        .cmd()
        .env("TALLY_COUNTER_START", "7")
        .args(["next-id", "b"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert_eq!(String::from_utf8_lossy(&out).trim(), "7");
}

#[test]
fn concurrent_processes_never_share_a_value() {
    const RUNS: usize = 16;
    let ws = Workspace::new();
    assert_eq!(ws.run_ok(&["next-id", "invoice"]), "1000");

    let ws = &ws;
    let outputs: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..RUNS)
            .map(|_| {
                s.spawn(move || {
                    ws.cmd()
                        .args(["next-id", "invoice"])
                        .output()
                        .expect("spawn tally")
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("runner thread"))
            .collect()
    });

    let mut values = BTreeSet::new();
    for output in &outputs {
        assert!(
            output.status.success(),
            "next-id failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        let value: i64 = String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse()
            .expect("numeric counter value");
        assert!(values.insert(value), "value {value} allocated twice");
    }

    let expected: BTreeSet<i64> = (1001..1001 + RUNS as i64).collect();
    assert_eq!(values, expected);
    assert_eq!(ws.stored()["counters"]["invoice"], 1000 + RUNS as i64);
}

#[test]
fn concurrent_creates_are_all_kept() {
    const RUNS: usize = 8;
    let ws = Workspace::new();

    std::thread::scope(|s| {
        for i in 0..RUNS {
            let ws = &ws;
            s.spawn(move || {
                let json = format!(r#"{{"seq":{i}}}"#);
                ws.cmd()
                    .args(["create", "employees", json.as_str()])
                    .assert()
                    .success();
            });
        }
    });

    let stored = ws.stored();
    let employees = stored["employees"].as_object().expect("employees object");
    assert_eq!(employees.len(), RUNS);
}

#[test]
fn counter_root_is_not_a_collection() {
    let ws = Workspace::new();
    assert_eq!(ws.run_ok(&["next-id", "invoice"]), "1000");

    ws.cmd()
        .args(["remove", "counters", "invoice"])
        .assert()
        .failure()
        .stderr(contains("reserved"));
    ws.cmd()
        .args(["update", "counters", "invoice", r#"{"x":1}"#])
        .assert()
        .failure();
    ws.cmd().args(["list", "counters"]).assert().failure();

    assert_eq!(ws.run_ok(&["next-id", "invoice"]), "1001");
}

#[test]
fn corrupted_counter_fails() {
    let ws = Workspace::new();
    std::fs::write(ws.data_path(), r#"{"counters":{"invoice":"abc"}}"#).expect("write data");
    ws.cmd().args(["next-id", "invoice"]).assert().failure();
}

// ─── Permissions ───────────────────────────────────────────────────

#[test]
fn cashier_permissions() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["can", "--role", "cashier", "add", "sales_pos"])
        .assert()
        .success()
        .stdout(contains("granted"));
    ws.cmd()
        .args(["can", "--role", "cashier", "delete", "sales_invoices"])
        .assert()
        .failure()
        .stdout(contains("denied: action_not_granted"));
    ws.cmd()
        .args(["can", "--role", "cashier", "view", "hr_payroll"])
        .assert()
        .failure()
        .stdout(contains("denied: module_not_granted"));
}

#[test]
fn undeclared_and_anonymous_checks_deny() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["can", "--role", "cashier", "approve", "sales_pos"])
        .assert()
        .failure()
        .stdout(contains("denied: undeclared_action"));
    ws.cmd()
        .args(["can", "view", "dashboard"])
        .assert()
        .failure()
        .stdout(contains("denied: no_role"));
    ws.cmd()
        .args(["can", "--role", "ghost", "view", "dashboard"])
        .assert()
        .failure()
        .stdout(contains("denied: unknown_role"));
}

#[test]
fn privileged_roles_bypass_unless_disabled() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["can", "--role", "admin", "approve", "dashboard"])
        .assert()
        .success()
        .stdout(contains("privileged"));
    ws.cmd()
        .args(["can", "--role", "مسؤول", "delete", "settings_roles"])
        .assert()
        .success()
        .stdout(contains("privileged"));

    ws.cmd()
        .env("TALLY_PRIVILEGED_ROLES", "")
        .args(["can", "--role", "admin", "approve", "dashboard"])
        .assert()
        .failure()
        .stdout(contains("denied: undeclared_action"));
}

#[test]
fn role_and_user_roots_are_not_collections() {
    let ws = Workspace::new();
    ws.cmd().arg("seed-roles").assert().success();

    ws.cmd()
        .args(["update", "roles", "cashier", r#"{"hr_payroll":{"view":true}}"#])
        .assert()
        .failure()
        .stderr(contains("reserved"));
    ws.cmd()
        .args(["create", "roles", r#"{"hr_payroll":{"view":true}}"#])
        .assert()
        .failure();
    ws.cmd()
        .args(["create", "users", r#"{"role":"admin"}"#])
        .assert()
        .failure();

    ws.cmd()
        .args(["can", "--role", "cashier", "view", "hr_payroll"])
        .assert()
        .failure()
        .stdout(contains("denied: module_not_granted"));
    assert!(ws.stored().get("users").is_none());
}

#[test]
fn seed_roles_writes_once() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("seed-roles")
        .assert()
        .success()
        .stdout(contains("seeded"));
    assert_eq!(ws.stored()["roles"]["cashier"]["sales_pos"]["add"], true);

    ws.cmd()
        .arg("seed-roles")
        .assert()
        .success()
        .stdout(contains("roles already present"));
}

#[test]
fn stored_roles_are_not_reseeded() {
    let ws = Workspace::new();
    std::fs::write(
        ws.data_path(),
        r#"{"roles":{"cashier":{"sales_pos":{"view":true}}}}"#,
    )
    .expect("write data");

    ws.cmd()
        .args(["can", "--role", "cashier", "add", "sales_pos"])
        .assert()
        .failure()
        .stdout(contains("denied: action_not_granted"));
    ws.cmd()
        .args(["can", "--role", "cashier", "view", "sales_pos"])
        .assert()
        .success();
}
