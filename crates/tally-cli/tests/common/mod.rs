//! Shared E2E test helpers for `tally` binary tests.

#![allow(dead_code)]

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

/// Default timeout for one CLI invocation.
pub const TIMEOUT_BASIC: Duration = Duration::from_secs(10);

/// Environment variables read by the config loader.
/// Removed so the host environment cannot leak into a test.
const TALLY_VARS: &[&str] = &[
    "TALLY_DEBUG",
    "TALLY_DATA_PATH",
    "TALLY_COUNTER_START",
    "TALLY_COUNTER_MAX_ATTEMPTS",
    "TALLY_PRIVILEGED_ROLES",
    "TALLY_LOG",
];

/// An isolated home, project root and data file for one test.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp workspace"),
        }
    }

    /// Path of the datastore snapshot.
    pub fn data_path(&self) -> PathBuf {
        self.dir.path().join("data.json")
    }

    /// Root of the workspace, used as HOME and project root.
    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Builds a `tally` command bound to this workspace's data file.
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd: assert_cmd::Command = cargo_bin_cmd!("tally");
        cmd.timeout(TIMEOUT_BASIC);
        for var in TALLY_VARS {
            cmd.env_remove(var);
        }
        cmd.env("HOME", self.dir.path());
        cmd.current_dir(self.dir.path());
        cmd.arg("--data").arg(self.data_path());
        cmd
    }

    /// Runs a command that must succeed and returns its trimmed stdout.
    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self.cmd().args(args).assert().success().get_output().clone();
        String::from_utf8(output.stdout)
            .expect("utf8 stdout")
            .trim()
            .to_string()
    }

    /// Reads the saved snapshot.
    pub fn stored(&self) -> Value {
        let content = std::fs::read_to_string(self.data_path()).expect("read data file");
        serde_json::from_str(&content).expect("data file is JSON")
    }

    /// Writes `<root>/.tally/config.toml`.
    pub fn write_project_config(&self, toml: &str) {
        let dir = self.dir.path().join(".tally");
        std::fs::create_dir_all(&dir).expect("create project config dir");
        std::fs::write(dir.join("config.toml"), toml).expect("write project config");
    }
}
