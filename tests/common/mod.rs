//! Shared test infrastructure for integration tests.

use std::env;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Command;

/// Snapshot and policy files under tests/fixtures/{name}/.
pub struct TestFixture {
    pub fixture_dir: PathBuf,
}

/// Captured output of one `pgroups` run.
#[derive(Debug)]
pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    /// Stdout with the trailing newline removed.
    pub fn line(&self) -> &str {
        self.stdout.trim_end_matches('\n')
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout).expect("stdout is JSON")
    }
}

fn manifest_dir() -> PathBuf {
    PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()))
}

impl TestFixture {
    pub fn load(name: &str) -> Self {
        let fixture_dir = manifest_dir().join("tests/fixtures").join(name);
        assert!(
            fixture_dir.join("snapshot.json").is_file(),
            "fixture {name} has no snapshot.json"
        );
        Self { fixture_dir }
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.fixture_dir.join(rel)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.path("snapshot.json")
    }

    /// Run `pgroups <command> --snapshot <fixture snapshot> [--config <policy>] <extra>`.
    pub fn run(&self, command: &str, policy: Option<&str>, extra: &[&str]) -> RunResult {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_pgroups"));
        cmd.arg(command).arg("--snapshot").arg(self.snapshot_path());
        if let Some(policy) = policy {
            cmd.arg("--config").arg(self.path(policy));
        }
        cmd.args(extra);
        run_command(cmd)
    }
}

/// Run `pgroups` with arbitrary arguments.
pub fn run_pgroups<I, S>(args: I) -> RunResult
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pgroups"));
    cmd.args(args);
    run_command(cmd)
}

fn run_command(mut cmd: Command) -> RunResult {
    cmd.env_remove("RUST_LOG");
    let output = cmd.output().expect("run pgroups");
    RunResult {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
