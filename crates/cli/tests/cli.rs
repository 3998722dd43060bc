// Integration tests for the `commission` binary: exit codes, messages and
// files for the stages that need no PDFs or network.
// Run with: cargo test -p commission-cli --test cli -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// A temp workspace with a settings file pointing every path inside it.
struct Workspace {
    dir: TempDir,
    settings: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        Self::with_settings("")
    }

    fn with_settings(extra: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let settings = root.join("settings.toml");
        let toml = format!(
            "[paths]\ndata_dir = {:?}\noutput_dir = {:?}\nlog_dir = {:?}\n{}",
            root.join("data").to_str().unwrap(),
            root.join("output").to_str().unwrap(),
            root.join("logs").to_str().unwrap(),
            extra,
        );
        std::fs::write(&settings, toml).unwrap();
        Self { dir, settings }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn month_output(&self, month: &str) -> PathBuf {
        self.root().join("output").join(month)
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_commission"))
            .args(args)
            .env("COMMISSION_CONFIG", &self.settings)
            .env_remove("RUST_LOG")
            .env_remove("ANTHROPIC_API_KEY")
            .env_remove("RESEND_API_KEY")
            .output()
            .expect("run commission")
    }
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ---------------------------------------------------------------------------
// --month validation
// ---------------------------------------------------------------------------

#[test]
fn invalid_month_exits_2_with_literal_message() {
    let ws = Workspace::new();
    for bad in ["2025-13", "Aug-2025", "2025-8", "202508"] {
        let output = ws.run(&["extract", "--month", bad]);
        assert_eq!(output.status.code(), Some(2), "month {}", bad);
        assert!(
            stderr(&output).contains(&format!(
                "error: Invalid month format '{}'. Use YYYY-MM (e.g., 2025-08)",
                bad
            )),
            "stderr: {}",
            stderr(&output)
        );
    }
}

#[test]
fn invalid_month_wins_over_bad_settings() {
    let ws = Workspace::with_settings("[bogus]\nx = 1\n");
    let output = ws.run(&["summarize", "--month", "2025-00"]);
    assert_eq!(output.status.code(), Some(2));
}

// ---------------------------------------------------------------------------
// settings
// ---------------------------------------------------------------------------

#[test]
fn unknown_settings_key_exits_4() {
    let ws = Workspace::with_settings("[matching]\nauto_acept = 80\n");
    let output = ws.run(&["summarize", "--month", "2025-08"]);
    assert_eq!(output.status.code(), Some(4));
    assert!(stderr(&output).contains("hint:"), "stderr: {}", stderr(&output));
}

#[test]
fn missing_config_flag_path_exits_4() {
    let ws = Workspace::new();
    let missing = ws.root().join("nope.toml");
    let output = ws.run(&["--config", missing.to_str().unwrap(), "summarize", "--month", "2025-08"]);
    assert_eq!(output.status.code(), Some(4));
}

// ---------------------------------------------------------------------------
// missing inputs
// ---------------------------------------------------------------------------

#[test]
fn extract_without_statement_dir_exits_3() {
    let ws = Workspace::new();
    let output = ws.run(&["extract", "--month", "2025-08"]);
    assert_eq!(output.status.code(), Some(3));
    let err = stderr(&output);
    assert!(err.contains("error: statement directory not found"), "stderr: {}", err);
    assert!(err.contains("hint:  put the 2025-08 statements there"), "stderr: {}", err);
    assert!(!ws.month_output("2025-08").join("commission_output.csv").exists());
}

#[test]
fn extract_without_roster_exits_3() {
    let ws = Workspace::new();
    std::fs::create_dir_all(ws.root().join("data/2025-08/commission_statements")).unwrap();
    let output = ws.run(&["extract", "--month", "2025-08"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("roster not found"), "stderr: {}", stderr(&output));
}

#[test]
fn summarize_without_commission_csv_exits_3() {
    let ws = Workspace::new();
    let output = ws.run(&["summarize", "--month", "2025-08"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(
        stderr(&output).contains("commission extract --month 2025-08"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn report_without_commission_csv_exits_3() {
    let ws = Workspace::new();
    let output = ws.run(&["report", "--month", "2025-08", "--no-email"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(!ws.month_output("2025-08").join("report.html").exists());
}

#[test]
fn report_without_bank_statement_exits_3() {
    let ws = Workspace::new();
    let out = ws.month_output("2025-08");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(
        out.join("commission_output.csv"),
        "carrier,group_name,commission,state\nGuardian,Acme Corp,500.00,CA\n",
    )
    .unwrap();

    let output = ws.run(&["report", "--month", "2025-08", "--no-email"]);
    assert_eq!(output.status.code(), Some(3));
    assert!(stderr(&output).contains("--bank-statement"), "stderr: {}", stderr(&output));
}

// ---------------------------------------------------------------------------
// summarize
// ---------------------------------------------------------------------------

#[test]
fn summarize_writes_state_totals() {
    let ws = Workspace::new();
    let out = ws.month_output("2025-08");
    std::fs::create_dir_all(&out).unwrap();
    std::fs::write(
        out.join("commission_output.csv"),
        "carrier,group_name,commission,state\n\
         Guardian,Acme Corp,300.00,CA\n\
         Beam,Acme Corp,100.00,CA\n\
         Guardian,Bay Dental,100.00,NV\n",
    )
    .unwrap();

    let output = ws.run(&["-q", "summarize", "--month", "2025-08"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(output.stdout.is_empty(), "-q prints nothing");

    let summary = std::fs::read_to_string(out.join("state_summary.csv")).unwrap();
    assert_eq!(
        summary,
        "State,Total Commission,Percentage of Total\n\
         CA,400.00,80.00%\n\
         NV,100.00,20.00%\n\
         \n\
         GRAND TOTAL,500.00,100.00%\n"
    );

    // Idempotent.
    let again = ws.run(&["-q", "summarize", "--month", "2025-08"]);
    assert!(again.status.success());
    assert_eq!(std::fs::read_to_string(out.join("state_summary.csv")).unwrap(), summary);
}

#[test]
fn log_file_lands_in_log_dir() {
    let ws = Workspace::new();
    let _ = ws.run(&["summarize", "--month", "2025-08"]);
    let logs: Vec<_> = std::fs::read_dir(ws.root().join("logs"))
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with("commission.log"))
        .collect();
    assert_eq!(logs.len(), 1);
}
