//! CLI integration tests for the demo, run, and sweep modes.

use std::io::Write;
use std::process::{Command, Output};

fn automail(args: &[&str]) -> Output {
    let bin = env!("CARGO_BIN_EXE_automail");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("AUTOMAIL_CONFIG")
        .output()
        .expect("failed to run automail binary")
}

fn field<'a>(stdout: &'a str, key: &str) -> &'a str {
    let prefix = format!("{key}=");
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix(prefix.as_str()))
        .unwrap_or_else(|| panic!("{key} line missing"))
}

#[test]
fn demo_cli_delivers_all_mail_without_anomalies() {
    // Run the demo binary with default settings.
    let output = automail(&[]);
    assert!(
        output.status.success(),
        "demo exited with non-zero status: {:?}",
        output.status
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("DEMO SUMMARY"),
        "demo summary missing from output"
    );
    assert_eq!(field(&stdout, "delivered"), "40");
    assert_eq!(field(&stdout, "undeliverable"), "0");
    assert_eq!(field(&stdout, "anomalies"), "0");
}

#[test]
fn run_cli_applies_overrides() {
    let output = automail(&[
        "run",
        "--robots",
        "2",
        "--capacity",
        "two",
        "--max-weight",
        "2600",
        "--mail-count",
        "12",
        "--seed",
        "5",
    ]);
    assert!(output.status.success(), "run failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RUN SUMMARY"));
    assert!(stdout.contains("robots=2 capacity=two mail_total=12"));
    assert_eq!(field(&stdout, "seed"), "5");
    assert_eq!(field(&stdout, "delivered"), "12");
}

#[test]
fn run_cli_reads_config_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "robots = 4\nmail_count = 8\nfloors = 5").expect("write config");
    let path = file.path().to_str().expect("utf-8 path");

    let output = automail(&["--config", path, "run"]);
    assert!(output.status.success(), "run failed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("robots=4 capacity=one mail_total=8"));
}

#[test]
fn invalid_config_exits_with_error() {
    let output = automail(&["run", "--robots", "0"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("robots"), "unexpected stderr: {stderr}");
}

#[test]
fn bad_arguments_exit_with_usage_error() {
    let output = automail(&["run", "--capacity", "four"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn sweep_prints_one_row_per_combination() {
    let output = automail(&[
        "sweep",
        "--robot-sets",
        "1,3",
        "--tiers",
        "one,three",
        "--mail-count",
        "10",
    ]);
    assert!(output.status.success(), "sweep failed: {:?}", output);

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    let header = lines.next().expect("csv header");
    assert!(header.starts_with("robots,capacity,mail,ticks,delivered"));
    let rows: Vec<&str> = lines.collect();
    assert_eq!(rows.len(), 4);
    for row in rows {
        let cols: Vec<&str> = row.split(',').collect();
        assert_eq!(cols.len(), 12);
        assert_eq!(cols[2], "10");
        assert_eq!(cols[6], "0", "anomalies reported: {row}");
    }
}
