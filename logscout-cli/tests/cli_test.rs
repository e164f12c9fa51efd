use anyhow::Result;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::io::Write;
use tempfile::{tempdir, TempDir};

fn create_test_files(dir: &TempDir, files: &[(&str, &str)]) -> Result<()> {
    for (name, content) in files {
        let file_path = dir.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(file_path)?;
        writeln!(file, "{}", content)?;
    }
    Ok(())
}

fn logscout() -> Result<Command> {
    let mut cmd = Command::cargo_bin("logscout-cli")?;
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    Ok(cmd)
}

fn sample_logs() -> Result<TempDir> {
    let dir = tempdir()?;
    create_test_files(
        &dir,
        &[
            (
                "ecu1.dlt",
                "2024-05-01T10:00:00Z ECU1 NET link up\n\
                 2024-05-01T10:00:01Z ECU1 NET Connection refused by peer\n\
                 2024-05-01T10:00:02Z ECU1 NET retry\n\
                 2024-05-01T10:00:03Z ECU1 NET connection REFUSED again",
            ),
            ("nested/ecu2.log", "boot\nwatchdog timeout after 120ms"),
            ("clean.txt", "nothing to see here"),
            ("notes.md", "connection refused but not a log"),
        ],
    )?;
    Ok(dir)
}

#[test]
fn test_search_prints_files_and_matches() -> Result<()> {
    let dir = sample_logs()?;

    logscout()?
        .args(["search", "-p", "connection refused", "-p", r"timeout after \d+ms", "-d"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ecu1.dlt"))
        .stdout(predicate::str::contains("ecu2.log"))
        .stdout(predicate::str::contains("Connection refused by peer"))
        .stdout(predicate::str::contains("connection REFUSED again"))
        .stdout(predicate::str::contains("watchdog timeout after 120ms"))
        .stdout(predicate::str::contains("notes.md").not())
        .stdout(predicate::str::contains("Found 3 matches in 2 files"));
    Ok(())
}

#[test]
fn test_matches_show_record_columns() -> Result<()> {
    let dir = sample_logs()?;

    logscout()?
        .args(["search", "-p", "connection refused", "-p", "watchdog", "-d"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"> +1 2024-05-01T10:00:01Z +ECU1 +NET +Connection refused by peer",
        )?)
        .stdout(predicate::str::is_match(
            r"> +3 2024-05-01T10:00:03Z +ECU1 +NET +connection REFUSED again",
        )?)
        .stdout(predicate::str::is_match(r"> +1 - +- +- +watchdog timeout after 120ms")?)
        // Without -B/-A only matching records are shown
        .stdout(predicate::str::contains("link up").not());
    Ok(())
}

#[test]
fn test_context_records_around_matches() -> Result<()> {
    let dir = sample_logs()?;

    logscout()?
        .args(["search", "-p", "refused", "-B", "1", "-A", "1", "-e", "dlt", "-d"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match(
            r"(?m)^ +0 2024-05-01T10:00:00Z +ECU1 +NET +link up$",
        )?)
        .stdout(predicate::str::is_match(
            r"(?m)^> +1 2024-05-01T10:00:01Z +ECU1 +NET +Connection refused by peer$",
        )?)
        .stdout(predicate::str::is_match(
            r"(?m)^ +2 2024-05-01T10:00:02Z +ECU1 +NET +retry$",
        )?)
        .stdout(predicate::str::is_match(r"(?m)^--$")?)
        .stdout(predicate::str::is_match(
            r"(?m)^> +3 2024-05-01T10:00:03Z +ECU1 +NET +connection REFUSED again$",
        )?)
        .stdout(predicate::str::contains("Found 2 matches in 1 files"));
    Ok(())
}

#[test]
fn test_stats_only() -> Result<()> {
    let dir = sample_logs()?;

    logscout()?
        .args(["search", "-p", "refused", "--stats", "-d"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 matches in 1 files"))
        .stdout(predicate::str::contains("Connection refused by peer").not());
    Ok(())
}

#[test]
fn test_extension_filter() -> Result<()> {
    let dir = sample_logs()?;

    logscout()?
        .args(["search", "-p", "refused", "-e", "md", "--stats", "-d"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 matches in 1 files"));
    Ok(())
}

#[test]
fn test_ignore_pattern() -> Result<()> {
    let dir = sample_logs()?;

    logscout()?
        .args(["search", "-p", "timeout", "-i", "**/nested/**", "--stats", "-d"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 0 matches in 0 files"));
    Ok(())
}

#[test]
fn test_json_output() -> Result<()> {
    let dir = sample_logs()?;

    let output = logscout()?
        .args(["search", "-p", "refused", "--json", "-j", "2", "-d"])
        .arg(dir.path())
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["total_matches"], 2);
    assert_eq!(report["files_with_matches"], 1);
    assert_eq!(report["files_searched"], 3);
    assert_eq!(report["timed_out"], false);
    assert_eq!(report["files"][0]["matches"], serde_json::json!([1, 3]));
    Ok(())
}

#[test]
fn test_config_file_supplies_patterns() -> Result<()> {
    let dir = sample_logs()?;
    let config_path = dir.path().join("search.yaml");
    fs::write(
        &config_path,
        "patterns: [\"watchdog\"]\nfile_extensions: [\"log\"]\n",
    )?;

    logscout()?
        .args(["search", "--stats", "-c"])
        .arg(&config_path)
        .arg("-d")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 1 matches in 1 files"));
    Ok(())
}

#[test]
fn test_zero_timeout_reports_partial_results() -> Result<()> {
    let dir = sample_logs()?;

    let output = logscout()?
        .args(["search", "-p", "refused", "--json", "--timeout", "0s", "-d"])
        .arg(dir.path())
        .output()?;
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(report["timed_out"], true);
    assert!(report["total_matches"].as_u64().unwrap() <= 2);
    Ok(())
}

#[test]
fn test_missing_pattern_fails() -> Result<()> {
    let dir = sample_logs()?;

    logscout()?
        .current_dir(dir.path())
        .args(["search", "-d"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("no search pattern"));
    Ok(())
}

#[test]
fn test_invalid_pattern_fails() -> Result<()> {
    let dir = sample_logs()?;

    logscout()?
        .args(["search", "-p", "(unclosed", "-d"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("InvalidPattern"));
    Ok(())
}

#[test]
fn test_missing_root_fails() -> Result<()> {
    let dir = tempdir()?;

    logscout()?
        .args(["search", "-p", "error", "-d"])
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("FileNotFound"));
    Ok(())
}

#[test]
fn test_invalid_timeout_rejected() -> Result<()> {
    logscout()?
        .args(["search", "-p", "error", "--timeout", "soon"])
        .assert()
        .failure();
    Ok(())
}
