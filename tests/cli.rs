use std::fs;

use assert_cmd::Command;
use tempfile::tempdir;

fn malaria_sim() -> Command {
    Command::cargo_bin("malaria-sim").unwrap()
}

#[test]
fn writes_reports_and_summary() {
    let dir = tempdir().unwrap();
    let output = malaria_sim()
        .args(["--config", "tests/data/small_config.json", "--random-seed", "5"])
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let stdout = String::from_utf8(output).unwrap();
    assert!(stdout.contains("Execution Summary"));

    let global = fs::read_to_string(dir.path().join("global_stats.csv")).unwrap();
    // Header plus one row per day.
    assert_eq!(global.lines().count(), 6);
    let houses = fs::read_to_string(dir.path().join("house_infected.csv")).unwrap();
    assert_eq!(houses.lines().count(), 1 + 5 * 20);
}

#[test]
fn days_override_and_quiet_stats() {
    let dir = tempdir().unwrap();
    let output = malaria_sim()
        .args([
            "--config",
            "tests/data/small_config.json",
            "--days",
            "2",
            "--no-stats",
            "--prefix",
            "short_",
        ])
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(!String::from_utf8(output).unwrap().contains("Execution Summary"));
    let global = fs::read_to_string(dir.path().join("short_global_stats.csv")).unwrap();
    assert_eq!(global.lines().count(), 3);
}

#[test]
fn same_seed_same_output() {
    let first = tempdir().unwrap();
    let second = tempdir().unwrap();
    for dir in [&first, &second] {
        malaria_sim()
            .args(["--config", "tests/data/small_config.json", "--no-stats"])
            .args(["--random-seed", "11"])
            .arg("--output-dir")
            .arg(dir.path())
            .assert()
            .success();
    }
    for name in ["global_stats.csv", "house_infected.csv"] {
        assert_eq!(
            fs::read_to_string(first.path().join(name)).unwrap(),
            fs::read_to_string(second.path().join(name)).unwrap()
        );
    }
}

#[test]
fn rejects_out_of_range_config() {
    let dir = tempdir().unwrap();
    let stderr = malaria_sim()
        .args(["--config", "tests/data/bad_config.json"])
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8(stderr).unwrap().contains("bed_net_coverage"));
}

#[test]
fn rejects_out_of_range_temperature() {
    let dir = tempdir().unwrap();
    malaria_sim()
        .args(["--config", "tests/data/small_config.json", "--temperature=-5"])
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .failure();
}

#[test]
fn refuses_to_overwrite_reports() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("global_stats.csv"), "keep").unwrap();
    malaria_sim()
        .args(["--config", "tests/data/small_config.json", "--no-stats"])
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .failure();
    malaria_sim()
        .args(["--config", "tests/data/small_config.json", "--no-stats"])
        .arg("--force-overwrite")
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .success();
}

#[test]
fn summary_reports_capacity_drops() {
    let dir = tempdir().unwrap();
    let output = malaria_sim()
        .args(["--config", "tests/data/crowded_config.json"])
        .arg("--output-dir")
        .arg(dir.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(String::from_utf8(output).unwrap().contains("Capacity drops:"));

    let roomy = tempdir().unwrap();
    let output = malaria_sim()
        .args(["--config", "tests/data/small_config.json"])
        .arg("--output-dir")
        .arg(roomy.path())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    assert!(!String::from_utf8(output).unwrap().contains("Capacity drops:"));
}
