use assert_cmd::Command;
use chrono::Local;
use typetrial::session::SessionResult;
use typetrial::stats::{ResultStore, StatsDb};

fn seed(path: &std::path::Path) {
    let mut db = StatsDb::open(path).unwrap();
    for (name, wpm) in [("ada", 41), ("bob", 33)] {
        db.save(&SessionResult {
            username: name.to_string(),
            wpm,
            accuracy: 95,
            total_chars: 220,
            correct_chars: 209,
            incorrect_chars: 11,
            cpm: 220,
            duration_secs: 60,
            timestamp: Local::now(),
        })
        .unwrap();
    }
}

#[test]
fn export_history_writes_csv_without_a_tty() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("stats.db");
    let out = dir.path().join("history.csv");
    seed(&db);

    Command::cargo_bin("typetrial")
        .unwrap()
        .arg("--db")
        .arg(&db)
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .arg("--export-history")
        .arg(&out)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&out).unwrap();
    assert!(csv.starts_with("username,wpm,accuracy"));
    assert!(csv.contains("ada,41,95"));
    assert!(csv.contains("bob,33,95"));
}

#[test]
fn export_history_can_filter_by_user() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("stats.db");
    let out = dir.path().join("ada.csv");
    seed(&db);

    Command::cargo_bin("typetrial")
        .unwrap()
        .arg("--db")
        .arg(&db)
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .args(["--export-history"])
        .arg(&out)
        .args(["--user", "ada"])
        .assert()
        .success();

    let csv = std::fs::read_to_string(&out).unwrap();
    assert_eq!(csv.lines().count(), 2);
    assert!(!csv.contains("bob"));
}

#[test]
fn user_filter_requires_export() {
    Command::cargo_bin("typetrial")
        .unwrap()
        .args(["--user", "ada"])
        .assert()
        .failure();
}

#[test]
fn zero_second_trial_is_rejected() {
    Command::cargo_bin("typetrial")
        .unwrap()
        .args(["--secs", "0"])
        .assert()
        .failure();
}

#[cfg(target_os = "linux")]
#[test]
fn unwritable_log_location_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    // A regular file where the data directory should be.
    let blocker = dir.path().join("data");
    std::fs::write(&blocker, "").unwrap();
    let db = dir.path().join("stats.db");
    seed(&db);

    let output = Command::cargo_bin("typetrial")
        .unwrap()
        .env("HOME", dir.path())
        .env("XDG_DATA_HOME", &blocker)
        .arg("--db")
        .arg(&db)
        .arg("--config")
        .arg(dir.path().join("config.json"))
        .arg("--export-history")
        .arg(dir.path().join("out.csv"))
        .output()
        .unwrap();

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("logging disabled"), "stderr: {stderr}");
}
