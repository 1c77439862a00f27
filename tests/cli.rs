use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn cicd() -> Command {
    let mut cmd = Command::cargo_bin("cicd").expect("binary built");
    cmd.env_remove("RUST_LOG").env("NO_COLOR", "1");
    cmd
}

#[test]
fn version_flag_prints_the_package_version() {
    cicd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "cicd, version {}",
            env!("CARGO_PKG_VERSION")
        )));

    cicd()
        .arg("-v")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("cicd, version"));
}

#[test]
fn help_lists_the_actions() {
    cicd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--create"))
        .stdout(predicate::str::contains("--restore"))
        .stdout(predicate::str::contains("--env"))
        .stdout(predicate::str::contains("--directory"));
}

#[test]
fn actions_cannot_be_combined() {
    cicd()
        .args(["--create", "--restore"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn restore_outside_a_project_fails() {
    let tmp = tempfile::tempdir().expect("tempdir");

    cicd()
        .arg("--restore")
        .arg("--directory")
        .arg(tmp.path())
        .env("CICD_TOOLS_TEMPLATES", tmp.path().join("templates"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error"))
        .stderr(predicate::str::contains("not a valid cicd project"));

    assert!(!tmp.path().join(".app_cache").exists());
}

#[test]
fn restore_resets_the_configuration() {
    let tmp = tempfile::tempdir().expect("tempdir");
    fs::write(tmp.path().join("pyproject.toml"), "[project]\nname = \"demo\"\n")
        .expect("pyproject");
    let cache = tmp.path().join(".app_cache");
    fs::create_dir_all(&cache).expect("mkdir");
    fs::write(
        cache.join("config.toml"),
        "[execution]\ncapture_output = false\n\n[custom]\nkey = \"value\"\n",
    )
    .expect("config");

    cicd()
        .args(["-r", "-d"])
        .arg(tmp.path())
        .env("CICD_TOOLS_TEMPLATES", tmp.path().join("templates"))
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration reset to defaults"));

    let config = fs::read_to_string(cache.join("config.toml")).expect("read config");
    assert!(config.contains("capture_output = true"));
    assert!(!config.contains("[custom]"));
    assert!(config.contains("[styling]"));
}

#[test]
fn missing_directory_is_reported() {
    let tmp = tempfile::tempdir().expect("tempdir");

    cicd()
        .arg("--restore")
        .arg("-d")
        .arg(tmp.path().join("does-not-exist"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}
