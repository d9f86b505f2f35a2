//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::{contains, starts_with};
use tempfile::TempDir;

const TARGET: &str = "cacb5448-46b0-4808-980d-5521775671c0";

fn store_path() -> String {
    format!("{}/tests/fixtures/instances.json", env!("CARGO_MANIFEST_DIR"))
}

fn workdir() -> TempDir {
    TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"))
}

#[test]
fn cli_without_subcommand_prints_usage() {
    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.assert().failure().stderr(contains("Usage"));
}

#[test]
fn prepare_host_prints_script_on_stdout() {
    let dir = workdir();
    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.current_dir(dir.path())
        .env("STAGEHAND_DEPLOYMENT_CHANGES", "true")
        .args(["prepare-host", "--stdout", "--instance", TARGET, "--store"])
        .arg(store_path());
    cmd.assert()
        .success()
        .stdout(starts_with("#!/bin/bash\n"))
        .stdout(contains("docker pull mekomsolutions/bahmni:cambodia-release-0.90"));
}

#[test]
fn start_instance_saves_executable_script() {
    let dir = workdir();
    let build_dir = dir.path().join("build");
    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.current_dir(dir.path())
        .env("STAGEHAND_INSTANCE_UUID", TARGET)
        .env("STAGEHAND_STORE_PATH", store_path())
        .env("STAGEHAND_PROPERTIES_CHANGES", "true")
        .arg("start-instance")
        .arg("--build-dir")
        .arg(&build_dir);
    cmd.assert().success().stdout("");

    let script_path = build_dir.join("start-instance.sh");
    let script = std::fs::read_to_string(&script_path)
        .unwrap_or_else(|err| panic!("read {}: {err}", script_path.display()));
    assert!(script.starts_with("#!/bin/bash\n# Autogenerated script for the instance start...\n"));
    assert!(script.contains("docker restart cambodia1\n"), "script: {script}");

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(&script_path)
            .unwrap_or_else(|err| panic!("metadata: {err}"))
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[test]
fn project_file_change_flags_reach_the_script() {
    let dir = workdir();
    let config = format!(
        "instance_uuid = \"{TARGET}\"\nstore_path = \"{}\"\ndeployment_changes = true\n",
        store_path()
    );
    std::fs::write(dir.path().join("stagehand.toml"), config)
        .unwrap_or_else(|err| panic!("write stagehand.toml: {err}"));

    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.current_dir(dir.path())
        .env_remove("STAGEHAND_CONFIG_PATH")
        .args(["prepare-host", "--stdout"]);
    cmd.assert()
        .success()
        .stdout(contains("docker pull mekomsolutions/bahmni:cambodia-release-0.90"));
}

#[test]
fn unknown_instance_fails_without_writing() {
    let dir = workdir();
    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.current_dir(dir.path())
        .args(["monitor-startup", "--instance", "does-not-exist", "--store"])
        .arg(store_path());
    cmd.assert()
        .failure()
        .stderr(contains("empty or unexisting instance definition"));
    assert!(!dir.path().join("build").exists());
}

#[test]
fn missing_instance_uuid_names_the_setting() {
    let dir = workdir();
    let mut cmd = cargo_bin_cmd!("stagehand");
    cmd.current_dir(dir.path())
        .env_remove("STAGEHAND_INSTANCE_UUID")
        .args(["prepare-host", "--stdout", "--store"])
        .arg(store_path());
    cmd.assert()
        .failure()
        .stderr(contains("STAGEHAND_INSTANCE_UUID"));
}
