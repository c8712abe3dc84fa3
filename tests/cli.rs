// ABOUTME: Integration tests for the aksdeploy CLI commands.
// ABOUTME: Validates --help output, init, env editing and deploy preconditions.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn aksdeploy_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("aksdeploy"));
    cmd.env_remove("AKSDEPLOY_ENV").env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_shows_commands() {
    aksdeploy_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("deploy"))
        .stdout(predicate::str::contains("env"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("aksdeploy.yml");

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--project", "shop", "--service", "web"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created aksdeploy.yml"));

    assert!(config_path.exists(), "aksdeploy.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("name: shop"), "{content}");
    assert!(content.contains("  web:"), "{content}");
    assert!(content.contains("host: aks"), "{content}");
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("aksdeploy.yml");

    fs::write(&config_path, "name: existing").unwrap();

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(fs::read_to_string(&config_path).unwrap(), "name: existing");
}

#[test]
fn init_force_overwrites_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("aksdeploy.yml");

    fs::write(&config_path, "name: existing").unwrap();

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--force", "--project", "shop"])
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("name: shop"), "{content}");
}

#[test]
fn env_set_then_list_round_trips() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("aksdeploy.yml"), "name: shop\n").unwrap();

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .args(["env", "-e", "dev", "set", "SERVICE_WEB_PORT", "8080"])
        .assert()
        .success();

    assert!(temp_dir.path().join(".aksdeploy/dev/env.yml").exists());

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .args(["env", "-e", "dev", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("SERVICE_WEB_PORT=8080"));

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .args(["env", "-e", "dev", "get", "SERVICE_WEB_PORT"])
        .assert()
        .success()
        .stdout("8080\n");
}

#[test]
fn env_get_missing_key_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("aksdeploy.yml"), "name: shop\n").unwrap();

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .args(["env", "-e", "dev", "get", "SERVICE_WEB_MISSING"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("SERVICE_WEB_MISSING"));
}

#[test]
fn deploy_without_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .args(["deploy", "web"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn deploy_unknown_service_fails() {
    let temp_dir = tempfile::tempdir().unwrap();
    fs::write(temp_dir.path().join("aksdeploy.yml"), "name: shop\n").unwrap();

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .args(["deploy", "web", "-e", "dev"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown service: web"));
}

#[test]
fn deploy_reports_missing_cluster_before_scope() {
    let temp_dir = tempfile::tempdir().unwrap();

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--project", "shop", "--service", "web"])
        .assert()
        .success();

    aksdeploy_cmd()
        .current_dir(temp_dir.path())
        .env_remove("AZURE_AKS_CLUSTER_NAME")
        .env_remove("AZURE_CONTAINER_REGISTRY_ENDPOINT")
        .env_remove("AZURE_SUBSCRIPTION_ID")
        .env_remove("AZURE_RESOURCE_GROUP")
        .args(["deploy", "web", "-e", "dev"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not determine AKS cluster"))
        .stderr(predicate::str::contains("AZURE_SUBSCRIPTION_ID").not());
}
