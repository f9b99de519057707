#![allow(deprecated)] // TODO: cargo_bin → cargo_bin_cmd! へ移行

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

fn catalogue_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config")
}

/// 設定ファイルや環境変数の影響を受けないコマンド
fn kie() -> Command {
    let mut cmd = Command::cargo_bin("kie").unwrap();
    cmd.current_dir(std::env::temp_dir())
        .env_remove("KIEAPP_CONFIG_PATH")
        .env_remove("KIEAPP_CATALOGUE_DIR")
        .env_remove("WATCH_NAMESPACE")
        .env_remove("OPERATOR_NAME")
        .arg("--catalogue")
        .arg(catalogue_dir());
    cmd
}

fn write_app(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

const TRIAL_APP: &str = r#"
metadata:
  name: myapp
spec:
  environment: rhpam-trial
"#;

/// CLIヘルプが正しく表示されることを確認
#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("kie").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("context"))
        .stdout(predicate::str::contains("configmaps"));
}

/// バージョン表示が正しく動作することを確認
#[test]
fn test_cli_version() {
    let mut cmd = Command::cargo_bin("kie").unwrap();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("kie"))
        .stdout(predicate::str::contains("7.8.0"));
}

/// 不正なコマンドでエラーになることを確認
#[test]
fn test_invalid_command() {
    let mut cmd = Command::cargo_bin("kie").unwrap();
    cmd.arg("invalid-command").assert().failure();
}

#[test]
fn test_resolve_trial() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_app(&dir, "app.yaml", TRIAL_APP);

    kie()
        .arg("resolve")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("name: myapp-rhpamcentr"))
        .stdout(predicate::str::contains("name: myapp-kieserver"))
        .stdout(predicate::str::contains("KIE_SERVER_ROUTER_SERVICE").not())
        .stderr(predicate::str::contains("myapp"));
}

#[test]
fn test_resolve_json_input_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_app(
        &dir,
        "app.json",
        r#"{"metadata": {"name": "jsonapp"}, "spec": {"environment": "rhdm-trial"}}"#,
    );

    let output = kie()
        .arg("resolve")
        .arg(&file)
        .arg("--format")
        .arg("json")
        .output()
        .unwrap();
    assert!(output.status.success());

    let env: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(
        env["console"]["workloads"][0]["metadata"]["name"],
        "jsonapp-rhdmcentr"
    );
    assert_eq!(env["smartRouter"]["omit"], true);
}

/// 更新後のリソースに生成既定値が保存されることを確認
#[test]
fn test_resolve_writes_updated_app() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_app(&dir, "app.yaml", TRIAL_APP);
    let out = dir.path().join("updated.yaml");

    kie()
        .arg("resolve")
        .arg(&file)
        .arg("--app-out")
        .arg(&out)
        .assert()
        .success();

    let updated = fs::read_to_string(&out).unwrap();
    assert!(updated.contains("generated:"));
    assert!(updated.contains("adminPassword: RedHat"));
    assert!(updated.contains("version: 7.8.0"));

    // 書き出したリソースを再入力しても解決できる
    kie().arg("resolve").arg(&out).assert().success();
}

#[test]
fn test_context_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_app(&dir, "app.yaml", TRIAL_APP);

    let output = kie().arg("context").arg(&file).output().unwrap();
    assert!(output.status.success());

    let context: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(context["application_name"], "myapp");
    assert_eq!(context["servers"][0]["kie_name"], "myapp-kieserver");
    assert_eq!(context["servers"][0]["database"]["type"], "h2");
}

#[test]
fn test_configmaps_output() {
    kie()
        .arg("configmaps")
        .arg("--namespace")
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("kieconfigs-7.8.0"))
        .stdout(predicate::str::contains("namespace: demo"));
}

#[test]
fn test_missing_file_fails() {
    kie()
        .arg("resolve")
        .arg("does-not-exist.yaml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_external_database_without_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_app(
        &dir,
        "app.yaml",
        r#"
metadata:
  name: myapp
spec:
  environment: rhpam-production
  objects:
    servers:
      - database:
          type: external
"#,
    );

    kie()
        .arg("resolve")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("myapp-kieserver"));
}

#[test]
fn test_unknown_catalogue_version_fails() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_app(&dir, "app.yaml", TRIAL_APP);
    let empty = tempfile::tempdir().unwrap();

    let mut cmd = Command::cargo_bin("kie").unwrap();
    cmd.current_dir(std::env::temp_dir())
        .env_remove("KIEAPP_CONFIG_PATH")
        .env_remove("WATCH_NAMESPACE")
        .env_remove("OPERATOR_NAME")
        .env("KIEAPP_CATALOGUE_DIR", empty.path())
        .arg("resolve")
        .arg(&file)
        .assert()
        .failure();
}

/// オペレーターの環境変数でサーバーイメージを差し替える
#[test]
fn test_resolve_with_image_override() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_app(
        &dir,
        "app.yaml",
        r#"
metadata:
  name: myapp
spec:
  environment: rhpam-trial
  version: 7.7.1
"#,
    );

    let output = temp_env::with_var(
        "RELATED_IMAGE_PAM_KIESERVER_IMAGE_7.7.1",
        Some("registry.example.com/rhpam-kieserver@sha256:cli"),
        || {
            kie()
                .arg("resolve")
                .arg(&file)
                .arg("--format")
                .arg("json")
                .output()
                .unwrap()
        },
    );
    assert!(output.status.success());

    let env: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let server = &env["servers"][0]["workloads"][0];
    assert_eq!(
        server["containers"][0]["image"],
        "registry.example.com/rhpam-kieserver@sha256:cli"
    );
    let triggers = server["triggers"].as_array().unwrap();
    assert_eq!(triggers.len(), 1);
    assert_eq!(triggers[0]["type"], "ConfigChange");

    // コンソールは既定イメージのまま
    let console = &env["console"]["workloads"][0];
    assert_eq!(console["triggers"].as_array().unwrap().len(), 2);
}
