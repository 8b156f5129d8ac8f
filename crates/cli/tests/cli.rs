//! CLI tests that need no storage backend
//!
//! Each test writes its own configuration file and runs the `sm` binary
//! against it.

use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

const MEDIA_CONFIG: &str = r#"
schema_version = 1

[stores.media]
AWS_STORAGE_BUCKET_NAME = "my-bucket"
AWS_DEFAULT_ACL = "private"
AWS_LOCATION = "media"
AWS_ACCESS_KEY_ID = "AKIAEXAMPLE"
AWS_SECRET_ACCESS_KEY = "very-secret"
AWS_QUERYSTRING_AUTH = false

[stores.static]
AWS_STORAGE_BUCKET_NAME = "static-bucket"
AWS_S3_CUSTOM_DOMAIN = "cdn.example.com"
"#;

fn write_config(content: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.toml"), content).unwrap();
    dir
}

fn run_sm(args: &[&str], config_dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sm"))
        .arg("--config")
        .arg(config_dir.join("config.toml"))
        .args(args)
        .env_remove("SM_CONFIG")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute sm command")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_stores_list_json() {
    let dir = write_config(MEDIA_CONFIG);
    let output = run_sm(&["stores", "list", "--json"], dir.path());
    assert!(output.status.success());

    let json = stdout_json(&output);
    let stores = json["stores"].as_array().unwrap();
    assert_eq!(stores.len(), 2);
    assert_eq!(stores[0]["name"], "media");
    assert_eq!(stores[0]["bucket"], "my-bucket");
    assert_eq!(stores[0]["location"], "media");
    assert_eq!(stores[1]["name"], "static");
}

#[test]
fn test_stores_list_human() {
    let dir = write_config(MEDIA_CONFIG);
    let output = run_sm(&["stores", "list", "--no-color"], dir.path());
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "media\nstatic\n");
}

#[test]
fn test_stores_show_resolves_chained_defaults() {
    let dir = write_config(MEDIA_CONFIG);
    let output = run_sm(&["stores", "show", "media", "--json"], dir.path());
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["name"], "media");
    assert_eq!(json["bucket_name"], "my-bucket");
    assert_eq!(json["default_acl"], "private");
    assert_eq!(json["bucket_acl"], "private");
    assert_eq!(json["access_key"], "AKIAEXAMPLE");
    assert_eq!(json["secret_key"], "********");
    assert_eq!(json["querystring_expire"], 3600);
    assert!(!String::from_utf8_lossy(&output.stdout).contains("very-secret"));
}

#[test]
fn test_stores_show_unknown_store() {
    let dir = write_config(MEDIA_CONFIG);
    let output = run_sm(&["stores", "show", "missing"], dir.path());
    assert_eq!(output.status.code(), Some(5));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Store not found: missing"));
}

#[test]
fn test_environment_overrides_file() {
    let dir = write_config(MEDIA_CONFIG);
    let output = Command::new(env!("CARGO_BIN_EXE_sm"))
        .arg("--config")
        .arg(dir.path().join("config.toml"))
        .args(["stores", "show", "media", "--json"])
        .env_remove("SM_CONFIG")
        .env("SM_MEDIA_AWS_STORAGE_BUCKET_NAME", "from-env")
        .output()
        .expect("Failed to execute sm command");
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["bucket_name"], "from-env");
}

#[test]
fn test_check_valid_config() {
    let dir = write_config(MEDIA_CONFIG);
    let output = run_sm(&["check", "--json"], dir.path());
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["valid"], true);
    assert_eq!(json["stores"], 2);
    assert!(json["warnings"].as_array().unwrap().is_empty());
}

#[test]
fn test_missing_config_is_empty_registry() {
    let dir = TempDir::new().unwrap();
    let output = run_sm(&["check", "--json"], dir.path());
    assert!(output.status.success());
    assert_eq!(stdout_json(&output)["stores"], 0);
}

#[test]
fn test_non_table_store_is_usage_error() {
    let dir = write_config(
        r#"
        schema_version = 1

        [stores]
        media = "my-bucket"
        "#,
    );
    let output = run_sm(&["check"], dir.path());
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("media"));
}

#[test]
fn test_invalid_setting_is_usage_error() {
    let dir = write_config(
        r#"
        schema_version = 1

        [stores.media]
        AWS_QUERYSTRING_EXPIRE = "soon"
        "#,
    );
    let output = run_sm(&["stores", "list"], dir.path());
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("AWS_QUERYSTRING_EXPIRE"));
}

#[test]
fn test_malformed_file_is_usage_error() {
    let dir = write_config("stores = [");
    let output = run_sm(&["check"], dir.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_url_without_signing() {
    let dir = write_config(MEDIA_CONFIG);
    let output = run_sm(&["url", "media/images/logo 1.png"], dir.path());
    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "https://my-bucket.s3.amazonaws.com/media/images/logo%201.png"
    );
}

#[test]
fn test_url_with_custom_domain() {
    let dir = write_config(MEDIA_CONFIG);
    let output = run_sm(&["url", "static/css/site.css", "--json"], dir.path());
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output)["url"],
        "http://cdn.example.com/css/site.css"
    );
}

#[test]
fn test_object_command_on_unknown_store() {
    let dir = write_config(MEDIA_CONFIG);
    let output = run_sm(&["stat", "missing/a.txt"], dir.path());
    assert_eq!(output.status.code(), Some(5));
}

#[test]
fn test_object_path_without_name_is_usage_error() {
    let dir = write_config(MEDIA_CONFIG);
    let output = run_sm(&["cat", "media"], dir.path());
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_completions_skip_configuration() {
    let dir = write_config("stores = [");
    let output = run_sm(&["completions", "bash"], dir.path());
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("sm"));
}

#[test]
fn test_names_that_normalize_away_are_rejected() {
    let dir = write_config(MEDIA_CONFIG);
    let file = dir.path().join("config.toml");
    let file = file.to_string_lossy().to_string();

    for args in [
        vec!["url", "media/a/.."],
        vec!["cat", "media/."],
        vec!["rm", "media/a/.."],
        vec!["put", file.as_str(), "media/."],
    ] {
        let output = run_sm(&args, dir.path());
        assert_eq!(output.status.code(), Some(2), "{args:?}");
        assert!(String::from_utf8_lossy(&output.stderr).contains("does not name an object"));
    }
}
