// tests/config_loading.rs

mod common;
use crate::common::init_tracing;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use scriptexec::config::{ConfigFile, RawConfigFile, load_and_validate, load_or_default};
use scriptexec::errors::ScriptexecError;
use scriptexec_test_utils::builders::{ConfigFileBuilder, ScriptConfigBuilder};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn full_config_is_parsed() {
    init_tracing();
    let file = write_config(
        r#"
[config]
logs_dir = "/var/tmp/scriptexec"
max_tasks = 10
progress_step = 2
progress_cap = 90
poll_interval = "1s"

[script.sample]
path = "/usr/bin/python3"
args = ["backend/sample_script.py"]
description = "demo"

[script.hello]
path = "/bin/echo"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.config.logs_dir, PathBuf::from("/var/tmp/scriptexec"));
    assert_eq!(cfg.config.max_tasks, 10);
    assert_eq!(cfg.config.progress_step, 2);
    assert_eq!(cfg.config.progress_cap, 90);
    assert_eq!(cfg.config.poll_interval(), Ok(Duration::from_secs(1)));

    assert_eq!(cfg.script.len(), 2);
    let sample = cfg.script.get("sample").expect("sample must exist");
    assert_eq!(sample.path, PathBuf::from("/usr/bin/python3"));
    assert_eq!(sample.args, vec!["backend/sample_script.py".to_string()]);
    assert_eq!(sample.description.as_deref(), Some("demo"));

    let hello = cfg.script.get("hello").expect("hello must exist");
    assert!(hello.args.is_empty());
    assert!(hello.description.is_none());
}

#[test]
fn empty_config_uses_defaults() {
    let file = write_config("");
    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.config.logs_dir, PathBuf::from("logs"));
    assert_eq!(cfg.config.max_tasks, 100);
    assert_eq!(cfg.config.progress_step, 5);
    assert_eq!(cfg.config.progress_cap, 95);
    assert_eq!(cfg.config.poll_interval(), Ok(Duration::from_millis(250)));
    assert!(cfg.script.is_empty());
}

#[test]
fn missing_default_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_or_default(dir.path().join("Scriptexec.toml")).unwrap();
    assert_eq!(cfg.config.max_tasks, 100);
}

#[test]
fn explicit_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("nope.toml"));
    assert!(matches!(result, Err(ScriptexecError::IoError(_))));
}

#[test]
fn malformed_toml_is_reported() {
    let file = write_config("[config\nmax_tasks = ");
    let result = load_and_validate(file.path());
    assert!(matches!(result, Err(ScriptexecError::TomlError(_))));
}

#[test]
fn progress_cap_of_one_hundred_is_rejected() {
    let result = ConfigFile::try_from(ConfigFileBuilder::new().progress(5, 100).raw());
    match result {
        Err(ScriptexecError::ConfigError(msg)) => assert!(msg.contains("progress_cap")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn zero_limits_are_rejected() {
    assert!(matches!(
        ConfigFile::try_from(ConfigFileBuilder::new().max_tasks(0).raw()),
        Err(ScriptexecError::ConfigError(_))
    ));
    assert!(matches!(
        ConfigFile::try_from(ConfigFileBuilder::new().progress(0, 95).raw()),
        Err(ScriptexecError::ConfigError(_))
    ));
}

#[test]
fn bad_poll_interval_is_rejected() {
    for value in ["soon", "10", "5 parsecs", "0ms"] {
        let mut raw = RawConfigFile::default();
        raw.config.poll_interval = value.to_string();
        match ConfigFile::try_from(raw) {
            Err(ScriptexecError::ConfigError(msg)) => assert!(msg.contains("poll_interval")),
            other => panic!("expected ConfigError for {value:?}, got {other:?}"),
        }
    }
}

#[test]
fn script_with_empty_path_is_rejected() {
    let raw = ConfigFileBuilder::new()
        .with_script("broken", ScriptConfigBuilder::new("").build())
        .raw();
    match ConfigFile::try_from(raw) {
        Err(ScriptexecError::ConfigError(msg)) => assert!(msg.contains("broken")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}
