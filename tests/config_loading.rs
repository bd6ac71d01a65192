// tests/config_loading.rs

mod common;
use common::init_tracing;

use std::error::Error;
use std::fs;

use limitprobe::config::load_or_default;
use limitprobe::errors::ProbeError;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn missing_config_file_yields_defaults() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let cfg = load_or_default(dir.path().join("Limitprobe.toml"))?;

    assert_eq!(cfg.runner.scripts_dir, "scripts");
    assert_eq!(cfg.runner.grace_secs, 3);
    assert_eq!(cfg.runner.start_num, 1);
    assert_eq!(cfg.runner.end_num, 600);
    assert_eq!(cfg.device.adb, "adb");
    assert!(cfg.device.device_name.is_none());
    Ok(())
}

#[test]
fn config_file_overrides_defaults() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Limitprobe.toml");
    fs::write(
        &path,
        r#"
[runner]
interpreter = "python3.12"
scripts_dir = "probe-scripts"
grace_secs = 5
start_num = 100
end_num = 200

[device]
adb = "/opt/platform-tools/adb"
device_name = "R3CN40XXXXX"
platform_version = "14"
"#,
    )?;

    let cfg = load_or_default(&path)?;
    assert_eq!(cfg.runner.interpreter, "python3.12");
    assert_eq!(cfg.runner.scripts_dir, "probe-scripts");
    assert_eq!(cfg.runner.grace_secs, 5);
    assert_eq!(cfg.runner.start_num, 100);
    assert_eq!(cfg.runner.end_num, 200);
    assert_eq!(cfg.device.adb, "/opt/platform-tools/adb");
    assert_eq!(cfg.device.device_name.as_deref(), Some("R3CN40XXXXX"));
    assert_eq!(cfg.device.platform_version.as_deref(), Some("14"));
    Ok(())
}

#[test]
fn partial_config_keeps_remaining_defaults() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Limitprobe.toml");
    fs::write(&path, "[runner]\nend_num = 50\n")?;

    let cfg = load_or_default(&path)?;
    assert_eq!(cfg.runner.end_num, 50);
    assert_eq!(cfg.runner.start_num, 1);
    assert_eq!(cfg.runner.scripts_dir, "scripts");
    Ok(())
}

#[test]
fn inverted_probe_range_is_rejected() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Limitprobe.toml");
    fs::write(&path, "[runner]\nstart_num = 10\nend_num = 5\n")?;

    let err = load_or_default(&path).unwrap_err();
    assert!(matches!(err, ProbeError::ConfigError(_)));
    Ok(())
}

#[test]
fn zero_grace_period_is_rejected() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Limitprobe.toml");
    fs::write(&path, "[runner]\ngrace_secs = 0\n")?;

    let err = load_or_default(&path).unwrap_err();
    assert!(matches!(err, ProbeError::ConfigError(_)));
    Ok(())
}

#[test]
fn malformed_toml_is_a_parse_error() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Limitprobe.toml");
    fs::write(&path, "[runner\ninterpreter = \n")?;

    let err = load_or_default(&path).unwrap_err();
    assert!(matches!(err, ProbeError::TomlError(_)));
    Ok(())
}
