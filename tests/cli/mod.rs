use assert_cmd::prelude::*; // Add methods on commands
use std::fs::File;
use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::{Builder, TempDir};

use crate::{SHOP_SCHEMA, SHOP_SCHEMA_AUGMENTED};

const SCHEMA_FILE: &str = "shop.dbml";

fn setup_temp_schema(contents: &str) -> std::io::Result<TempDir> {
    let temp_dir = Builder::new()
        .prefix("dbml-refs-test-dir")
        .rand_bytes(5)
        .tempdir()?;

    let mut schema_file = File::create(temp_dir.path().join(SCHEMA_FILE))?;
    schema_file.write_all(contents.as_bytes())?;

    Ok(temp_dir)
}

#[test]
fn test_one_off_file() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = setup_temp_schema(SHOP_SCHEMA)?;

    let output = Command::cargo_bin("dbml-refs")?
        .arg("--one-off")
        .arg(temp_dir.path().join(SCHEMA_FILE))
        .output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim_end(),
        SHOP_SCHEMA_AUGMENTED
    );

    Ok(())
}

#[test]
fn test_one_off_stdin_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let mut child = Command::cargo_bin("dbml-refs")?
        .arg("--one-off")
        .arg("-")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;

    child
        .stdin
        .take()
        .expect("stdin is piped")
        .write_all(SHOP_SCHEMA_AUGMENTED.as_bytes())?;
    let output = child.wait_with_output()?;

    assert!(output.status.success());
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim_end(),
        SHOP_SCHEMA_AUGMENTED
    );

    Ok(())
}

#[test]
fn test_one_off_no_tables() -> Result<(), Box<dyn std::error::Error>> {
    let temp_dir = setup_temp_schema("Enum status {\n  active\n}\n")?;

    let output = Command::cargo_bin("dbml-refs")?
        .arg("--one-off")
        .arg(temp_dir.path().join(SCHEMA_FILE))
        .output()?;

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No table declarations found"));

    Ok(())
}

#[test]
fn test_invalid_config_from_env() -> Result<(), Box<dyn std::error::Error>> {
    let output = Command::cargo_bin("dbml-refs")?
        .env("DBML_REFS__UPSTREAM__TIMEOUT_SECONDS", "0")
        .env("RUST_LOG", "error")
        .output()?;

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("greater than 0"));

    Ok(())
}
