//! Integration tests for logging functionality
//!
//! `init_logging` installs a global subscriber and can only run once per
//! process, so it gets a single test here; the rest exercise the pieces it is
//! built from.

use clap::Parser;
use practice_store::cli::Cli;
use practice_store::config::LoggingConfig;
use practice_store::domain::{PracticeError, ReferenceKind};
use practice_store::logging::{build_filter, init_logging, parse_rotation, LOG_FILE_NAME};
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
    assert_eq!(config.local_path, "logs");
}

#[test]
fn test_console_only_config() {
    let config = LoggingConfig::console_only();
    assert!(!config.local_enabled);
    assert!(config.local_path.is_empty());
}

#[test]
fn test_logging_rotation_types() {
    for rotation in ["daily", "hourly", "never"] {
        assert!(parse_rotation(rotation).is_ok(), "rejected {rotation}");
    }
    assert!(parse_rotation("size").is_err());
}

#[test]
fn test_invalid_level_is_rejected() {
    let err = build_filter("chatty").unwrap_err();
    assert!(matches!(err, PracticeError::Configuration(_)));
}

#[test]
fn test_config_file_enables_file_output() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");
    let config_path = temp_dir.path().join("practice.toml");
    std::fs::write(
        &config_path,
        format!(
            r#"
database_target = "sqlite"

[application]
log_level = "debug"

[sqlite]
path = ":memory:"

[logging]
local_enabled = true
local_path = "{}"
local_rotation = "never"
"#,
            log_path.to_string_lossy().replace('\\', "/")
        ),
    )
    .unwrap();

    let cli = Cli::parse_from([
        "practice-store",
        "--config",
        config_path.to_str().unwrap(),
        "status",
    ]);
    let (level, logging) = cli.logging_settings();
    assert_eq!(level, "debug");
    assert!(logging.local_enabled);

    let guard = init_logging(&level, &logging).expect("logging initializes");
    assert!(guard.has_file_output());
    assert!(log_path.exists());

    tracing::info!("file layer smoke test");
    practice_store::log_reference_repaired!(ReferenceKind::Billable, "P100", "P100");
    drop(guard);

    // "Logging initialized" is a debug event inside the crate
    let written = std::fs::read_to_string(log_path.join(LOG_FILE_NAME)).unwrap();
    if std::env::var_os("RUST_LOG").is_none() {
        assert!(written.contains("Logging initialized"));
    }
    assert!(written.lines().all(|line| line.starts_with('{')));
}
