//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{DatabaseTarget, PracticeConfig, ReferencePolicyKind};
use super::secret::secret_string;
use crate::domain::errors::PracticeError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into PracticeConfig
/// 4. Applies environment variable overrides (PRACTICE_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, substitution or parsing fails,
/// or validation rejects a value.
///
/// # Examples
///
/// ```no_run
/// use practice_store::config::loader::load_config;
///
/// let config = load_config("practice.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<PracticeConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(PracticeError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        PracticeError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration from TOML text
///
/// Same pipeline as [`load_config`] minus the file read.
pub fn parse_config(contents: &str) -> Result<PracticeConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: PracticeConfig = toml::from_str(&contents)
        .map_err(|e| PracticeError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        PracticeError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is a valid regex")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(PracticeError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the PRACTICE_* prefix
///
/// Variables follow the pattern PRACTICE_<SECTION>_<KEY>, for example
/// PRACTICE_SQLITE_PATH or PRACTICE_VISITS_REFERENCE_POLICY.
fn apply_env_overrides(config: &mut PracticeConfig) -> Result<()> {
    if let Ok(val) = std::env::var("PRACTICE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    if let Ok(val) = std::env::var("PRACTICE_DATABASE_TARGET") {
        config.database_target = match val.to_lowercase().as_str() {
            "sqlite" => DatabaseTarget::Sqlite,
            "postgresql" => DatabaseTarget::PostgreSQL,
            other => {
                return Err(PracticeError::Configuration(format!(
                    "Invalid PRACTICE_DATABASE_TARGET '{}'. Must be sqlite or postgresql",
                    other
                )))
            }
        };
    }

    if let Some(ref mut sqlite) = config.sqlite {
        if let Ok(val) = std::env::var("PRACTICE_SQLITE_PATH") {
            sqlite.path = val;
        }
        if let Ok(val) = std::env::var("PRACTICE_SQLITE_BUSY_TIMEOUT_MS") {
            if let Ok(timeout) = val.parse() {
                sqlite.busy_timeout_ms = timeout;
            }
        }
    }

    if let Some(ref mut pg) = config.postgresql {
        if let Ok(val) = std::env::var("PRACTICE_POSTGRESQL_CONNECTION_STRING") {
            pg.connection_string = secret_string(val);
        }
        if let Ok(val) = std::env::var("PRACTICE_POSTGRESQL_MAX_CONNECTIONS") {
            if let Ok(max) = val.parse() {
                pg.max_connections = max;
            }
        }
        if let Ok(val) = std::env::var("PRACTICE_POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    if let Ok(val) = std::env::var("PRACTICE_VISITS_REFERENCE_POLICY") {
        config.visits.reference_policy = match val.to_lowercase().as_str() {
            "auto_repair" => ReferencePolicyKind::AutoRepair,
            "strict" => ReferencePolicyKind::Strict,
            other => {
                return Err(PracticeError::Configuration(format!(
                    "Invalid PRACTICE_VISITS_REFERENCE_POLICY '{}'. Must be auto_repair or strict",
                    other
                )))
            }
        };
    }

    if let Ok(val) = std::env::var("PRACTICE_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("PRACTICE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("PRACTICE_LOADER_TEST_VAR", "test_value");
        let input = "password = \"${PRACTICE_LOADER_TEST_VAR}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"test_value\"\n");
        std::env::remove_var("PRACTICE_LOADER_TEST_VAR");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("PRACTICE_LOADER_MISSING_VAR");
        let input = "password = \"${PRACTICE_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("PRACTICE_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        std::env::remove_var("PRACTICE_LOADER_COMMENTED_VAR");
        let input = "# key = \"${PRACTICE_LOADER_COMMENTED_VAR}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-practice.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
database_target = "sqlite"

[application]
log_level = "debug"

[sqlite]
path = "practice.sqlite"

[logging]
local_enabled = false
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.database_target, DatabaseTarget::Sqlite);
        assert_eq!(config.sqlite.unwrap().busy_timeout_ms, 5_000);
    }
}
