//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{RoiConfig, SourceKindConfig};
use crate::config::secret_string;
use crate::core::compile::OnBlocked;
use crate::core::validation::ValidationLevel;
use crate::domain::errors::RoiError;
use crate::domain::result::Result;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static placeholder regex"))
}

/// Loads configuration from a TOML file
///
/// 1. Reads the TOML file
/// 2. Substitutes `${VAR}` placeholders from the environment
/// 3. Parses the TOML into [`RoiConfig`]
/// 4. Applies `ROI_*` environment overrides
/// 5. Validates the result
///
/// # Errors
///
/// Every failure is reported as [`RoiError::Configuration`].
///
/// # Examples
///
/// ```no_run
/// use dora_roi::config::loader::load_config;
///
/// let config = load_config("roi.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<RoiConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(RoiError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        RoiError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    parse_config(&contents)
}

/// Parses configuration text; the same pipeline as [`load_config`] minus
/// the file read
pub fn parse_config(contents: &str) -> Result<RoiConfig> {
    let contents = substitute_env_vars(contents)?;

    let mut config: RoiConfig = toml::from_str(&contents)
        .map_err(|e| RoiError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        RoiError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes `${VAR_NAME}` placeholders outside comment lines
///
/// # Errors
///
/// Lists every referenced variable that is not set.
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = placeholder_regex();
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
                    processed_line = processed_line.replace(&format!("${{{}}}", var_name), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|m| m == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(RoiError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        RoiError::Configuration(format!("Invalid value '{}' for {}", value, name))
    })
}

/// Applies environment overrides of the form `ROI_<SECTION>_<KEY>`
///
/// For example: `ROI_COMPILE_VALIDATION_LEVEL=strict`,
/// `ROI_SOURCE_POSTGRESQL_CONNECTION_STRING=postgresql://...`
fn apply_env_overrides(config: &mut RoiConfig) -> Result<()> {
    let var = |name: &str| std::env::var(name).ok();

    if let Some(val) = var("ROI_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Source overrides
    if let Some(val) = var("ROI_SOURCE_KIND") {
        config.source.kind = match val.to_lowercase().as_str() {
            "snapshot" => SourceKindConfig::Snapshot,
            "postgresql" => SourceKindConfig::PostgreSQL,
            _ => {
                return Err(RoiError::Configuration(format!(
                    "Invalid value '{}' for ROI_SOURCE_KIND",
                    val
                )))
            }
        };
    }
    if let Some(val) = var("ROI_SOURCE_SNAPSHOT_PATH") {
        config.source.snapshot_path = Some(val);
    }
    if let Some(ref mut pg) = config.source.postgresql {
        if let Some(val) = var("ROI_SOURCE_POSTGRESQL_CONNECTION_STRING") {
            pg.connection_string = secret_string(val);
        }
        if let Some(val) = var("ROI_SOURCE_POSTGRESQL_MAX_CONNECTIONS") {
            pg.max_connections = parse_override("ROI_SOURCE_POSTGRESQL_MAX_CONNECTIONS", &val)?;
        }
        if let Some(val) = var("ROI_SOURCE_POSTGRESQL_SSL_MODE") {
            pg.ssl_mode = val;
        }
    }

    // Compile overrides
    if let Some(val) = var("ROI_COMPILE_VALIDATION_LEVEL") {
        config.compile.validation_level =
            parse_override::<ValidationLevel>("ROI_COMPILE_VALIDATION_LEVEL", &val)?;
    }
    if let Some(val) = var("ROI_COMPILE_ON_BLOCKED") {
        config.compile.on_blocked = parse_override::<OnBlocked>("ROI_COMPILE_ON_BLOCKED", &val)?;
    }
    if let Some(val) = var("ROI_COMPILE_TEMPLATES") {
        config.compile.templates = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
    if let Some(val) = var("ROI_COMPILE_BUILD_CONCURRENCY") {
        config.compile.build_concurrency = parse_override("ROI_COMPILE_BUILD_CONCURRENCY", &val)?;
    }

    // Output overrides
    if let Some(val) = var("ROI_OUTPUT_DIRECTORY") {
        config.output.directory = val;
    }
    if let Some(val) = var("ROI_OUTPUT_OVERWRITE") {
        config.output.overwrite = parse_override("ROI_OUTPUT_OVERWRITE", &val)?;
    }

    // Logging overrides
    if let Some(val) = var("ROI_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = parse_override("ROI_LOGGING_LOCAL_ENABLED", &val)?;
    }
    if let Some(val) = var("ROI_LOGGING_LOCAL_PATH") {
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
        std::env::set_var("ROI_LOADER_TEST_SECRET", "s3cret");
        let input = "password = \"${ROI_LOADER_TEST_SECRET}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "password = \"s3cret\"\n");
        std::env::remove_var("ROI_LOADER_TEST_SECRET");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        let input = "password = \"${ROI_LOADER_TEST_NEVER_SET}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("ROI_LOADER_TEST_NEVER_SET"));
    }

    #[test]
    fn test_placeholders_in_comments_are_ignored() {
        let input = "# password = \"${ROI_LOADER_TEST_NEVER_SET}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("nonexistent-roi.toml").unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_load_config_valid() {
        let toml_content = r#"
environment = "staging"

[application]
log_level = "debug"

[source]
kind = "snapshot"
snapshot_path = "records.json"

[compile]
validation_level = "strict"
on_blocked = "draft"
templates = ["B_01.01", "B_05.01"]

[output]
directory = "./register"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.application.log_level, "debug");
        assert_eq!(config.source.snapshot_path.as_deref(), Some("records.json"));
        assert_eq!(config.compile.validation_level, ValidationLevel::Strict);
        assert_eq!(config.compile.on_blocked, OnBlocked::Draft);
        assert_eq!(config.output.directory, "./register");
    }

    #[test]
    fn test_invalid_template_code_rejected() {
        let err = parse_config(
            r#"
[source]
kind = "snapshot"
snapshot_path = "records.json"

[compile]
templates = ["B_42.42"]
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RoiError::Configuration(_)));
    }
}
