//! Configuration I/O - Loading and saving configuration
//!
//! Handles reading configuration from files and environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::storage::{PostgresConfig, StorageBackendType};
use super::types::Config;
use crate::error::{Error, Result};

/// Load configuration with layered precedence:
/// 1. Config file (config.json / config.toml) if it exists, otherwise defaults
/// 2. Environment variable overrides (includes .env)
pub fn load_config() -> Result<Config> {
    let config_path = super::paths::config_path();

    let mut config = if config_path.exists() {
        load_config_from_path(&config_path)?
    } else {
        Config::default()
    };

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Load configuration from a specific path
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    parse_config(&content, path)
}

fn parse_config(content: &str, path: &Path) -> Result<Config> {
    let config: Config = if path.extension().map_or(false, |ext| ext == "json") {
        // JSON5 is a superset of JSON and tolerates comments
        json5::from_str(content).map_err(|e| Error::Config(format!("Invalid JSON config: {}", e)))?
    } else if path.extension().map_or(false, |ext| ext == "toml") {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))?
    } else {
        json5::from_str(content)
            .or_else(|_| toml::from_str(content).map_err(|e| Error::Config(e.to_string())))
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?
    };

    Ok(config)
}

/// Apply environment variable overrides to an existing config.
///
/// Env vars have the highest precedence: defaults < file < env.
pub fn apply_env_overrides(config: &mut Config) {
    dotenvy::dotenv().ok();

    // Database overrides
    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        let pg = config
            .storage
            .postgres
            .get_or_insert_with(|| PostgresConfig::new(String::new()));
        pg.url = secrecy::SecretString::from(database_url);
        config.storage.backend = StorageBackendType::Postgres;
    }
    if let Ok(max_conn) = std::env::var("DATABASE_MAX_CONNECTIONS") {
        if let Some(ref mut pg) = config.storage.postgres {
            if let Ok(v) = max_conn.parse() {
                pg.max_connections = v;
            }
        }
    }
    if let Ok(timeout) = std::env::var("DATABASE_TIMEOUT") {
        if let Some(ref mut pg) = config.storage.postgres {
            if let Ok(v) = timeout.parse() {
                pg.connect_timeout_secs = v;
            }
        }
    }

    // Sandbox overrides
    if let Ok(program) = std::env::var("MOVE_TOOLCHAIN") {
        config.sandbox.toolchain.program = program;
    }
    if let Ok(root) = std::env::var("MOVE_WORKSPACE_ROOT") {
        config.sandbox.workspace_root = Some(PathBuf::from(root));
    }
    if let Ok(timeout) = std::env::var("MOVE_COMMAND_TIMEOUT_SECS") {
        if let Ok(secs) = timeout.parse() {
            config.sandbox.toolchain.command_timeout = Duration::from_secs(secs);
        }
    }

    // Logging overrides
    if let Ok(level) = std::env::var("RUST_LOG") {
        config.log.level = level;
    }
    if let Ok(format) = std::env::var("LOG_FORMAT") {
        if let Ok(format) = format.parse() {
            config.log.format = format;
        }
    }
}

/// Save configuration to a file
pub fn save_config(config: &Config, path: &Path) -> Result<()> {
    let content = if path.extension().map_or(false, |ext| ext == "toml") {
        toml::to_string_pretty(config).map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    } else {
        serde_json::to_string_pretty(config).map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.sandbox.toolchain.program = "/usr/local/bin/aptos".to_string();
        config.sandbox.toolchain.command_timeout = Duration::from_secs(45);

        save_config(&config, &path).unwrap();
        let loaded = load_config_from_path(&path).unwrap();

        assert_eq!(loaded.sandbox.toolchain.program, "/usr/local/bin/aptos");
        assert_eq!(loaded.sandbox.toolchain.command_timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_load_toml_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[sandbox]
workspace_prefix = "lesson-"

[sandbox.toolchain]
program = "movec"
test_args = ["test", "--quiet"]
probe_timeout = "2s"

[log]
format = "json"
"#,
        )
        .unwrap();

        let config = load_config_from_path(&path).unwrap();
        assert_eq!(config.sandbox.workspace_prefix, "lesson-");
        assert_eq!(config.sandbox.toolchain.program, "movec");
        assert_eq!(config.sandbox.toolchain.test_args, vec!["test", "--quiet"]);
        assert_eq!(config.sandbox.toolchain.probe_timeout, Duration::from_secs(2));
        assert_eq!(config.log.format, super::super::types::LogFormat::Json);
    }

    #[test]
    fn test_json5_comments_allowed() {
        let config = parse_config(
            "{ // trailing comments are fine\n sandbox: { toolchain: { program: 'aptos-dev' } } }",
            Path::new("config.json"),
        )
        .unwrap();
        assert_eq!(config.sandbox.toolchain.program, "aptos-dev");
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let err = parse_config("{ not valid", Path::new("config.json")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
