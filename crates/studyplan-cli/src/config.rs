//! Configuration file management for studyplan.
//!
//! Provides a TOML config file at `~/.config/studyplan/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use studyplan_core::generation::{ChatClientConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

pub const ENV_BIND: &str = "STUDYPLAN_BIND";
pub const ENV_PORT: &str = "PORT";
pub const ENV_MODEL: &str = "STUDYPLAN_MODEL";
pub const ENV_BASE_URL: &str = "STUDYPLAN_LLM_BASE_URL";
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub llm: LlmSection,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Inline API key, used only when the env var is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 120,
            max_tokens: 4096,
            temperature: 0.7,
            api_key: None,
        }
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the studyplan config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/studyplan` or
/// `~/.config/studyplan`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("studyplan");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("studyplan")
}

/// Return the path to the studyplan config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse a config file. Returns an error if it does not exist.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write a config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Default)]
pub struct CliOverrides<'a> {
    pub bind: Option<&'a str>,
    pub port: Option<u16>,
    pub model: Option<&'a str>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct StudyPlanConfig {
    pub bind: String,
    pub port: u16,
    pub llm: ChatClientConfig,
}

impl StudyPlanConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - bind: `--bind` > `STUDYPLAN_BIND` > `server.bind` > `0.0.0.0`
    /// - port: `--port` > `PORT` > `server.port` > `5000`
    /// - model: `--model` > `STUDYPLAN_MODEL` > `llm.model` > default model
    /// - base URL: `STUDYPLAN_LLM_BASE_URL` > `llm.base_url` > default URL
    /// - API key: env var named by `llm.api_key_env` > `llm.api_key` > error
    ///
    /// `config_file` names an explicit file, which must exist. Without it the
    /// default path is used if present.
    pub fn resolve(config_file: Option<&Path>, cli: &CliOverrides<'_>) -> Result<Self> {
        let (path, file_config) = match config_file {
            Some(path) => (path.to_path_buf(), load_config(path)?),
            None => {
                let path = config_path();
                let config = if path.exists() {
                    load_config(&path)?
                } else {
                    ConfigFile::default()
                };
                (path, config)
            }
        };
        let ConfigFile { server, llm } = file_config;

        let bind = match cli.bind {
            Some(bind) => bind.to_string(),
            None => std::env::var(ENV_BIND).unwrap_or(server.bind),
        };

        let port = match cli.port {
            Some(port) => port,
            None => match std::env::var(ENV_PORT) {
                Ok(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("{ENV_PORT} env var is not a valid port: {raw:?}"))?,
                Err(_) => server.port,
            },
        };

        let model = match cli.model {
            Some(model) => model.to_string(),
            None => std::env::var(ENV_MODEL).unwrap_or(llm.model),
        };

        let base_url = std::env::var(ENV_BASE_URL).unwrap_or(llm.base_url);

        let api_key = match std::env::var(&llm.api_key_env) {
            Ok(key) if !key.trim().is_empty() => key,
            _ => match llm.api_key {
                Some(key) if !key.trim().is_empty() => key,
                _ => bail!(
                    "API key not found; set {} or add llm.api_key to {}",
                    llm.api_key_env,
                    path.display()
                ),
            },
        };

        Ok(Self {
            bind,
            port,
            llm: ChatClientConfig {
                base_url,
                model,
                api_key,
                timeout: Duration::from_secs(llm.timeout_secs),
                max_tokens: llm.max_tokens,
                temperature: llm.temperature,
            },
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        crate::test_util::lock_env()
    }

    /// Point config lookup at an empty temp dir and clear every variable
    /// the resolver reads.
    fn isolated_env() -> tempfile::TempDir {
        let tmp = tempfile::TempDir::new().unwrap();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        for var in [ENV_BIND, ENV_PORT, ENV_MODEL, ENV_BASE_URL, DEFAULT_API_KEY_ENV] {
            unsafe { std::env::remove_var(var) };
        }
        tmp
    }

    fn restore_env() {
        for var in [
            "XDG_CONFIG_HOME",
            ENV_BIND,
            ENV_PORT,
            ENV_MODEL,
            ENV_BASE_URL,
            DEFAULT_API_KEY_ENV,
        ] {
            unsafe { std::env::remove_var(var) };
        }
    }

    #[test]
    fn default_file_matches_documented_layout() {
        let text = toml::to_string_pretty(&ConfigFile::default()).unwrap();
        let value: toml::Value = toml::from_str(&text).unwrap();
        assert_eq!(value["server"]["bind"].as_str(), Some("0.0.0.0"));
        assert_eq!(value["server"]["port"].as_integer(), Some(5000));
        assert_eq!(value["llm"]["api_key_env"].as_str(), Some("GROQ_API_KEY"));
        assert_eq!(value["llm"]["timeout_secs"].as_integer(), Some(120));
        assert!(value["llm"].get("api_key").is_none());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let config: ConfigFile = toml::from_str("[server]\nport = 8080\n").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind, "0.0.0.0");
        assert_eq!(config.llm.model, DEFAULT_MODEL);
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("config.toml");

        let mut original = ConfigFile::default();
        original.server.port = 7000;
        original.llm.api_key = Some("sk-file".to_string());
        save_config(&path, &original).unwrap();

        let loaded = load_config(&path).unwrap();
        assert_eq!(loaded.server.port, 7000);
        assert_eq!(loaded.llm.api_key.as_deref(), Some("sk-file"));
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        save_config(&path, &ConfigFile::default()).unwrap();

        let meta = std::fs::metadata(&path).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn resolve_defaults_with_env_key() {
        let _lock = lock_env();
        let _tmp = isolated_env();
        unsafe { std::env::set_var(DEFAULT_API_KEY_ENV, "sk-env") };

        let config = StudyPlanConfig::resolve(None, &CliOverrides::default());
        restore_env();

        let config = config.unwrap();
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.llm.model, DEFAULT_MODEL);
        assert_eq!(config.llm.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.llm.api_key, "sk-env");
        assert_eq!(config.llm.timeout, Duration::from_secs(120));
    }

    #[test]
    fn resolve_cli_beats_env_beats_file() {
        let _lock = lock_env();
        let tmp = isolated_env();

        let mut file = ConfigFile::default();
        file.server.bind = "10.0.0.1".to_string();
        file.server.port = 7000;
        file.llm.model = "file-model".to_string();
        file.llm.api_key = Some("sk-file".to_string());
        save_config(&config_path(), &file).unwrap();

        // File only.
        let from_file = StudyPlanConfig::resolve(None, &CliOverrides::default());

        // Env over file.
        unsafe { std::env::set_var(ENV_BIND, "127.0.0.1") };
        unsafe { std::env::set_var(ENV_PORT, "6000") };
        unsafe { std::env::set_var(ENV_MODEL, "env-model") };
        unsafe { std::env::set_var(ENV_BASE_URL, "http://localhost:1234/v1") };
        let from_env = StudyPlanConfig::resolve(None, &CliOverrides::default());

        // CLI over env.
        let cli = CliOverrides {
            bind: Some("::1"),
            port: Some(9000),
            model: Some("cli-model"),
        };
        let from_cli = StudyPlanConfig::resolve(None, &cli);

        restore_env();
        drop(tmp);

        let from_file = from_file.unwrap();
        assert_eq!(from_file.bind, "10.0.0.1");
        assert_eq!(from_file.port, 7000);
        assert_eq!(from_file.llm.model, "file-model");
        assert_eq!(from_file.llm.api_key, "sk-file");

        let from_env = from_env.unwrap();
        assert_eq!(from_env.bind, "127.0.0.1");
        assert_eq!(from_env.port, 6000);
        assert_eq!(from_env.llm.model, "env-model");
        assert_eq!(from_env.llm.base_url, "http://localhost:1234/v1");

        let from_cli = from_cli.unwrap();
        assert_eq!(from_cli.bind, "::1");
        assert_eq!(from_cli.port, 9000);
        assert_eq!(from_cli.llm.model, "cli-model");
    }

    #[test]
    fn resolve_reads_key_from_custom_env_var() {
        let _lock = lock_env();
        let tmp = isolated_env();

        let mut file = ConfigFile::default();
        file.llm.api_key_env = "STUDYPLAN_TEST_CUSTOM_KEY".to_string();
        let path = tmp.path().join("custom.toml");
        save_config(&path, &file).unwrap();
        unsafe { std::env::set_var("STUDYPLAN_TEST_CUSTOM_KEY", "sk-custom") };

        let config = StudyPlanConfig::resolve(Some(&path), &CliOverrides::default());
        unsafe { std::env::remove_var("STUDYPLAN_TEST_CUSTOM_KEY") };
        restore_env();

        assert_eq!(config.unwrap().llm.api_key, "sk-custom");
    }

    #[test]
    fn resolve_errors_when_no_api_key() {
        let _lock = lock_env();
        let _tmp = isolated_env();

        let result = StudyPlanConfig::resolve(None, &CliOverrides::default());
        restore_env();

        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("API key not found"), "unexpected error: {msg}");
        assert!(msg.contains("GROQ_API_KEY"), "unexpected error: {msg}");
    }

    #[test]
    fn resolve_rejects_bad_port_env() {
        let _lock = lock_env();
        let _tmp = isolated_env();
        unsafe { std::env::set_var(DEFAULT_API_KEY_ENV, "sk-env") };
        unsafe { std::env::set_var(ENV_PORT, "not-a-port") };

        let result = StudyPlanConfig::resolve(None, &CliOverrides::default());
        restore_env();

        assert!(result.is_err(), "bad PORT should be rejected");
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let _lock = lock_env();
        let tmp = isolated_env();
        unsafe { std::env::set_var(DEFAULT_API_KEY_ENV, "sk-env") };

        let missing = tmp.path().join("missing.toml");
        let result = StudyPlanConfig::resolve(Some(&missing), &CliOverrides::default());
        restore_env();

        assert!(result.is_err());
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("studyplan/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
