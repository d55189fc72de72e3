//! Configuration file management for planwise.
//!
//! Provides a TOML-based config file at `~/.config/planwise/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use planwise_db::config::DbConfig;

pub const DEFAULT_BIND: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub server: ServerSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Single origin allowed by CORS. Unset means any origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_origin: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            allowed_origin: None,
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the planwise config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/planwise` or
/// `~/.config/planwise`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("planwise");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("planwise")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file at `path`.
pub fn load_config_from(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(config)
}

/// Serialize and write `config` to `path`, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
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

/// Values given on the command line. Each one beats every other source.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides<'a> {
    pub database_url: Option<&'a str>,
    pub bind: Option<&'a str>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub allowed_origin: Option<String>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct PlanwiseConfig {
    pub db_config: DbConfig,
    pub server: ServerConfig,
}

impl PlanwiseConfig {
    /// Resolve against the config file at [`config_path`], if there is one.
    pub fn resolve(cli: &CliOverrides<'_>) -> Result<Self> {
        let path = config_path();
        let file = if path.exists() {
            Some(load_config_from(&path)?)
        } else {
            None
        };
        Self::resolve_with(cli, file.as_ref())
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `--database-url` > `PLANWISE_DATABASE_URL` > `database.url`
    /// - bind: `--bind` > `PLANWISE_BIND` > `server.bind`
    /// - port: `--port` > `PLANWISE_PORT` > `server.port`
    /// - CORS origin: `PLANWISE_ALLOWED_ORIGIN` > `server.allowed_origin`
    pub fn resolve_with(cli: &CliOverrides<'_>, file: Option<&ConfigFile>) -> Result<Self> {
        let file_server = file.map(|f| f.server.clone()).unwrap_or_default();

        let db_url = match (cli.database_url, std::env::var("PLANWISE_DATABASE_URL")) {
            (Some(url), _) => url.to_string(),
            (None, Ok(url)) => url,
            (None, Err(_)) => file
                .map(|f| f.database.url.clone())
                .unwrap_or_else(|| DbConfig::DEFAULT_URL.to_string()),
        };
        let db_config = DbConfig {
            database_url: db_url,
            // Pool size only comes from the environment.
            max_connections: DbConfig::from_env().max_connections,
        };

        let bind = match (cli.bind, std::env::var("PLANWISE_BIND")) {
            (Some(bind), _) => bind.to_string(),
            (None, Ok(bind)) => bind,
            (None, Err(_)) => file_server.bind,
        };

        let port = match (cli.port, std::env::var("PLANWISE_PORT")) {
            (Some(port), _) => port,
            (None, Ok(raw)) => raw
                .parse()
                .with_context(|| format!("PLANWISE_PORT is not a valid port: {raw:?}"))?,
            (None, Err(_)) => file_server.port,
        };

        let allowed_origin = std::env::var("PLANWISE_ALLOWED_ORIGIN")
            .ok()
            .or(file_server.allowed_origin);

        Ok(Self {
            db_config,
            server: ServerConfig {
                bind,
                port,
                allowed_origin,
            },
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
