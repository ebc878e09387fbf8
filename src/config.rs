// src/config.rs

//! Configuration file parsing
//!
//! Supports TOML configuration files with the following sections:
//! - [repository] - Mirror URL, branches, repositories and architectures
//! - [database] - Storage directory and write-lock retry policy
//! - [settings] - External tool path and timeout, index cache directory, file list fetching
//!
//! The loaded [`Config`] is immutable and passed explicitly to the sync
//! pipeline and query layer.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "/etc/apkdex/config.toml";

/// TOML configuration file structure
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Remote repository layout
    pub repository: RepositorySection,

    /// Storage settings
    #[serde(default)]
    pub database: DatabaseSection,

    /// Miscellaneous settings
    #[serde(default)]
    pub settings: SettingsSection,
}

/// `[repository]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RepositorySection {
    /// Base URL; `file://` URLs are read from the local filesystem
    pub url: String,

    /// Branches to index, each stored in its own database
    pub branches: Vec<String>,

    /// Branch used when a command does not name one
    #[serde(default)]
    pub default_branch: Option<String>,

    /// Repositories inside each branch (e.g. "main", "user")
    pub repos: Vec<String>,

    /// Architectures inside each repository
    pub arches: Vec<String>,
}

/// `[database]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseSection {
    /// Directory holding one database file per branch
    #[serde(default = "default_db_dir")]
    pub path: PathBuf,

    /// Attempts to acquire the write transaction before giving up
    #[serde(default = "default_lock_retries")]
    pub lock_retries: u32,

    /// Pause between write transaction attempts
    #[serde(default = "default_lock_retry_delay_ms")]
    pub lock_retry_delay_ms: u64,

    /// How long SQLite itself waits on a locked database per attempt
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: default_db_dir(),
            lock_retries: default_lock_retries(),
            lock_retry_delay_ms: default_lock_retry_delay_ms(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// `[settings]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingsSection {
    /// Path to the apk binary used for `adbdump`
    #[serde(default = "default_apk")]
    pub apk: PathBuf,

    /// Seconds `apk adbdump` may run before it is killed
    #[serde(default = "default_apk_timeout_secs")]
    pub apk_timeout_secs: u64,

    /// Directory for rendered plain-text indexes
    #[serde(default = "default_index_cache")]
    pub index_cache: PathBuf,

    /// Fetch each new package archive to record its file list
    #[serde(default = "default_fetch_files")]
    pub fetch_files: bool,
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            apk: default_apk(),
            apk_timeout_secs: default_apk_timeout_secs(),
            index_cache: default_index_cache(),
            fetch_files: default_fetch_files(),
        }
    }
}

fn default_db_dir() -> PathBuf {
    PathBuf::from("/var/lib/apkdex")
}

fn default_lock_retries() -> u32 {
    5
}

fn default_lock_retry_delay_ms() -> u64 {
    1000
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_apk() -> PathBuf {
    PathBuf::from("apk")
}

fn default_apk_timeout_secs() -> u64 {
    300
}

fn default_index_cache() -> PathBuf {
    PathBuf::from("/var/cache/apkdex")
}

fn default_fetch_files() -> bool {
    true
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read config file {}: {e}", path.display()))
        })?;

        let config = Self::parse(&content).map_err(|e| match e {
            Error::ConfigError(msg) => {
                Error::ConfigError(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;

        Ok(config)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| Error::ConfigError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.repository.url.trim().is_empty() {
            return Err(Error::ConfigError("repository.url must not be empty".to_string()));
        }
        if self.repository.branches.is_empty() {
            return Err(Error::ConfigError(
                "repository.branches must list at least one branch".to_string(),
            ));
        }
        if self.repository.repos.is_empty() {
            return Err(Error::ConfigError(
                "repository.repos must list at least one repository".to_string(),
            ));
        }
        if self.repository.arches.is_empty() {
            return Err(Error::ConfigError(
                "repository.arches must list at least one architecture".to_string(),
            ));
        }
        if let Some(default) = &self.repository.default_branch {
            if !self.repository.branches.contains(default) {
                return Err(Error::ConfigError(format!(
                    "repository.default-branch '{default}' is not in repository.branches"
                )));
            }
        }
        if self.settings.apk_timeout_secs == 0 {
            return Err(Error::ConfigError(
                "settings.apk-timeout-secs must be at least 1".to_string(),
            ));
        }
        if self.database.lock_retries == 0 {
            return Err(Error::ConfigError(
                "database.lock-retries must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Branch used when none is given explicitly
    pub fn default_branch(&self) -> &str {
        self.repository
            .default_branch
            .as_deref()
            .or_else(|| self.repository.branches.first().map(String::as_str))
            .unwrap_or("current")
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.repository.url.trim_end_matches('/')
    }

    /// URL of the package index for one repository/architecture pair
    pub fn index_url(&self, branch: &str, repo: &str, arch: &str) -> String {
        format!("{}/{branch}/{repo}/{arch}/APKINDEX.tar.gz", self.base_url())
    }

    /// URL of a single package archive
    pub fn archive_url(
        &self,
        branch: &str,
        repo: &str,
        arch: &str,
        name: &str,
        version: &str,
    ) -> String {
        format!("{}/{branch}/{repo}/{arch}/{name}-{version}.apk", self.base_url())
    }

    /// Delay between write transaction attempts
    pub fn lock_retry_delay(&self) -> Duration {
        Duration::from_millis(self.database.lock_retry_delay_ms)
    }

    /// SQLite busy timeout applied to every connection
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.database.busy_timeout_ms)
    }

    /// Time limit for one `apk adbdump` run
    pub fn apk_timeout(&self) -> Duration {
        Duration::from_secs(self.settings.apk_timeout_secs)
    }

    /// Database file of one branch
    pub fn branch_db_path(&self, branch: &str) -> PathBuf {
        crate::db::paths::branch_db_path(&self.database.path, branch)
    }

    /// Rendered index file of one repository/architecture pair
    pub fn index_cache_path(&self, branch: &str, repo: &str, arch: &str) -> PathBuf {
        crate::db::paths::index_cache_path(&self.settings.index_cache, branch, repo, arch)
    }
}
