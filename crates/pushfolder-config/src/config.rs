//! Configuration types and loading for pushfolder.
//!
//! The main entry point is [`PublishConfig`]. It is loaded with
//! [`load_config`] (defaults, then YAML file, then environment) or
//! [`load_config_file`] (no environment layer), and saved with
//! [`save_config`].

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix of environment variables read by [`load_config`].
const ENV_PREFIX: &str = "PUSHFOLDER_";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// The configuration could not be serialized to YAML.
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] serde_yaml::Error),

    /// Merging or extracting the configuration layers failed.
    #[error("failed to load config: {0}")]
    LoadError(Box<figment::Error>),

    /// A configuration value was invalid.
    #[error("invalid configuration value for key '{key}': {reason}")]
    InvalidValue {
        /// The configuration key that had an invalid value.
        key: String,
        /// A description of why the value is invalid.
        reason: String,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::LoadError(Box::new(e))
    }
}

/// A specialized `Result` type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// Git-related configuration section.
///
/// Empty strings mean "not set": git falls back to the user's own
/// configuration for that value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct GitConfig {
    /// Override commit author (e.g., `"publisher <publisher@example.com>"`).
    #[serde(default)]
    pub author: String,

    /// Committer name for the publish commit.
    #[serde(default)]
    pub user_name: String,

    /// Committer email for the publish commit.
    #[serde(default)]
    pub user_email: String,

    /// Disable GPG signing for the publish commit.
    #[serde(default)]
    pub no_gpg_sign: bool,
}

// ---------------------------------------------------------------------------
// Main config struct
// ---------------------------------------------------------------------------

/// Settings for one publish run.
///
/// All fields use `serde` defaults so that a partially-specified YAML file
/// will be deserialized correctly with sensible default values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PublishConfig {
    /// Directory the remote is cloned into; removed after the run.
    #[serde(default = "default_clone_dir")]
    pub clone_dir: PathBuf,

    /// Message of the publish commit.
    #[serde(default = "default_commit_message")]
    pub commit_message: String,

    /// Branch to publish to.
    #[serde(default = "default_branch")]
    pub branch: String,

    /// The single remote that is pushed to.
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Commit identity and signing.
    #[serde(default)]
    pub git: GitConfig,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            clone_dir: default_clone_dir(),
            commit_message: default_commit_message(),
            branch: default_branch(),
            remote: default_remote(),
            git: GitConfig::default(),
        }
    }
}

fn default_clone_dir() -> PathBuf {
    PathBuf::from("temp_repo")
}

fn default_commit_message() -> String {
    "Add new files".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_remote() -> String {
    "origin".to_string()
}

impl PublishConfig {
    /// Set the clone directory.
    pub fn with_clone_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.clone_dir = dir.into();
        self
    }

    /// Set the commit message.
    pub fn with_commit_message(mut self, message: impl Into<String>) -> Self {
        self.commit_message = message.into();
        self
    }

    /// Set the target branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set the remote name.
    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }

    /// Replace the git section.
    pub fn with_git(mut self, git: GitConfig) -> Self {
        self.git = git;
        self
    }

    /// Check that every value git will be handed is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending key.
    pub fn validate(&self) -> Result<()> {
        if self.clone_dir.as_os_str().is_empty() {
            return Err(invalid("clone-dir", "must not be empty"));
        }
        if self.commit_message.trim().is_empty() {
            return Err(invalid("commit-message", "must not be empty"));
        }
        check_ref_name("branch", &self.branch)?;
        check_ref_name("remote", &self.remote)?;
        Ok(())
    }
}

/// Reject names git would misread as options or that cannot name a ref.
fn check_ref_name(key: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(key, "must not be empty"));
    }
    if value.starts_with('-') {
        return Err(invalid(key, "must not start with '-'"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(invalid(key, "must not contain whitespace"));
    }
    Ok(())
}

fn invalid(key: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Load configuration from defaults, the YAML file at `path`, and
/// `PUSHFOLDER_*` environment variables, in increasing priority.
///
/// Nested keys are separated by a double underscore, so
/// `PUSHFOLDER_GIT__USER_EMAIL` sets `git.user-email`.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] if the file exists but cannot be read,
/// [`ConfigError::LoadError`] if a layer has the wrong shape, or
/// [`ConfigError::InvalidValue`] if the merged result fails validation.
pub fn load_config(path: &Path) -> Result<PublishConfig> {
    let env = Env::prefixed(ENV_PREFIX)
        .map(|key| key.as_str().replace("__", ".").replace('_', "-").into());
    extract(file_layers(path)?.merge(env))
}

/// Load configuration from defaults and the YAML file at `path` only.
///
/// If the file does not exist or is empty, the defaults are returned.
///
/// # Errors
///
/// Same as [`load_config`].
pub fn load_config_file(path: &Path) -> Result<PublishConfig> {
    extract(file_layers(path)?)
}

/// Save configuration as YAML to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`ConfigError::ReadError`] on I/O failure or
/// [`ConfigError::SerializeError`] if serialization fails.
pub fn save_config(path: &Path, config: &PublishConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let yaml = serde_yaml::to_string(config)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

fn file_layers(path: &Path) -> Result<Figment> {
    let figment = Figment::from(Serialized::defaults(PublishConfig::default()));

    if !path.exists() {
        return Ok(figment);
    }

    let content = std::fs::read_to_string(path)?;

    // An empty file is valid and yields the defaults.
    if content.trim().is_empty() {
        return Ok(figment);
    }

    Ok(figment.merge(Yaml::string(&content)))
}

fn extract(figment: Figment) -> Result<PublishConfig> {
    let config: PublishConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
