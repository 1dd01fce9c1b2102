//! Configuration types for Daybook.
//!
//! This module provides the [`Config`] struct which stores user preferences
//! and the selected storage root. Configuration is persisted as TOML
//! (typically at `~/.config/daybook/config.toml` on Unix systems).
//!
//! # Key Configuration Fields
//!
//! - `root`: The journal folder the user picked, if any
//! - `theme`: Light/dark preference for front ends
//! - `autosave_delay_ms`: Debounce window for background saves
//!
//! [`ConfigStore`] is the process-wide, read-many/write-rarely holder of a
//! `Config`. It implements [`RootSettings`], the collaborator the journal
//! asks for the current root and tells when access to it is lost.
//!
//! # Example
//!
//! ```ignore
//! use daybook_core::config::{Config, ConfigStore};
//!
//! let store = ConfigStore::load_default()?;
//! let delay = store.snapshot().autosave_delay();
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DaybookError, Result};
use crate::fs::{BoxFuture, RootHandle};

/// Default autosave debounce in milliseconds.
pub const DEFAULT_AUTOSAVE_DELAY_MS: u64 = 800;

/// Front-end color scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ThemeMode {
    /// Follow the operating system
    #[default]
    System,
    /// Always light
    Light,
    /// Always dark
    Dark,
}

impl ThemeMode {
    /// All modes, in display order.
    pub const ALL: [ThemeMode; 3] = [ThemeMode::System, ThemeMode::Light, ThemeMode::Dark];

    /// Strict parse of a stored value.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "system" => Some(ThemeMode::System),
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }

    /// Lenient parse of a stored value: unknown or missing values mean `System`.
    pub fn from_storage(value: Option<&str>) -> Self {
        value.and_then(Self::parse).unwrap_or_default()
    }

    /// The value written to storage.
    pub fn as_storage(&self) -> &'static str {
        match self {
            ThemeMode::System => "system",
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

impl fmt::Display for ThemeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_storage())
    }
}

impl From<String> for ThemeMode {
    fn from(value: String) -> Self {
        Self::from_storage(Some(&value))
    }
}

impl From<ThemeMode> for String {
    fn from(value: ThemeMode) -> Self {
        value.as_storage().to_string()
    }
}

/// `Config` is a data structure that represents the parts of Daybook that the user can configure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Journal folder the user granted access to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root: Option<RootHandle>,

    /// Color scheme preference
    #[serde(default)]
    pub theme: ThemeMode,

    /// Quiet period after the last edit before a background save, in milliseconds
    #[serde(default = "default_autosave_delay_ms")]
    pub autosave_delay_ms: u64,
}

fn default_autosave_delay_ms() -> u64 {
    DEFAULT_AUTOSAVE_DELAY_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: None,
            theme: ThemeMode::default(),
            autosave_delay_ms: DEFAULT_AUTOSAVE_DELAY_MS,
        }
    }
}

impl Config {
    /// Create a new config pointing at the given root
    pub fn new(root: RootHandle) -> Self {
        Self {
            root: Some(root),
            ..Self::default()
        }
    }

    /// The autosave debounce as a duration.
    pub fn autosave_delay(&self) -> Duration {
        Duration::from_millis(self.autosave_delay_ms)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load config from a specific path, returning default if it doesn't exist.
    pub fn load_from_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

// ============================================================================
// Native-only implementation (not available in WASM)
// ============================================================================

#[cfg(not(target_arch = "wasm32"))]
impl Config {
    /// Get the config file path (~/.config/daybook/config.toml)
    /// Only available on native platforms
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("daybook").join("config.toml"))
    }

    /// Load config from default location, or return default if file doesn't exist
    /// Only available on native platforms
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => Self::load_from_or_default(&path),
            None => Ok(Config::default()),
        }
    }

    /// Save config to default location
    /// Only available on native platforms
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(DaybookError::NoConfigDir)?;
        self.save_to(&path)
    }
}

/// Where the journal's storage root is kept.
///
/// Reads happen on every load and save; writes only when the user picks a
/// folder or access to the current one is lost.
pub trait RootSettings: Send + Sync {
    /// The root currently selected, if any.
    fn current_root(&self) -> BoxFuture<'_, Option<RootHandle>>;

    /// Select a new root, or clear it with `None`.
    fn set_root(&self, root: Option<RootHandle>) -> BoxFuture<'_, Result<()>>;
}

/// Process-wide configuration, optionally backed by a TOML file.
///
/// Every mutation is written through to the file when there is one.
#[derive(Debug)]
pub struct ConfigStore {
    config: RwLock<Config>,
    path: Option<PathBuf>,
}

impl ConfigStore {
    /// A store bound to `path`, starting from its contents (or defaults).
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Config::load_from_or_default(&path)?;
        Ok(Self {
            config: RwLock::new(config),
            path: Some(path),
        })
    }

    /// A store bound to the default config location.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_default() -> Result<Self> {
        let path = Config::config_path().ok_or(DaybookError::NoConfigDir)?;
        Self::load(path)
    }

    /// A store that never touches disk.
    pub fn in_memory(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
            path: None,
        }
    }

    /// The file this store persists to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// A copy of the current configuration.
    pub fn snapshot(&self) -> Config {
        self.read().clone()
    }

    /// Current theme preference.
    pub fn theme(&self) -> ThemeMode {
        self.read().theme
    }

    /// Change the theme preference and persist it.
    pub async fn set_theme(&self, theme: ThemeMode) -> Result<()> {
        self.update(|config| config.theme = theme).await
    }

    /// Apply `change` and persist the result.
    pub async fn update(&self, change: impl FnOnce(&mut Config) + Send) -> Result<()> {
        let updated = {
            let mut config = self.write();
            change(&mut config);
            config.clone()
        };
        self.persist(&updated).await
    }

    async fn persist(&self, config: &Config) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = toml::to_string_pretty(config)?;
        tokio::fs::write(path, contents).await?;
        log::debug!("Saved config to {}", path.display());
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Config> {
        self.config.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Config> {
        self.config.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RootSettings for ConfigStore {
    fn current_root(&self) -> BoxFuture<'_, Option<RootHandle>> {
        let root = self.read().root.clone();
        Box::pin(async move { root })
    }

    fn set_root(&self, root: Option<RootHandle>) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            match &root {
                Some(root) => log::info!("Journal root set to {}", root),
                None => log::info!("Journal root cleared"),
            }
            self.update(|config| config.root = root).await
        })
    }
}
