use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Which storage backend holds the content calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process table, lost when the program exits
    Memory,
    /// Local SQLite database
    Sqlite,
    /// Remote spreadsheet
    Sheet,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::Sqlite => "sqlite",
            BackendKind::Sheet => "sheet",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_backend")]
    pub backend: BackendKind,
    /// Empty in the file means the active profile's data directory
    #[serde(default)]
    pub database_path: String,
    #[serde(default)]
    pub export_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub sheet: SheetConfig,
    #[serde(default)]
    pub key_bindings: KeyBindings,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    #[serde(default = "default_spreadsheet_name")]
    pub spreadsheet_name: String,
    /// When set, the name lookup through Drive is skipped
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default)]
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyBindings {
    #[serde(default = "default_quit")]
    pub quit: String,
    #[serde(default = "default_new")]
    pub new: String,
    #[serde(default = "default_edit")]
    pub edit: String,
    #[serde(default = "default_delete")]
    pub delete: String,
    #[serde(default = "default_save")]
    pub save: String,
    #[serde(default = "default_help")]
    pub help: String,
    #[serde(default = "default_export_xlsx")]
    pub export_xlsx: String,
    #[serde(default = "default_export_csv")]
    pub export_csv: String,
    #[serde(default = "default_list_up")]
    pub list_up: String,
    #[serde(default = "default_list_down")]
    pub list_down: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    #[serde(default = "default_fg")]
    pub fg: String,
    #[serde(default = "default_bg")]
    pub bg: String,
    #[serde(default = "default_highlight_bg")]
    pub highlight_bg: String,
    /// Left empty, a contrasting color is derived from highlight_bg
    #[serde(default)]
    pub highlight_fg: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            database_path: default_database_path(),
            export_dir: default_export_dir(),
            log_level: default_log_level(),
            sheet: SheetConfig::default(),
            key_bindings: KeyBindings::default(),
            theme: Theme::default(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_name: default_spreadsheet_name(),
            spreadsheet_id: String::new(),
            token_env: default_token_env(),
            access_token: String::new(),
        }
    }
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            quit: default_quit(),
            new: default_new(),
            edit: default_edit(),
            delete: default_delete(),
            save: default_save(),
            help: default_help(),
            export_xlsx: default_export_xlsx(),
            export_csv: default_export_csv(),
            list_up: default_list_up(),
            list_down: default_list_down(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: default_fg(),
            bg: default_bg(),
            highlight_bg: default_highlight_bg(),
            highlight_fg: String::new(),
        }
    }
}

// Default value functions
fn default_backend() -> BackendKind {
    BackendKind::Sqlite
}

fn default_database_path() -> String {
    data_file_for_profile(utils::Profile::Prod, "contentplanner.db")
}

fn default_export_dir() -> String {
    data_file_for_profile(utils::Profile::Prod, "exports")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_spreadsheet_name() -> String {
    "Contentplanner".to_string()
}

fn default_token_env() -> String {
    "CONTENTPLANNER_SHEETS_TOKEN".to_string()
}

fn default_quit() -> String {
    "q".to_string()
}

fn default_new() -> String {
    "n".to_string()
}

fn default_edit() -> String {
    "e".to_string()
}

fn default_delete() -> String {
    "d".to_string()
}

fn default_save() -> String {
    "Ctrl+s".to_string()
}

fn default_help() -> String {
    "F1".to_string()
}

fn default_export_xlsx() -> String {
    "x".to_string()
}

fn default_export_csv() -> String {
    "c".to_string()
}

fn default_list_up() -> String {
    "k".to_string()
}

fn default_list_down() -> String {
    "j".to_string()
}

fn default_fg() -> String {
    "white".to_string()
}

fn default_bg() -> String {
    "black".to_string()
}

fn default_highlight_bg() -> String {
    "blue".to_string()
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

/// Path of a file in the profile's data directory, with a home-relative fallback
fn data_file_for_profile(profile: utils::Profile, file_name: &str) -> String {
    if let Some(data_dir) = utils::get_data_dir(profile) {
        data_dir.join(file_name).to_string_lossy().to_string()
    } else {
        match profile {
            utils::Profile::Dev => format!("~/.local/share/contentplanner-dev/{}", file_name),
            utils::Profile::Prod => format!("~/.local/share/contentplanner/{}", file_name),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
    #[error("Invalid key binding '{name}': {reason}")]
    KeyBindingError { name: &'static str, reason: String },
}

impl Config {
    /// Load configuration from the profile's config file, creating it with
    /// defaults if missing. Data paths follow the profile.
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;
        Self::load_from_path(&config_path, profile)
    }

    /// Load configuration from an explicit file path, writing defaults there if missing
    pub fn load_from_path(config_path: &Path, profile: utils::Profile) -> Result<Self, ConfigError> {
        if config_path.exists() {
            let contents = fs::read_to_string(config_path)
                .map_err(|e| ConfigError::ReadError(e.to_string()))?;
            let mut config: Config = toml::from_str(&contents)?;
            config.validate_key_bindings()?;
            config.fill_profile_paths(profile);
            Ok(config)
        } else {
            let mut config = Config::default();
            config.database_path = data_file_for_profile(profile, "contentplanner.db");
            config.export_dir = data_file_for_profile(profile, "exports");
            config.save_to_path(config_path)?;
            tracing::info!(path = %config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    /// Paths left out of the file point into the profile's own data directory
    fn fill_profile_paths(&mut self, profile: utils::Profile) {
        if self.database_path.trim().is_empty() {
            self.database_path = data_file_for_profile(profile, "contentplanner.db");
        }
        if self.export_dir.trim().is_empty() {
            self.export_dir = data_file_for_profile(profile, "exports");
        }
    }

    /// Save configuration to the given file
    pub fn save_to_path(&mut self, config_path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(config_path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    /// Get the expanded export directory
    pub fn get_export_dir(&self) -> PathBuf {
        utils::expand_path(&self.export_dir)
    }

    /// Log file lives next to the database
    pub fn get_log_path(&self) -> PathBuf {
        let db_path = self.get_database_path();
        db_path
            .parent()
            .map(|p| p.join("contentplanner.log"))
            .unwrap_or_else(|| PathBuf::from("contentplanner.log"))
    }

    /// Resolve the bearer token for the remote sheet: the configured env var
    /// wins over the value stored in the config file. Empty means unset.
    pub fn resolve_sheet_token(&self) -> Option<String> {
        let from_env = std::env::var(&self.sheet.token_env)
            .ok()
            .filter(|t| !t.trim().is_empty());
        let token = from_env.or_else(|| {
            Some(self.sheet.access_token.clone()).filter(|t| !t.trim().is_empty())
        })?;
        Some(utils::unescape_newlines(token.trim()))
    }

    /// Reject key bindings that cannot be parsed, so the TUI never starts half-bound
    fn validate_key_bindings(&self) -> Result<(), ConfigError> {
        let kb = &self.key_bindings;
        let all: [(&'static str, &str); 10] = [
            ("quit", &kb.quit),
            ("new", &kb.new),
            ("edit", &kb.edit),
            ("delete", &kb.delete),
            ("save", &kb.save),
            ("help", &kb.help),
            ("export_xlsx", &kb.export_xlsx),
            ("export_csv", &kb.export_csv),
            ("list_up", &kb.list_up),
            ("list_down", &kb.list_down),
        ];
        for (name, binding) in all {
            utils::parse_key_binding(binding)
                .map_err(|reason| ConfigError::KeyBindingError { name, reason })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_config_is_written_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from_path(&path, utils::Profile::Dev).unwrap();
        assert!(path.exists());
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.sheet.spreadsheet_name, "Contentplanner");

        let reloaded = Config::load_from_path(&path, utils::Profile::Dev).unwrap();
        assert_eq!(reloaded.database_path, config.database_path);
        assert_eq!(reloaded.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "backend = \"sheet\"\n[sheet]\nspreadsheet_id = \"abc\"\n").unwrap();

        let config = Config::load_from_path(&path, utils::Profile::Prod).unwrap();
        assert_eq!(config.backend, BackendKind::Sheet);
        assert_eq!(config.sheet.spreadsheet_id, "abc");
        assert_eq!(config.sheet.token_env, "CONTENTPLANNER_SHEETS_TOKEN");
        assert_eq!(config.key_bindings.save, "Ctrl+s");
    }

    #[test]
    fn saved_changes_load_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default();
        config.backend = BackendKind::Memory;
        config.key_bindings.export_csv = "v".into();
        config.theme.highlight_bg = "#336699".into();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path, utils::Profile::Prod).unwrap();
        assert_eq!(loaded.backend, BackendKind::Memory);
        assert_eq!(loaded.key_bindings.export_csv, "v");
        assert_eq!(loaded.theme.highlight_bg, "#336699");
    }

    #[test]
    fn dev_config_without_paths_stays_out_of_prod_data() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "backend = \"sqlite\"\n").unwrap();

        let config = Config::load_from_path(&path, utils::Profile::Dev).unwrap();
        assert_eq!(
            config.database_path,
            data_file_for_profile(utils::Profile::Dev, "contentplanner.db")
        );
        assert_ne!(
            config.database_path,
            data_file_for_profile(utils::Profile::Prod, "contentplanner.db")
        );
        assert_eq!(config.export_dir, data_file_for_profile(utils::Profile::Dev, "exports"));
    }

    #[test]
    fn bad_key_binding_is_reported() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[key_bindings]\nquit = \"Hyper+q\"\n").unwrap();

        let err = Config::load_from_path(&path, utils::Profile::Prod).unwrap_err();
        assert!(matches!(err, ConfigError::KeyBindingError { name: "quit", .. }));
    }

    #[test]
    fn stored_token_is_unescaped() {
        let mut config = Config::default();
        config.sheet.token_env = "CONTENTPLANNER_TEST_TOKEN_UNSET".into();
        assert_eq!(config.resolve_sheet_token(), None);

        config.sheet.access_token = "line1\\nline2".into();
        assert_eq!(config.resolve_sheet_token().as_deref(), Some("line1\nline2"));
    }
}
