//! User settings persisted as TOML.
//!
//! Settings live in `settings.toml` inside the platform configuration
//! folder (for example `~/.config/endoreport/` on Linux).
//!
//! A missing or unreadable file is never fatal; defaults are used instead.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use endo_model::ProcedureType;
use serde::{Deserialize, Serialize};

const APP_QUALIFIER: &str = "org";
const APP_ORG: &str = "endo-report";
const APP_NAME: &str = "Endo Report";
const CONFIG_FILENAME: &str = "settings.toml";

/// Environment variable overriding the configured menu CSV.
pub const MENU_CSV_ENV: &str = "ENDO_MENU_CSV";

// ============================================================================
// Settings Types
// ============================================================================

/// Application settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub menu: MenuSettings,
}

/// Defaults applied when a command does not say otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    pub procedure: ProcedureType,
    pub study_type: StudyType,
}

/// Where the menu configuration comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuSettings {
    /// Menu CSV used when no `--menu` is given.
    pub csv_path: Option<PathBuf>,
}

/// Kind of study a report belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyType {
    /// Reviewing recorded procedure videos.
    #[default]
    Retrospective,
    /// Reporting during the procedure.
    Prospective,
}

impl Settings {
    /// Resolves the menu CSV: explicit path, then `env_override`, then the
    /// configured path.
    pub fn menu_csv(&self, explicit: Option<&Path>, env_override: Option<OsString>) -> Option<PathBuf> {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| env_override.filter(|v| !v.is_empty()).map(PathBuf::from))
            .or_else(|| self.menu.csv_path.clone())
    }
}

// ============================================================================
// Persistence
// ============================================================================

/// Default settings file location.
///
/// Returns `None` if the platform directory cannot be determined.
pub fn settings_path() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
}

/// Loads settings from `path`, or from [`settings_path`] when `None`.
///
/// Falls back to defaults when the file is missing or cannot be parsed.
pub fn load_settings(path: Option<&Path>) -> Settings {
    let Some(path) = path.map(Path::to_path_buf).or_else(settings_path) else {
        tracing::warn!("could not determine settings path, using defaults");
        return Settings::default();
    };

    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(settings) => {
                tracing::info!(path = %path.display(), "loaded settings");
                settings
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "failed to parse settings, using defaults");
                Settings::default()
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            Settings::default()
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "failed to read settings, using defaults");
            Settings::default()
        }
    }
}

/// Writes `settings` to `path`, creating parent directories.
pub fn save_settings(settings: &Settings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create config directory {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(settings).context("serialize settings")?;
    fs::write(path, content).with_context(|| format!("write settings {}", path.display()))?;
    tracing::info!(path = %path.display(), "saved settings");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let settings = Settings {
            general: GeneralSettings {
                procedure: ProcedureType::Colonoscopy,
                study_type: StudyType::Prospective,
            },
            menu: MenuSettings {
                csv_path: Some(PathBuf::from("/data/menu.csv")),
            },
        };
        let text = toml::to_string_pretty(&settings).unwrap();
        let parsed: Settings = toml::from_str(&text).unwrap();
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let parsed: Settings = toml::from_str("[general]\nprocedure = \"colonoscopy\"\n").unwrap();
        assert_eq!(parsed.general.procedure, ProcedureType::Colonoscopy);
        assert_eq!(parsed.general.study_type, StudyType::Retrospective);
        assert_eq!(parsed.menu.csv_path, None);
    }

    #[test]
    fn test_load_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert_eq!(load_settings(Some(&missing)), Settings::default());

        let invalid = dir.path().join("bad.toml");
        fs::write(&invalid, "general = [").unwrap();
        assert_eq!(load_settings(Some(&invalid)), Settings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILENAME);
        let mut settings = Settings::default();
        settings.menu.csv_path = Some(PathBuf::from("menu.csv"));
        save_settings(&settings, &path).unwrap();
        assert_eq!(load_settings(Some(&path)), settings);
    }

    #[test]
    fn test_menu_csv_precedence() {
        let mut settings = Settings::default();
        settings.menu.csv_path = Some(PathBuf::from("configured.csv"));

        let explicit = settings.menu_csv(Some(Path::new("arg.csv")), Some("env.csv".into()));
        assert_eq!(explicit, Some(PathBuf::from("arg.csv")));

        let env = settings.menu_csv(None, Some("env.csv".into()));
        assert_eq!(env, Some(PathBuf::from("env.csv")));

        let empty_env = settings.menu_csv(None, Some(OsString::new()));
        assert_eq!(empty_env, Some(PathBuf::from("configured.csv")));

        assert_eq!(Settings::default().menu_csv(None, None), None);
    }
}
