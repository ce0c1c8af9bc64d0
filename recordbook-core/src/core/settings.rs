//! User preferences persistence for Recordbook.
//!
//! Stores notification, appearance and workload preferences in a JSON file
//! at an OS-appropriate location.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::{RecordbookError, Result, WorkloadConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Ru,
    En,
}

/// Persisted user settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    /// Minutes between repeated reminders for the same record.
    pub notification_frequency: u32,
    /// How many days ahead of a record its reminder becomes due.
    pub notification_lead_time: u32,
    pub enable_repeating_notifications: bool,
    pub theme: Theme,
    pub language: Language,
    pub notification_sound: String,
    pub workload: WorkloadConfig,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notification_frequency: 60,
            notification_lead_time: 5,
            enable_repeating_notifications: true,
            theme: Theme::default(),
            language: Language::default(),
            notification_sound: "default".to_string(),
            workload: WorkloadConfig::default(),
        }
    }
}

impl UserSettings {
    /// Checks every numeric preference against its allowed range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=1440).contains(&self.notification_frequency) {
            return Err(RecordbookError::Validation(format!(
                "notificationFrequency must be between 1 and 1440 minutes, got {}",
                self.notification_frequency
            )));
        }
        if self.notification_lead_time > 365 {
            return Err(RecordbookError::Validation(format!(
                "notificationLeadTime must be between 0 and 365 days, got {}",
                self.notification_lead_time
            )));
        }
        self.workload.validate()
    }
}

/// Returns the path to the settings JSON file.
///
/// - macOS / Linux: `~/.config/recordbook/settings.json`
/// - Windows: `%APPDATA%/Recordbook/settings.json`
pub fn settings_file_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join("Recordbook").join("settings.json")
    }
    #[cfg(not(target_os = "windows"))]
    {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config").join("recordbook").join("settings.json")
    }
}

/// Loads settings from `path`; returns defaults if the file is missing or corrupt.
pub fn load_settings(path: &Path) -> UserSettings {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                log::warn!("cannot read settings {}: {e}", path.display());
            }
            return UserSettings::default();
        }
    };
    match serde_json::from_str::<UserSettings>(&content) {
        Ok(settings) => match settings.validate() {
            Ok(()) => settings,
            Err(e) => {
                log::warn!("ignoring out-of-range settings in {}: {e}", path.display());
                UserSettings::default()
            }
        },
        Err(e) => {
            log::warn!("corrupt settings file {}: {e}", path.display());
            UserSettings::default()
        }
    }
}

/// Validates and saves settings to `path`, creating parent directories as needed.
pub fn save_settings(path: &Path, settings: &UserSettings) -> Result<()> {
    settings.validate()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    log::info!("saved settings to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let settings = UserSettings::default();
        assert_eq!(settings.notification_frequency, 60);
        assert_eq!(settings.notification_lead_time, 5);
        assert!(settings.enable_repeating_notifications);
        assert_eq!(settings.theme, Theme::Light);
        assert_eq!(settings.language, Language::Ru);
        assert_eq!(settings.workload.max_sessions_per_day, 8);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_camel_case_json_with_missing_fields() {
        let settings: UserSettings =
            serde_json::from_str(r#"{"notificationLeadTime": 2, "theme": "dark"}"#).unwrap();
        assert_eq!(settings.notification_lead_time, 2);
        assert_eq!(settings.theme, Theme::Dark);
        assert_eq!(settings.notification_frequency, 60);

        let json = serde_json::to_string(&settings).unwrap();
        assert!(json.contains("\"enableRepeatingNotifications\":true"));
        assert!(json.contains("\"workingHoursStart\":9"));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let mut settings = UserSettings::default();
        settings.notification_frequency = 0;
        assert!(settings.validate().is_err());

        let mut settings = UserSettings::default();
        settings.notification_lead_time = 366;
        assert!(settings.validate().is_err());

        let mut settings = UserSettings::default();
        settings.workload.working_hours_end = 8;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = UserSettings::default();
        settings.language = Language::En;
        settings.notification_frequency = 15;

        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path), settings);
    }

    #[test]
    fn test_save_rejects_invalid() {
        let temp = NamedTempFile::new().unwrap();
        let mut settings = UserSettings::default();
        settings.notification_lead_time = 1000;
        assert!(matches!(
            save_settings(temp.path(), &settings),
            Err(RecordbookError::Validation(_))
        ));
    }

    #[test]
    fn test_load_missing_or_corrupt_returns_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_settings(&dir.path().join("absent.json")), UserSettings::default());

        let temp = NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "{ not json").unwrap();
        assert_eq!(load_settings(temp.path()), UserSettings::default());
    }

    #[test]
    fn test_settings_path_ends_with_file_name() {
        assert!(settings_file_path().ends_with("settings.json"));
    }
}
