//! TOML-based application configuration.
//!
//! Stores:
//! - Calendar gating (demo day, debug override)
//! - Notification schedule and presentation
//! - Generator endpoint and model choices
//! - Offline shell cache name and entries
//!
//! Configuration is stored at `~/.config/xmas-whisper/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::clock::DEMO_DAY;
use crate::error::ConfigError;

/// Calendar gating configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// Unlocked day outside December.
    #[serde(default = "default_demo_day")]
    pub demo_day: i64,
    /// Manual override of the unlocked day; any integer is accepted.
    #[serde(default)]
    pub debug_day: Option<i64>,
}

/// Notification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_hour")]
    pub hour: u32,
    #[serde(default = "default_minute")]
    pub minute: u32,
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_icon")]
    pub icon: String,
}

/// Postcard generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_aspect_ratio")]
    pub aspect_ratio: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Offline shell configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineConfig {
    /// Versioned cache name; bumping it invalidates older shells on activate.
    #[serde(default = "default_cache_name")]
    pub cache_name: String,
    /// Origin the shell entries are resolved against.
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default = "default_shell")]
    pub shell: Vec<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/xmas-whisper/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub offline: OfflineConfig,
}

fn default_demo_day() -> i64 {
    DEMO_DAY
}
fn default_true() -> bool {
    true
}
fn default_hour() -> u32 {
    7
}
fn default_minute() -> u32 {
    30
}
fn default_check_interval() -> u64 {
    60
}
fn default_title() -> String {
    "Xmas Whisper Calendar".into()
}
fn default_icon() -> String {
    "https://cdn-icons-png.flaticon.com/512/3697/3697263.png".into()
}
fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".into()
}
fn default_text_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_image_model() -> String {
    "gemini-2.5-flash-image".into()
}
fn default_temperature() -> f64 {
    0.8
}
fn default_aspect_ratio() -> String {
    "3:4".into()
}
fn default_timeout() -> u64 {
    60
}
fn default_cache_name() -> String {
    "xmas-whisper-v2".into()
}
fn default_origin() -> String {
    "http://localhost:3000/".into()
}
fn default_shell() -> Vec<String> {
    vec!["./".into(), "./index.html".into(), "./manifest.json".into()]
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            demo_day: default_demo_day(),
            debug_day: None,
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hour: default_hour(),
            minute: default_minute(),
            check_interval_secs: default_check_interval(),
            title: default_title(),
            icon: default_icon(),
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            text_model: default_text_model(),
            image_model: default_image_model(),
            temperature: default_temperature(),
            aspect_ratio: default_aspect_ratio(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            cache_name: default_cache_name(),
            origin: default_origin(),
            shell: default_shell(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        let dir = data_dir().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        Ok(dir.join("config.toml"))
    }

    /// Load from the data directory, writing defaults on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults if the file is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Self = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.validate()?;
                Ok(cfg)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(e) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
        }
    }

    /// Persist to the data directory.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    /// Persist to an explicit path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_err = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_err(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_err(e.to_string()))
    }

    /// Get a config value as string by dot-separated key
    /// (e.g. `notifications.hour`).
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        match current {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a config value in memory by dot-separated key.
    ///
    /// The new value is parsed according to the type of the existing one.
    /// `calendar.debug_day` additionally accepts `none` to clear the override.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value does not parse.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        let (section, field) = key
            .split_once('.')
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let obj = json
            .get_mut(section)
            .and_then(|s| s.as_object_mut())
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let existing = obj
            .get(field)
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

        let new_value = match existing {
            serde_json::Value::Bool(_) => serde_json::Value::Bool(
                value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
            ),
            serde_json::Value::Number(_) => parse_number(value).map_err(invalid)?,
            serde_json::Value::Array(_) => {
                serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
            }
            // Only optional numeric fields serialize as null.
            serde_json::Value::Null => {
                if value.eq_ignore_ascii_case("none") {
                    serde_json::Value::Null
                } else {
                    parse_number(value).map_err(invalid)?
                }
            }
            _ => serde_json::Value::String(value.into()),
        };
        obj.insert(field.to_string(), new_value);

        let updated: Self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// Range checks serde cannot express: the delivery time must be a valid
    /// clock time and the check interval non-zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |key: &str, message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let n = &self.notifications;
        if n.hour > 23 {
            return Err(invalid("notifications.hour", format!("{} is not an hour (0-23)", n.hour)));
        }
        if n.minute > 59 {
            return Err(invalid("notifications.minute", format!("{} is not a minute (0-59)", n.minute)));
        }
        if n.check_interval_secs == 0 {
            return Err(invalid(
                "notifications.check_interval_secs",
                "must be at least 1 second".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_number(value: &str) -> Result<serde_json::Value, String> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(serde_json::Value::Null);
    }
    if let Ok(n) = value.parse::<i64>() {
        return Ok(serde_json::Value::Number(n.into()));
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .ok_or_else(|| format!("cannot parse '{value}' as number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_morning_schedule() {
        let cfg = Config::default();
        assert_eq!(cfg.notifications.hour, 7);
        assert_eq!(cfg.notifications.minute, 30);
        assert_eq!(cfg.notifications.check_interval_secs, 60);
        assert_eq!(cfg.calendar.demo_day, 5);
        assert_eq!(cfg.offline.cache_name, "xmas-whisper-v2");
        assert_eq!(cfg.offline.shell.len(), 3);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let cfg: Config = toml::from_str("[notifications]\nhour = 8\n").unwrap();
        assert_eq!(cfg.notifications.hour, 8);
        assert_eq!(cfg.notifications.minute, 30);
        assert_eq!(cfg.generator.text_model, "gemini-2.5-flash");
    }

    #[test]
    fn get_and_set_by_dotted_key() {
        let mut cfg = Config::default();
        assert_eq!(cfg.get("notifications.hour").as_deref(), Some("7"));
        assert_eq!(cfg.get("calendar.debug_day").as_deref(), Some("null"));

        cfg.set("notifications.hour", "6").unwrap();
        cfg.set("calendar.debug_day", "12").unwrap();
        cfg.set("generator.temperature", "0.5").unwrap();
        cfg.set("offline.cache_name", "xmas-whisper-v3").unwrap();
        assert_eq!(cfg.notifications.hour, 6);
        assert_eq!(cfg.calendar.debug_day, Some(12));
        assert_eq!(cfg.generator.temperature, 0.5);
        assert_eq!(cfg.offline.cache_name, "xmas-whisper-v3");

        cfg.set("calendar.debug_day", "none").unwrap();
        assert_eq!(cfg.calendar.debug_day, None);
    }

    #[test]
    fn set_rejects_unknown_keys_and_bad_values() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("notifications.volume", "3"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(cfg.set("theme", "dark"), Err(ConfigError::UnknownKey(_))));
        assert!(matches!(
            cfg.set("notifications.enabled", "maybe"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn set_rejects_out_of_range_schedule() {
        let mut cfg = Config::default();
        for (key, value) in [
            ("notifications.hour", "24"),
            ("notifications.hour", "31"),
            ("notifications.minute", "60"),
            ("notifications.minute", "90"),
            ("notifications.check_interval_secs", "0"),
        ] {
            assert!(
                matches!(cfg.set(key, value), Err(ConfigError::InvalidValue { .. })),
                "{key}={value} should be rejected"
            );
        }
        assert_eq!(cfg.notifications.hour, 7);
        assert_eq!(cfg.notifications.minute, 30);
        assert_eq!(cfg.notifications.check_interval_secs, 60);

        cfg.set("notifications.hour", "23").unwrap();
        cfg.set("notifications.minute", "59").unwrap();
        cfg.set("notifications.check_interval_secs", "1").unwrap();
    }

    #[test]
    fn load_rejects_out_of_range_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        for body in [
            "[notifications]\nhour = 31\n",
            "[notifications]\nminute = 75\n",
            "[notifications]\ncheck_interval_secs = 0\n",
        ] {
            std::fs::write(&path, body).unwrap();
            assert!(
                matches!(Config::load_from(&path), Err(ConfigError::InvalidValue { .. })),
                "{body:?} should be rejected"
            );
        }
    }

    #[test]
    fn load_writes_defaults_then_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(cfg.notifications.hour, 7);

        let mut cfg = cfg;
        cfg.set("notifications.minute", "45").unwrap();
        cfg.save_to(&path).unwrap();
        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.notifications.minute, 45);
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "notifications = [").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
