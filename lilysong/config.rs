use crate::error::App;
use serde::Deserialize;
use std::path::Path;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub check_updates: bool,
    pub notifications: bool,
    pub media_keys: bool,
    pub volume_ducking: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            check_updates: default_true(),
            notifications: default_true(),
            media_keys: default_true(),
            volume_ducking: default_true(),
        }
    }
}

impl Config {
    /// Loads the config file, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, App> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything() {
        let config = Config::default();
        assert!(config.check_updates);
        assert!(config.notifications);
        assert!(config.media_keys);
        assert!(config.volume_ducking);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Path::new("/nonexistent/lilysong/config.toml")).unwrap();
        assert!(config.notifications);
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_keys() {
        let config: Config = toml::from_str("notifications = false").unwrap();
        assert!(!config.notifications);
        assert!(config.check_updates);
        assert!(config.volume_ducking);
    }

    #[test]
    fn full_file_parses() {
        let config: Config = toml::from_str(
            "check_updates = false\nnotifications = false\nmedia_keys = false\nvolume_ducking = false\n",
        )
        .unwrap();
        assert!(!config.check_updates);
        assert!(!config.media_keys);
    }
}
