use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::Result;

/// Login state kept between runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSettings {
    pub is_logged_in: bool,
    pub user_id: Option<String>,
}

impl LocalSettings {
    /// Read settings, falling back to logged-out defaults when the file is absent
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, starting logged out");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn login(&mut self, user_id: impl Into<String>) {
        self.is_logged_in = true;
        self.user_id = Some(user_id.into());
    }

    /// Clears the flag only; the last user id stays on disk
    pub fn logout(&mut self) {
        self.is_logged_in = false;
    }

    /// User id while logged in
    pub fn active_user(&self) -> Option<&str> {
        if self.is_logged_in {
            self.user_id.as_deref()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_logged_out() {
        let dir = tempdir().unwrap();
        let settings = LocalSettings::load(dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, LocalSettings::default());
        assert!(settings.active_user().is_none());
    }

    #[test]
    fn test_login_logout_persist() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state").join("settings.json");

        let mut settings = LocalSettings::default();
        settings.login("5f1c");
        settings.save(&path).unwrap();

        let mut loaded = LocalSettings::load(&path).unwrap();
        assert_eq!(loaded.active_user(), Some("5f1c"));

        loaded.logout();
        loaded.save(&path).unwrap();
        let loaded = LocalSettings::load(&path).unwrap();
        assert!(!loaded.is_logged_in);
        assert_eq!(loaded.user_id.as_deref(), Some("5f1c"));
        assert!(loaded.active_user().is_none());
    }
}
