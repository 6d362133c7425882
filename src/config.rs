use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::JobLogError;
use crate::sheets::DEFAULT_TAB;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_record_root")]
    pub record_root: PathBuf,
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default = "default_tab_name")]
    pub tab_name: String, // empty means the first tab
}

fn default_record_root() -> PathBuf {
    // Use XDG data directory or fallback
    if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "joblog") {
        proj_dirs.data_dir().join("companies_applied_for")
    } else {
        PathBuf::from("companies_applied_for")
    }
}

fn default_tab_name() -> String {
    DEFAULT_TAB.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            record_root: default_record_root(),
            credentials_path: None,
            sheet_name: None,
            tab_name: default_tab_name(),
        }
    }
}

impl Config {
    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "joblog") {
            proj_dirs.config_dir().join("config.toml")
        } else {
            PathBuf::from("joblog.toml")
        }
    }

    /// Load from `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> Result<Self, JobLogError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| JobLogError::Config(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| JobLogError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn tab(&self) -> Option<&str> {
        if self.tab_name.is_empty() {
            None
        } else {
            Some(&self.tab_name)
        }
    }

    pub fn to_toml(&self) -> Result<String, JobLogError> {
        toml::to_string_pretty(self).map_err(|e| JobLogError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.tab_name, "Jobs Applied For");
        assert!(config.credentials_path.is_none());
        assert!(config.sheet_name.is_none());
        assert!(config.record_root.ends_with("companies_applied_for"));
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "record_root = \"/data/jobs\"\nsheet_name = \"Job log\"\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.record_root, PathBuf::from("/data/jobs"));
        assert_eq!(config.sheet_name.as_deref(), Some("Job log"));
        assert_eq!(config.tab(), Some("Jobs Applied For"));
    }

    #[test]
    fn test_empty_tab_means_first_tab() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "tab_name = \"\"\n").unwrap();
        assert_eq!(Config::load(&path).unwrap().tab(), None);
    }

    #[test]
    fn test_invalid_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "record_root = [1, 2").unwrap();

        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, JobLogError::Config(_)));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_to_toml_skips_unset_values() {
        let config = Config {
            record_root: PathBuf::from("/data/jobs"),
            ..Config::default()
        };
        let text = config.to_toml().unwrap();
        assert!(text.contains("record_root = \"/data/jobs\""));
        assert!(text.contains("tab_name = \"Jobs Applied For\""));
        assert!(!text.contains("sheet_name"));
    }
}
