//! Global persisted CLI configuration.
//!
//! Lives at `~/.fern/config.yaml` and records where the native framework
//! library is installed plus the compiler flags used for native builds.
//! Loaded once at process start and passed by reference into whatever
//! needs it; there is no process-wide singleton. Distinct from the
//! per-project `fern.yaml` handled in [`crate::project`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

pub const CONFIG_DIR_NAME: &str = ".fern";
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// The current user's home directory.
pub fn home_dir() -> Option<PathBuf> {
    #[allow(deprecated)] // fine outside Windows, and we only ship Unix
    std::env::home_dir()
}

/// `~/.fern`, the root for config, templates and the build cache.
pub fn config_dir() -> Option<PathBuf> {
    home_dir().map(|home| home.join(CONFIG_DIR_NAME))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "default_version")]
    pub version: String,

    /// Install prefix of the native framework library.
    #[serde(default = "default_prefix")]
    pub cpp_library_path: PathBuf,

    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSettings {
    #[serde(default = "default_flags")]
    pub default_flags: Vec<String>,

    #[serde(default = "default_debug_flags")]
    pub debug_flags: Vec<String>,

    #[serde(default = "default_include_paths")]
    pub include_paths: Vec<PathBuf>,

    #[serde(default = "default_library_paths")]
    pub library_paths: Vec<PathBuf>,

    #[serde(default = "default_libraries")]
    pub libraries: Vec<String>,
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_prefix() -> PathBuf {
    home_dir()
        .map(|home| home.join(".local"))
        .unwrap_or_else(|| PathBuf::from("/usr/local"))
}

fn default_flags() -> Vec<String> {
    vec!["-std=c++17".into(), "-O2".into()]
}

fn default_debug_flags() -> Vec<String> {
    vec!["-std=c++17".into(), "-g".into(), "-O0".into()]
}

fn default_include_paths() -> Vec<PathBuf> {
    vec![default_prefix().join("include")]
}

fn default_library_paths() -> Vec<PathBuf> {
    vec![default_prefix().join("lib")]
}

fn default_libraries() -> Vec<String> {
    ["fern", "X11", "Xext", "fontconfig", "freetype"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            default_flags: default_flags(),
            debug_flags: default_debug_flags(),
            include_paths: default_include_paths(),
            library_paths: default_library_paths(),
            libraries: default_libraries(),
        }
    }
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cpp_library_path: default_prefix(),
            build: BuildSettings::default(),
        }
    }
}

impl GlobalConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_yaml::from_str(&contents)?)
    }

    /// Load the persisted configuration, writing defaults on first run.
    /// Never fails: an unreadable or malformed file downgrades to a
    /// warning plus defaults.
    pub fn load_or_init() -> Self {
        let Some(dir) = config_dir() else {
            tracing::warn!("No home directory; using built-in configuration defaults");
            return Self::default();
        };
        let path = dir.join(CONFIG_FILE_NAME);

        if !path.is_file() {
            let config = Self::default();
            if let Err(err) = config.save(&path) {
                tracing::warn!("Could not write {}: {}", path.display(), err);
            }
            return config;
        }

        match Self::from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(
                    "Ignoring malformed {}: {}; using defaults",
                    path.display(),
                    err
                );
                Self::default()
            }
        }
    }

    fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
        fs::write(path, yaml)
    }

    pub fn flags(&self, debug: bool) -> &[String] {
        if debug {
            &self.build.debug_flags
        } else {
            &self.build.default_flags
        }
    }

    pub fn installed_include_dir(&self) -> PathBuf {
        self.cpp_library_path.join("include").join("fern")
    }

    pub fn installed_library_file(&self) -> PathBuf {
        self.cpp_library_path.join("lib").join("libfern.a")
    }

    /// Native builds require both the installed header directory and the
    /// installed static library.
    pub fn is_framework_installed(&self) -> bool {
        self.installed_include_dir().is_dir() && self.installed_library_file().is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_cover_native_link_inputs() {
        let config = GlobalConfig::default();
        assert_eq!(config.build.default_flags, vec!["-std=c++17", "-O2"]);
        assert!(config.build.libraries.contains(&"fern".to_string()));
        assert_eq!(config.flags(true), &["-std=c++17", "-g", "-O0"]);
    }

    #[test]
    fn round_trips_through_yaml() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");

        let mut config = GlobalConfig::default();
        config.cpp_library_path = PathBuf::from("/opt/custom");
        config.save(&path).unwrap();

        let loaded = GlobalConfig::from_file(&path).unwrap();
        assert_eq!(loaded.cpp_library_path, PathBuf::from("/opt/custom"));
        assert_eq!(loaded.build.default_flags, config.build.default_flags);
    }

    #[test]
    fn partial_file_backfills_defaults() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("config.yaml");
        std::fs::write(&path, "cpp_library_path: /opt/fern\n").unwrap();

        let loaded = GlobalConfig::from_file(&path).unwrap();
        assert_eq!(loaded.cpp_library_path, PathBuf::from("/opt/fern"));
        assert_eq!(loaded.build.default_flags, vec!["-std=c++17", "-O2"]);
    }

    #[test]
    fn installation_check_requires_headers_and_archive() {
        let tmp = tempdir().unwrap();
        let mut config = GlobalConfig::default();
        config.cpp_library_path = tmp.path().to_path_buf();
        assert!(!config.is_framework_installed());

        std::fs::create_dir_all(tmp.path().join("include").join("fern")).unwrap();
        assert!(!config.is_framework_installed());

        std::fs::create_dir_all(tmp.path().join("lib")).unwrap();
        std::fs::write(tmp.path().join("lib").join("libfern.a"), "").unwrap();
        assert!(config.is_framework_installed());
    }
}
