//! Harness configuration.
//!
//! The configuration is a YAML document read once at startup. Values are looked up
//! by dotted key (`platform.default_timeout`) and relative paths are resolved
//! against the directory that contains the file, so a config checked in next to the
//! harness works regardless of the caller's working directory.
//!
//! ## Environment overrides
//!
//! | Variable         | Key                         |
//! |------------------|-----------------------------|
//! | `E2E_EXECUTABLE` | `platform.executable`       |
//! | `E2E_TIMEOUT`    | `platform.default_timeout`  |
//! | `E2E_WORKDIR`    | `platform.default_workdir`  |

use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde_yaml::{Mapping, Value};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
pub const DEFAULT_EXECUTABLE: &str = "../../target/release/rvd";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_WORKDIR: &str = "./workdir";
pub const DEFAULT_URLS_FILE: &str = "./datas/urls.yaml";
pub const DEFAULT_REPORTS_DIR: &str = "./reports";
pub const DEFAULT_MAX_WORKERS: usize = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidOverride { var: String, value: String, reason: String },
}

/// Read-only view of the harness configuration.
///
/// Safe to share across runner workers once loaded.
#[derive(Debug, Clone)]
pub struct Config {
    root_dir: PathBuf,
    values: Value,
}

impl Config {
    /// Load `path`, then apply overrides from the process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    /// Load `path` without consulting the environment.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.is_file() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let values: Value = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let absolute = std::path::absolute(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root_dir = absolute.parent().map(Path::to_path_buf).unwrap_or_default();

        Ok(Self::from_value(root_dir, values))
    }

    /// Build a config from an already-parsed tree. A null document is an empty mapping.
    pub fn from_value(root_dir: impl Into<PathBuf>, values: Value) -> Self {
        let values = match values {
            Value::Null => Value::Mapping(Mapping::new()),
            other => other,
        };
        Self {
            root_dir: root_dir.into(),
            values,
        }
    }

    /// Apply `E2E_*` overrides using `lookup` as the variable source.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(exe) = lookup("E2E_EXECUTABLE") {
            self.set("platform.executable", Value::String(exe));
        }
        if let Some(raw) = lookup("E2E_TIMEOUT") {
            let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidOverride {
                var: "E2E_TIMEOUT".to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })?;
            self.set("platform.default_timeout", Value::Number(secs.into()));
        }
        if let Some(dir) = lookup("E2E_WORKDIR") {
            self.set("platform.default_workdir", Value::String(dir));
        }
        Ok(())
    }

    /// Walk a dotted key. `None` when any segment is missing or not a mapping.
    pub fn get(&self, key: &str) -> Option<&Value> {
        key.split('.').try_fold(&self.values, |node, segment| match node {
            Value::Mapping(map) => map.get(segment),
            _ => None,
        })
    }

    pub fn get_str(&self, key: &str, default: &str) -> String {
        self.get(key).and_then(scalar_to_string).unwrap_or_else(|| default.to_string())
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        self.get(key).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn get_u64(&self, key: &str, default: u64) -> u64 {
        match self.get(key) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Non-empty string at `key`.
    fn get_nonempty(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_to_string).filter(|s| !s.is_empty())
    }

    /// Absolute paths pass through; relative ones are joined to the config directory.
    /// Normalisation is lexical only.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.root_dir.join(path))
        }
    }

    pub fn executable(&self) -> PathBuf {
        self.resolve_path(self.get_str("platform.executable", DEFAULT_EXECUTABLE))
    }

    /// Downloader config file passed through to cases that want one.
    pub fn config_file_path(&self) -> Option<PathBuf> {
        self.get_nonempty("platform.config_file").map(|p| self.resolve_path(p))
    }

    /// Global credential file used when a case requires auth but names none.
    pub fn auth_file_path(&self) -> Option<PathBuf> {
        self.get_nonempty("platform.auth_file").map(|p| self.resolve_path(p))
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("platform.default_timeout", DEFAULT_TIMEOUT_SECS))
    }

    pub fn default_workdir(&self) -> PathBuf {
        self.resolve_path(self.get_str("platform.default_workdir", DEFAULT_WORKDIR))
    }

    /// Extra variables from `platform.env`, in file order.
    pub fn env_overrides(&self) -> Vec<(String, String)> {
        match self.get("platform.env") {
            Some(Value::Mapping(map)) => map
                .iter()
                .filter_map(|(k, v)| Some((scalar_to_string(k)?, scalar_to_string(v)?)))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn urls_file(&self) -> PathBuf {
        self.resolve_path(self.get_str("test_data.urls_file", DEFAULT_URLS_FILE))
    }

    pub fn execution(&self) -> ExecutionSettings {
        ExecutionSettings {
            parallel: self.get_bool("execution.parallel", false),
            stop_on_failure: self.get_bool("execution.stop_on_failure", false),
            max_workers: self.get_u64("execution.max_workers", DEFAULT_MAX_WORKERS as u64) as usize,
        }
    }

    pub fn reporting(&self) -> ReportingSettings {
        ReportingSettings {
            output_dir: self.resolve_path(self.get_str("reporting.output_dir", DEFAULT_REPORTS_DIR)),
            console: self.get_bool("reporting.console", true),
            json: self.get_bool("reporting.json", true),
            html: self.get_bool("reporting.html", true),
        }
    }

    pub fn logging(&self) -> LoggingSettings {
        LoggingSettings {
            level: self.get_nonempty("logging.level"),
            file: self.get_nonempty("logging.file").map(|p| self.resolve_path(p)),
        }
    }

    fn set(&mut self, key: &str, value: Value) {
        let mut node = &mut self.values;
        let mut segments = key.split('.').peekable();
        while let Some(segment) = segments.next() {
            if !matches!(node, Value::Mapping(_)) {
                *node = Value::Mapping(Mapping::new());
            }
            let Value::Mapping(map) = node else {
                return;
            };
            let k = Value::String(segment.to_string());
            if segments.peek().is_none() {
                map.insert(k, value);
                return;
            }
            node = map.entry(k).or_insert_with(|| Value::Mapping(Mapping::new()));
        }
    }
}

/// `execution.*` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSettings {
    pub parallel: bool,
    pub stop_on_failure: bool,
    pub max_workers: usize,
}

/// `reporting.*` keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportingSettings {
    pub output_dir: PathBuf,
    pub console: bool,
    pub json: bool,
    pub html: bool,
}

/// `logging.*` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(yaml: &str) -> Config {
        Config::from_value("/opt/e2e", serde_yaml::from_str(yaml).unwrap())
    }

    // ========================================
    // Lookup
    // ========================================

    #[test]
    fn test_dotted_lookup() {
        let c = config("platform:\n  default_timeout: 60\n  executable: bin/rvd\n");
        assert_eq!(c.get_u64("platform.default_timeout", 1), 60);
        assert_eq!(c.get_str("platform.executable", "x"), "bin/rvd");
    }

    #[test]
    fn test_missing_segment_uses_default() {
        let c = config("platform:\n  default_timeout: 60\n");
        assert!(c.get("platform.default_timeout.deeper").is_none());
        assert!(c.get("nope.x").is_none());
        assert_eq!(c.get_str("nope.x", "fallback"), "fallback");
        assert!(c.get_bool("reporting.html", true));
    }

    #[test]
    fn test_empty_document() {
        let c = Config::from_value("/opt/e2e", Value::Null);
        assert_eq!(c.default_timeout(), Duration::from_secs(300));
        assert_eq!(c.default_workdir(), PathBuf::from("/opt/e2e/workdir"));
        assert_eq!(c.executable(), PathBuf::from("/target/release/rvd"));
        assert!(c.auth_file_path().is_none());
        assert!(c.env_overrides().is_empty());
    }

    // ========================================
    // Paths
    // ========================================

    #[test]
    fn test_resolve_path() {
        let c = config("{}");
        assert_eq!(c.resolve_path("./datas/urls.yaml"), PathBuf::from("/opt/e2e/datas/urls.yaml"));
        assert_eq!(c.resolve_path("../rvd/target"), PathBuf::from("/opt/rvd/target"));
        assert_eq!(c.resolve_path("/abs/./x/../y"), PathBuf::from("/abs/y"));
    }

    #[test]
    fn test_auth_and_config_file() {
        let c = config("platform:\n  auth_file: auth.toml\n  config_file: ''\n");
        assert_eq!(c.auth_file_path(), Some(PathBuf::from("/opt/e2e/auth.toml")));
        assert_eq!(c.config_file_path(), None);
    }

    // ========================================
    // Sections
    // ========================================

    #[test]
    fn test_execution_and_reporting_settings() {
        let c = config("execution:\n  parallel: true\n  max_workers: 8\nreporting:\n  html: false\n");
        assert_eq!(
            c.execution(),
            ExecutionSettings {
                parallel: true,
                stop_on_failure: false,
                max_workers: 8
            }
        );
        let r = c.reporting();
        assert_eq!(r.output_dir, PathBuf::from("/opt/e2e/reports"));
        assert!(r.console && r.json && !r.html);
    }

    #[test]
    fn test_env_mapping_stringifies_scalars() {
        let c = config("platform:\n  env:\n    RUST_LOG: debug\n    RVD_RETRIES: 3\n");
        assert_eq!(
            c.env_overrides(),
            vec![
                ("RUST_LOG".to_string(), "debug".to_string()),
                ("RVD_RETRIES".to_string(), "3".to_string())
            ]
        );
    }

    // ========================================
    // Environment overrides
    // ========================================

    #[test]
    fn test_env_overrides_applied() {
        let mut c = config("platform:\n  default_timeout: 60\n");
        c.apply_env_overrides(|var| match var {
            "E2E_EXECUTABLE" => Some("/usr/local/bin/rvd".to_string()),
            "E2E_TIMEOUT" => Some("120".to_string()),
            "E2E_WORKDIR" => Some("/tmp/e2e".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(c.executable(), PathBuf::from("/usr/local/bin/rvd"));
        assert_eq!(c.default_timeout(), Duration::from_secs(120));
        assert_eq!(c.default_workdir(), PathBuf::from("/tmp/e2e"));
    }

    #[test]
    fn test_env_override_creates_missing_sections() {
        let mut c = Config::from_value("/opt/e2e", Value::Null);
        c.apply_env_overrides(|var| (var == "E2E_WORKDIR").then(|| "scratch".to_string()))
            .unwrap();
        assert_eq!(c.default_workdir(), PathBuf::from("/opt/e2e/scratch"));
    }

    #[test]
    fn test_invalid_timeout_override() {
        let mut c = config("{}");
        let err = c
            .apply_env_overrides(|var| (var == "E2E_TIMEOUT").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { .. }));
        assert!(err.to_string().contains("E2E_TIMEOUT"));
    }

    // ========================================
    // Loading
    // ========================================

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_file(&dir.path().join("config.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_file_roots_paths_at_file_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "platform:\n  default_workdir: ./wd\n").unwrap();

        let c = Config::load_file(&path).unwrap();
        assert_eq!(c.default_workdir(), dir.path().join("wd"));
    }

    #[test]
    fn test_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "platform: [unclosed\n").unwrap();
        assert!(matches!(Config::load_file(&path).unwrap_err(), ConfigError::Parse { .. }));
    }
}
