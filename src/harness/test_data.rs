//! Per-case data (URLs, credentials, limits) from the URLs file.

use std::fs;

use serde_yaml::{Mapping, Value};
use tracing::warn;

use crate::config::Config;

/// Prefix of the URLs shipped in the sample data file; such cases cannot pass.
pub const PLACEHOLDER_PREFIX: &str = "PLACEHOLDER_";

/// The mapping found at one dotted key of `test_data.urls_file`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestData {
    values: Mapping,
}

impl TestData {
    /// Load the entry at `key`. A missing file, missing key or parse error yields
    /// empty data with a warning, so the case still builds and reports the gap.
    pub fn load(config: &Config, key: &str) -> Self {
        let path = config.urls_file();
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "test data file unavailable");
                return Self::default();
            }
        };
        let root: Value = match serde_yaml::from_str(&text) {
            Ok(root) => root,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "test data file is not valid YAML");
                return Self::default();
            }
        };
        let data = Self::from_value(root).section(key);
        if data.is_empty() {
            warn!(key, "no test data");
        }
        data
    }

    /// Non-mapping values become empty data.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Mapping(values) => Self { values },
            _ => Self::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split('.');
        let first = self.values.get(segments.next()?)?;
        segments.try_fold(first, |node, segment| node.as_mapping()?.get(segment))
    }

    /// Nested entry at `key`, empty when absent.
    pub fn section(&self, key: &str) -> Self {
        self.get(key).cloned().map(Self::from_value).unwrap_or_default()
    }

    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match self.get(key)? {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    /// `url`, or `placeholder` when not configured.
    pub fn url_or(&self, placeholder: &str) -> String {
        self.get_str("url")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| placeholder.to_string())
    }
}

pub fn is_placeholder(url: &str) -> bool {
    url.starts_with(PLACEHOLDER_PREFIX)
}
