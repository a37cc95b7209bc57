//! Text checks on files produced inside a working directory.

use std::fs;
use std::path::Path;

use crate::Verdict;
use crate::patterns::{compile, display_name, glob_in};

/// Reads every file matching one glob pattern and checks its text.
///
/// Files are decoded as UTF-8 with invalid bytes replaced. A pattern that matches
/// no files always fails, whatever substrings are configured.
#[derive(Debug, Clone)]
pub struct ContentValidator {
    file_pattern: String,
    contains: Vec<String>,
    regex: Option<String>,
}

impl ContentValidator {
    pub fn new(file_pattern: impl Into<String>) -> Self {
        Self {
            file_pattern: file_pattern.into(),
            contains: Vec::new(),
            regex: None,
        }
    }

    pub fn contains(mut self, text: impl Into<String>) -> Self {
        self.contains.push(text.into());
        self
    }

    pub fn regex(mut self, re: impl Into<String>) -> Self {
        self.regex = Some(re.into());
        self
    }

    pub fn validate(&self, workdir: &Path) -> Verdict {
        let files = match glob_in(workdir, &self.file_pattern) {
            Ok(files) => files,
            Err(e) => return Verdict::fail(e),
        };
        let files: Vec<_> = files.into_iter().filter(|p| p.is_file()).collect();
        if files.is_empty() {
            return Verdict::fail(format!("No files match pattern: {}", self.file_pattern));
        }

        let compiled = match self.regex.as_deref().map(compile).transpose() {
            Ok(re) => re,
            Err(e) => return Verdict::fail(e),
        };

        for file in &files {
            let name = display_name(file);
            let bytes = match fs::read(file) {
                Ok(b) => b,
                Err(e) => return Verdict::fail(format!("Failed to read file {}: {}", name, e)),
            };
            let content = String::from_utf8_lossy(&bytes);

            if let Some(missing) = self.contains.iter().find(|t| !content.contains(t.as_str())) {
                return Verdict::fail(format!("File {} does not contain: {}", name, missing));
            }

            if let (Some(re), Some(src)) = (&compiled, &self.regex) {
                if !re.is_match(&content) {
                    return Verdict::fail(format!("File {} does not match regex: {}", name, src));
                }
            }
        }

        Verdict::pass()
    }
}
