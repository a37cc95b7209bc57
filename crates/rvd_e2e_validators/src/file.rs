//! Existence and size checks on a working directory.

use std::fs;
use std::path::Path;

use crate::Verdict;
use crate::patterns::{display_name, glob_in};

/// Glob-based checks against a working directory.
///
/// Checks run in order: required patterns, any-of groups, forbidden patterns,
/// minimum sizes, maximum sizes. Size bounds only apply to regular files; a size
/// pattern that matches nothing is not a failure on its own.
#[derive(Debug, Clone, Default)]
pub struct FileValidator {
    files_exist: Vec<String>,
    any_exist: Vec<Vec<String>>,
    files_not_exist: Vec<String>,
    min_size: Vec<(String, u64)>,
    max_size: Vec<(String, u64)>,
}

impl FileValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `pattern` must match at least one path.
    pub fn exists(mut self, pattern: impl Into<String>) -> Self {
        self.files_exist.push(pattern.into());
        self
    }

    /// At least one of `patterns` must match.
    pub fn require_any<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.any_exist.push(patterns.into_iter().map(Into::into).collect());
        self
    }

    /// `pattern` must match nothing.
    pub fn not_exists(mut self, pattern: impl Into<String>) -> Self {
        self.files_not_exist.push(pattern.into());
        self
    }

    /// Every file matching `pattern` must be at least `bytes` long.
    pub fn min_size(mut self, pattern: impl Into<String>, bytes: u64) -> Self {
        self.min_size.push((pattern.into(), bytes));
        self
    }

    /// Every file matching `pattern` must be at most `bytes` long.
    pub fn max_size(mut self, pattern: impl Into<String>, bytes: u64) -> Self {
        self.max_size.push((pattern.into(), bytes));
        self
    }

    pub fn validate(&self, workdir: &Path) -> Verdict {
        match self.check(workdir) {
            Ok(()) => Verdict::pass(),
            Err(message) => Verdict::fail(message),
        }
    }

    fn check(&self, workdir: &Path) -> Result<(), String> {
        for pattern in &self.files_exist {
            if glob_in(workdir, pattern)?.is_empty() {
                return Err(format!("File not found: {}", pattern));
            }
        }

        for group in &self.any_exist {
            let mut any = group.is_empty();
            for pattern in group {
                if !glob_in(workdir, pattern)?.is_empty() {
                    any = true;
                    break;
                }
            }
            if !any {
                return Err(format!("None of the files found: {}", group.join(", ")));
            }
        }

        for pattern in &self.files_not_exist {
            if let Some(found) = glob_in(workdir, pattern)?.first() {
                return Err(format!(
                    "File should not exist: {} (found: {})",
                    pattern,
                    display_name(found)
                ));
            }
        }

        for (pattern, min) in &self.min_size {
            for (name, size) in sized_files(workdir, pattern)? {
                if size < *min {
                    return Err(format!("File {} too small: {} < {} bytes", name, size, min));
                }
            }
        }

        for (pattern, max) in &self.max_size {
            for (name, size) in sized_files(workdir, pattern)? {
                if size > *max {
                    return Err(format!("File {} too large: {} > {} bytes", name, size, max));
                }
            }
        }

        Ok(())
    }
}

fn sized_files(workdir: &Path, pattern: &str) -> Result<Vec<(String, u64)>, String> {
    let mut out = Vec::new();
    for path in glob_in(workdir, pattern)? {
        let meta = fs::metadata(&path).map_err(|e| format!("Failed to stat file {}: {}", display_name(&path), e))?;
        if meta.is_file() {
            out.push((display_name(&path), meta.len()));
        }
    }
    Ok(out)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, len: usize) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![b'x'; len]).unwrap();
    }

    #[test]
    fn test_exists_and_min_size_pass() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "video.mp4", 150 * 1024);

        let v = FileValidator::new().exists("*.mp4").min_size("*.mp4", 100 * 1024);
        assert_eq!(v.validate(dir.path()), Verdict::pass());
    }

    #[test]
    fn test_shrinking_below_min_flips_result() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "video.mp4", 150 * 1024);
        let v = FileValidator::new().exists("*.mp4").min_size("*.mp4", 100 * 1024);
        assert!(v.validate(dir.path()).passed);

        write(dir.path(), "video.mp4", 1024);
        let verdict = v.validate(dir.path());
        assert!(!verdict.passed);
        assert_eq!(verdict.message, "File video.mp4 too small: 1024 < 102400 bytes");
    }

    #[test]
    fn test_missing_required_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let verdict = FileValidator::new().exists("*.srt").validate(dir.path());
        assert_eq!(verdict, Verdict::fail("File not found: *.srt"));
    }

    #[test]
    fn test_forbidden_pattern_found() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "video.m4s.part", 10);
        let verdict = FileValidator::new().not_exists("*.part").validate(dir.path());
        assert_eq!(verdict.message, "File should not exist: *.part (found: video.m4s.part)");
    }

    #[test]
    fn test_max_size() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "cover.jpg", 2048);
        let verdict = FileValidator::new().max_size("*.jpg", 1024).validate(dir.path());
        assert_eq!(verdict.message, "File cover.jpg too large: 2048 > 1024 bytes");
    }

    #[test]
    fn test_recursive_pattern() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "season/ep1/danmaku.xml", 10);
        assert!(!FileValidator::new().exists("*.xml").validate(dir.path()).passed);
        assert!(FileValidator::new().exists("**/*.xml").validate(dir.path()).passed);
    }

    #[test]
    fn test_require_any() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "video.mkv", 10);
        let v = FileValidator::new().require_any(["*.mp4", "*.mkv", "*.flv"]);
        assert!(v.validate(dir.path()).passed);

        let empty = tempfile::tempdir().unwrap();
        let verdict = v.validate(empty.path());
        assert_eq!(verdict.message, "None of the files found: *.mp4, *.mkv, *.flv");
    }

    #[test]
    fn test_size_checks_skip_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("parts.mp4")).unwrap();
        assert!(FileValidator::new().min_size("*.mp4", 1).validate(dir.path()).passed);
    }
}
