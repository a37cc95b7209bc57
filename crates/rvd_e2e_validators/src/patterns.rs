//! Glob and regex helpers shared by the validators.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use regex::{Regex, RegexBuilder};

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    // `*` stays inside one directory level; `**` is needed to recurse.
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Paths under `dir` matching `pattern`, sorted.
pub(crate) fn glob_in(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, String> {
    let base = Pattern::escape(&dir.to_string_lossy());
    let full = format!("{}{}{}", base, std::path::MAIN_SEPARATOR, pattern);

    let paths = glob::glob_with(&full, MATCH_OPTIONS).map_err(|e| format!("Invalid pattern {}: {}", pattern, e))?;

    let mut matched: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
    matched.sort();
    Ok(matched)
}

/// Regex with multiline + dot-matches-newline semantics.
pub(crate) fn compile(re: &str) -> Result<Regex, String> {
    RegexBuilder::new(re)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|e| format!("Invalid regex {}: {}", re, e))
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_star_does_not_recurse() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("top.xml"), "a").unwrap();
        fs::write(dir.path().join("sub/deep.xml"), "b").unwrap();

        let shallow = glob_in(dir.path(), "*.xml").unwrap();
        assert_eq!(shallow.len(), 1);

        let deep = glob_in(dir.path(), "**/*.xml").unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_base_dir_with_glob_metacharacters() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("case [1]");
        fs::create_dir(&odd).unwrap();
        fs::write(odd.join("video.mp4"), "x").unwrap();

        assert_eq!(glob_in(&odd, "*.mp4").unwrap().len(), 1);
    }

    #[test]
    fn test_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let err = glob_in(dir.path(), "[").unwrap_err();
        assert!(err.starts_with("Invalid pattern ["));
    }

    #[test]
    fn test_compile_is_multiline_dotall() {
        let re = compile("^start.*end$").unwrap();
        assert!(re.is_match("noise\nstart\nmiddle\nend\ntrailer"));
        assert!(compile("(").is_err());
    }
}
