//! Checks on captured process output.

use crate::Verdict;
use crate::patterns;

/// Borrowed view of what a subprocess produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapturedOutput<'a> {
    pub stdout: &'a str,
    pub stderr: &'a str,
    /// `None` when the process was terminated by a signal or never ran.
    pub exit_code: Option<i32>,
}

impl<'a> CapturedOutput<'a> {
    pub fn new(stdout: &'a str, stderr: &'a str, exit_code: Option<i32>) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
        }
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len());
        text.push_str(self.stdout);
        text.push_str(self.stderr);
        text
    }
}

/// Substring, regex and exit-code checks over combined stdout + stderr.
///
/// All configured checks must hold. They are evaluated in a fixed order
/// (required substrings, keyword groups, forbidden substrings, regex, exit code)
/// and the first failure short-circuits.
#[derive(Debug, Clone, Default)]
pub struct OutputValidator {
    contains: Vec<String>,
    contains_any: Vec<Vec<String>>,
    not_contains: Vec<String>,
    regex: Option<String>,
    exit_code: Option<i32>,
    ignore_case: bool,
}

impl OutputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `text` to appear in the output.
    pub fn contains(mut self, text: impl Into<String>) -> Self {
        self.contains.push(text.into());
        self
    }

    /// Require at least one of `keywords` to appear in the output.
    pub fn contains_any<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.contains_any.push(keywords.into_iter().map(Into::into).collect());
        self
    }

    /// Forbid `text` from appearing in the output.
    pub fn not_contains(mut self, text: impl Into<String>) -> Self {
        self.not_contains.push(text.into());
        self
    }

    pub fn regex(mut self, re: impl Into<String>) -> Self {
        self.regex = Some(re.into());
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Compare substrings case-insensitively. Does not affect the regex.
    pub fn ignore_case(mut self, ignore: bool) -> Self {
        self.ignore_case = ignore;
        self
    }

    pub fn validate(&self, output: &CapturedOutput<'_>) -> Verdict {
        let combined = output.combined();
        let haystack = if self.ignore_case {
            combined.to_lowercase()
        } else {
            combined.clone()
        };
        let found = |needle: &str| {
            if self.ignore_case {
                haystack.contains(&needle.to_lowercase())
            } else {
                haystack.contains(needle)
            }
        };

        for text in &self.contains {
            if !found(text) {
                return Verdict::fail(format!("Output does not contain: {}", text));
            }
        }

        for group in &self.contains_any {
            if !group.is_empty() && !group.iter().any(|k| found(k)) {
                return Verdict::fail(format!("Output does not contain any of: {}", group.join(", ")));
            }
        }

        for text in &self.not_contains {
            if found(text) {
                return Verdict::fail(format!("Output should not contain: {}", text));
            }
        }

        if let Some(re) = &self.regex {
            match patterns::compile(re) {
                Ok(compiled) if compiled.is_match(&combined) => {}
                Ok(_) => return Verdict::fail(format!("Output does not match regex: {}", re)),
                Err(e) => return Verdict::fail(e),
            }
        }

        if let Some(expected) = self.exit_code {
            match output.exit_code {
                Some(actual) if actual == expected => {}
                Some(actual) => {
                    return Verdict::fail(format!("Exit code mismatch: expected {}, got {}", expected, actual));
                }
                None => {
                    return Verdict::fail(format!(
                        "Exit code mismatch: expected {}, process did not exit normally",
                        expected
                    ));
                }
            }
        }

        Verdict::pass()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn out<'a>(stdout: &'a str, stderr: &'a str) -> CapturedOutput<'a> {
        CapturedOutput::new(stdout, stderr, Some(0))
    }

    // ========================================
    // Substring checks
    // ========================================

    #[test]
    fn test_empty_validator_passes() {
        assert_eq!(OutputValidator::new().validate(&out("", "")), Verdict::pass());
    }

    #[test]
    fn test_contains_searches_stdout_and_stderr() {
        let v = OutputValidator::new().contains("Download").contains("warning");
        assert!(v.validate(&out("Download completed", "warning: slow cdn")).passed);
    }

    #[test]
    fn test_contains_missing() {
        let v = OutputValidator::new().contains("completed");
        let verdict = v.validate(&out("error: invalid url", ""));
        assert_eq!(verdict, Verdict::fail("Output does not contain: completed"));
    }

    #[test]
    fn test_first_failure_short_circuits() {
        let v = OutputValidator::new().contains("a").contains("b").not_contains("c");
        let verdict = v.validate(&out("c", ""));
        assert_eq!(verdict.message, "Output does not contain: a");
    }

    #[test]
    fn test_not_contains() {
        let v = OutputValidator::new().not_contains("panicked");
        let verdict = v.validate(&out("", "thread 'main' panicked at src/main.rs"));
        assert_eq!(verdict.message, "Output should not contain: panicked");
    }

    #[test]
    fn test_contains_any() {
        let v = OutputValidator::new().contains_any(["completed", "success"]);
        assert!(v.validate(&out("success!", "")).passed);

        let verdict = v.validate(&out("nothing", ""));
        assert_eq!(verdict.message, "Output does not contain any of: completed, success");
    }

    #[test]
    fn test_ignore_case() {
        let v = OutputValidator::new().contains("completed").ignore_case(true);
        assert!(v.validate(&out("Download COMPLETED", "")).passed);

        let strict = OutputValidator::new().contains("completed");
        assert!(!strict.validate(&out("Download COMPLETED", "")).passed);
    }

    // ========================================
    // Regex checks
    // ========================================

    #[test]
    fn test_regex_spans_lines() {
        let v = OutputValidator::new().regex(r"Selected quality:.*1080P");
        assert!(v.validate(&out("Selected quality:\n  1080P HD", "")).passed);
    }

    #[test]
    fn test_regex_mismatch() {
        let v = OutputValidator::new().regex(r"^Muxed to .+\.mp4$");
        let verdict = v.validate(&out("Muxed to video.mkv", ""));
        assert_eq!(verdict.message, r"Output does not match regex: ^Muxed to .+\.mp4$");
    }

    #[test]
    fn test_invalid_regex_is_a_verdict() {
        let verdict = OutputValidator::new().regex("(unclosed").validate(&out("x", ""));
        assert!(!verdict.passed);
        assert!(verdict.message.starts_with("Invalid regex (unclosed"));
    }

    // ========================================
    // Exit code checks
    // ========================================

    #[test]
    fn test_exit_code_match() {
        let v = OutputValidator::new().exit_code(2);
        assert!(v.validate(&CapturedOutput::new("", "", Some(2))).passed);
    }

    #[test]
    fn test_exit_code_mismatch() {
        let v = OutputValidator::new().exit_code(0);
        let verdict = v.validate(&CapturedOutput::new("", "", Some(1)));
        assert_eq!(verdict.message, "Exit code mismatch: expected 0, got 1");

        let verdict = v.validate(&CapturedOutput::new("", "", None));
        assert!(verdict.message.contains("did not exit normally"));
    }

    #[test]
    fn test_validate_is_repeatable() {
        let v = OutputValidator::new().contains("x").regex("y+");
        let o = out("xyy", "");
        assert_eq!(v.validate(&o), v.validate(&o));
    }
}
