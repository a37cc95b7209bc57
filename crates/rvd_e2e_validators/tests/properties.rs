//! Property-based tests for the validators.

use std::fs;

use proptest::prelude::*;
use rvd_e2e_validators::{CapturedOutput, ContentValidator, FileValidator, OutputValidator, Target, Validator};

// =============================================================================
// Idempotence
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: validating the same output twice gives the same verdict.
    #[test]
    fn output_validation_is_idempotent(
        stdout in ".{0,64}",
        stderr in ".{0,32}",
        needle in "[a-z]{1,4}",
        code in proptest::option::of(-2i32..3),
    ) {
        let v = OutputValidator::new().contains(needle.clone()).not_contains("panic").regex("^.*$").exit_code(0);
        let out = CapturedOutput::new(&stdout, &stderr, code);
        prop_assert_eq!(v.validate(&out), v.validate(&out));
    }

    /// Property: a substring of the output always satisfies `contains`.
    #[test]
    fn output_contains_its_own_substrings(text in "[a-zA-Z0-9 ]{1,40}", start in 0usize..40, len in 1usize..10) {
        let start = start.min(text.len() - 1);
        let end = (start + len).min(text.len());
        let needle = &text[start..end];
        let verdict = OutputValidator::new().contains(needle).validate(&CapturedOutput::new(&text, "", Some(0)));
        prop_assert!(verdict.passed);
    }

    /// Property: file checks are stable across repeated calls and flip exactly at
    /// the minimum size.
    #[test]
    fn file_min_size_boundary(size in 0usize..4096, min in 0u64..4096) {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("video.mp4"), vec![0u8; size]).unwrap();

        let v = FileValidator::new().exists("*.mp4").min_size("*.mp4", min);
        let first = v.validate(dir.path());
        prop_assert_eq!(&first, &v.validate(dir.path()));
        prop_assert_eq!(first.passed, size as u64 >= min);
        if !first.passed {
            prop_assert_eq!(first.message, format!("File video.mp4 too small: {} < {} bytes", size, min));
        } else {
            prop_assert_eq!(first.message, "");
        }
    }

    /// Property: content checks never fail on invalid UTF-8, only on the missing text.
    #[test]
    fn content_tolerates_arbitrary_bytes(prefix in proptest::collection::vec(any::<u8>(), 0..64)) {
        let dir = tempfile::tempdir().unwrap();
        let mut bytes = prefix;
        bytes.extend_from_slice(b"\n00:00:01,000 --> 00:00:02,000\n");
        fs::write(dir.path().join("ep.srt"), bytes).unwrap();

        let v = ContentValidator::new("*.srt").contains("-->");
        let verdict = v.validate(dir.path());
        prop_assert!(verdict.passed);
        prop_assert_eq!(verdict, v.validate(dir.path()));
    }
}

// =============================================================================
// Fixed scenarios
// =============================================================================

#[test]
fn test_content_without_matches_always_fails() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("video.mp4"), b"data").unwrap();

    let verdict = ContentValidator::new("*.xml").validate(dir.path());
    assert!(!verdict.passed);
    assert_eq!(verdict.message, "No files match pattern: *.xml");
}

#[test]
fn test_content_names_file_and_missing_text() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("danmaku.xml"), "<?xml version=\"1.0\"?><i></i>").unwrap();

    let verdict = ContentValidator::new("*.xml").contains("<d ").validate(dir.path());
    assert_eq!(verdict.message, "File danmaku.xml does not contain: <d ");
}

#[test]
fn test_enum_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.srt"), "1\n00:00:01,000 --> 00:00:02,000\nhi\n").unwrap();

    let validators: Vec<Validator> = vec![
        FileValidator::new().exists("*.srt").into(),
        ContentValidator::new("*.srt").contains("-->").into(),
    ];
    for v in &validators {
        assert!(v.validate(Target::Dir(dir.path())).passed, "{} failed", v.kind());
    }

    let output = Validator::from(OutputValidator::new().contains("ok"));
    assert!(output.validate(Target::Output(CapturedOutput::new("ok", "", Some(0)))).passed);
    assert!(!output.validate(Target::Dir(dir.path())).passed);
}
