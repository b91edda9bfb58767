//! Integration tests for the six concrete scenarios named in the project's
//! design notes (S1-S6), plus a couple of the numbered invariants that are
//! easiest to check end-to-end rather than unit-by-unit.

use std::fs;
use std::path::Path;

use contextdump::{ContextError, ReadContextOptions};

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn content_paths(dump: &str) -> Vec<String> {
    let mut paths: Vec<String> = dump
        .lines()
        .filter_map(|l| l.strip_prefix("```path=").map(|s| s.to_string()))
        .collect();
    paths.sort_unstable();
    paths
}

#[test]
fn s1_default_exclusions() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "print(1)\n");
    write(dir.path(), ".git/config", "x");
    write(dir.path(), "node_modules/x.js", "1");

    let dump = contextdump::read_context(ReadContextOptions::new(dir.path())).unwrap();
    assert_eq!(content_paths(&dump), vec!["a.py".to_string()]);
}

#[test]
fn s2_contextfile_inclusion_anchors_to_its_own_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".git/config", "x");
    write(dir.path(), "src/app.py", "print(1)\n");
    write(dir.path(), "src/.contextfiles", ".git/\n");

    let dump = contextdump::read_context(
        ReadContextOptions::new(dir.path()).target(std::path::PathBuf::from("src")),
    )
    .unwrap();
    assert_eq!(content_paths(&dump), vec!["src/app.py".to_string()]);
}

#[test]
fn s3_override_exclusivity() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".git/config", "x");
    write(dir.path(), "a.py", "print(1)\n");
    write(dir.path(), "b.tmp", "scratch");

    let dump = contextdump::read_context(
        ReadContextOptions::new(dir.path()).override_rules(vec!["*.tmp".to_string()]),
    )
    .unwrap();
    assert_eq!(content_paths(&dump), vec![".git/config".to_string(), "a.py".to_string()]);
}

#[test]
fn s4_negation_precedence() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".contextfiles", "!*.log\nimportant.log\n");
    write(dir.path(), "a.log", "noisy");
    write(dir.path(), "important.log", "keep me");

    let dump = contextdump::read_context(ReadContextOptions::new(dir.path())).unwrap();
    assert_eq!(content_paths(&dump), vec!["important.log".to_string()]);
}

#[test]
fn s5_oversize_raises_detailed_diagnostic() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.txt", &"a".repeat(600));
    write(dir.path(), "b.txt", &"b".repeat(500));
    write(dir.path(), "c.txt", &"c".repeat(400));

    let err = contextdump::read_context(ReadContextOptions::new(dir.path()).size_limit_bytes(1000));
    let err = err.expect_err("expected the aggregate budget to be exceeded");
    match err {
        ContextError::Oversize { limit_bytes, observed_bytes, largest_files } => {
            assert_eq!(limit_bytes, 1000);
            assert!(observed_bytes > limit_bytes);
            assert!(largest_files.windows(2).all(|w| w[0].size_bytes >= w[1].size_bytes));
        }
        other => panic!("expected Oversize, got {other:?}"),
    }
}

#[test]
fn s6_list_only_parity_with_content_mode() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "print(1)\n");
    write(dir.path(), "src/b.py", "print(2)\n");
    write(dir.path(), ".git/config", "x");

    let listed = contextdump::read_context(ReadContextOptions::new(dir.path()).list_only(true)).unwrap();
    let content = contextdump::read_context(ReadContextOptions::new(dir.path())).unwrap();

    let mut listed_paths: Vec<&str> = listed.lines().collect();
    listed_paths.sort_unstable();
    assert_eq!(listed_paths, content_paths(&content));
}

#[test]
fn determinism_across_repeated_invocations() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.py", "print(1)\n");
    write(dir.path(), "z.py", "print(2)\n");
    write(dir.path(), "m/n.py", "print(3)\n");

    let first = contextdump::read_context(ReadContextOptions::new(dir.path())).unwrap();
    let second = contextdump::read_context(ReadContextOptions::new(dir.path())).unwrap();
    assert_eq!(first, second);
}

#[test]
fn explicit_file_target_bypasses_rules() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), ".git/config", "this would normally be excluded");

    let dump = contextdump::read_context(
        ReadContextOptions::new(dir.path()).target(std::path::PathBuf::from(".git/config")),
    )
    .unwrap();
    assert_eq!(content_paths(&dump), vec![".git/config".to_string()]);
}

#[test]
fn symlinks_are_never_followed() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "real/a.py", "print(1)\n");

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();
        let dump = contextdump::read_context(ReadContextOptions::new(dir.path())).unwrap();
        assert_eq!(content_paths(&dump), vec!["real/a.py".to_string()]);
    }
}
