//! Integration tests for ADR numbering and saving.

mod common;

use std::fs;

use cadr::adr::{next_number, save, slugify};
use cadr::error::FileSystemError;
use common::temp_test_dir;

#[test]
fn test_first_and_second_save_are_sequential() {
    let dir = temp_test_dir();
    let adr_dir = dir.path().join("docs").join("adr");

    let first = save("# Use Redis\n", "Use Redis", &adr_dir).expect("Failed to save first ADR");
    let second =
        save("# Drop Memcached\n", "Drop Memcached", &adr_dir).expect("Failed to save second ADR");

    assert_eq!(first, adr_dir.join("0001-use-redis.md"));
    assert_eq!(second, adr_dir.join("0002-drop-memcached.md"));
    assert_eq!(fs::read_to_string(first).unwrap(), "# Use Redis\n");
}

#[test]
fn test_save_continues_after_gap() {
    let dir = temp_test_dir();
    fs::write(dir.path().join("0001-first.md"), "one").unwrap();
    fs::write(dir.path().join("0005-fifth.md"), "five").unwrap();

    let path = save("# Sixth\n", "Sixth", dir.path()).expect("Failed to save ADR");

    assert_eq!(path, dir.path().join("0006-sixth.md"));
}

#[test]
fn test_next_number_ignores_non_matching_names() {
    let dir = temp_test_dir();
    for name in ["00042-five-digits.md", "7-one-digit.md", "notes.md", "0003-real.md", "template.md"] {
        fs::write(dir.path().join(name), "").unwrap();
    }

    assert_eq!(next_number(dir.path()), 4);
}

#[test]
fn test_next_number_empty_and_missing() {
    let dir = temp_test_dir();
    assert_eq!(next_number(dir.path()), 1);
    assert_eq!(next_number(&dir.path().join("missing")), 1);
}

#[test]
fn test_save_creates_missing_directory() {
    let dir = temp_test_dir();
    let adr_dir = dir.path().join("architecture").join("decisions");

    let path = save("# Adopt OpenTelemetry", "Adopt OpenTelemetry", &adr_dir)
        .expect("Failed to save ADR");

    assert!(adr_dir.is_dir());
    assert_eq!(path.file_name().unwrap(), "0001-adopt-opentelemetry.md");
}

#[test]
fn test_save_with_symbol_only_title() {
    let dir = temp_test_dir();
    let path = save("# ???", "???", dir.path()).expect("Failed to save ADR");
    assert_eq!(path.file_name().unwrap(), "0001-.md");
    assert_eq!(slugify("???"), "");
}

#[test]
fn test_save_leaves_no_temp_files() {
    let dir = temp_test_dir();
    save("# One", "One", dir.path()).unwrap();
    save("# Two", "Two", dir.path()).unwrap();

    let mut names: Vec<String> = fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["0001-one.md", "0002-two.md"]);
}

#[cfg(unix)]
#[test]
fn test_save_permission_denied() {
    use std::os::unix::fs::PermissionsExt;

    let dir = temp_test_dir();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // Privileged users ignore directory permissions; nothing to check then.
    if fs::write(locked.join("probe"), "").is_ok() {
        return;
    }

    let err = save("# Locked", "Locked", &locked).unwrap_err();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(matches!(err, FileSystemError::PermissionDenied { .. }));
    assert!(err.to_string().contains("Permission denied"));
}
