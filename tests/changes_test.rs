//! Integration tests for change-set resolution against real repositories.
//!
//! Repositories are built with git2; `GitChangeSource` then queries them
//! through the system `git` binary.

mod common;

use cadr::error::VcsError;
use cadr::git::{ChangeSetMode, ChangeSource, GitChangeSource};
use common::{TestRepo, temp_test_dir};

fn seeded_repo() -> TestRepo {
    let repo = TestRepo::new();
    repo.commit_files(
        "initial",
        &[("README.md", "# Demo\n"), ("main.rs", "fn main() {}\n")],
    );
    repo
}

// =============================================================================
// WORKING TREE MODES
// =============================================================================

#[tokio::test]
async fn test_staged_mode_sees_only_index() {
    let repo = seeded_repo();
    repo.stage_file("db.rs", "pub fn connect() {}\n");
    repo.write_file("README.md", "# Demo\n\nUnstaged edit\n");

    let changes = GitChangeSource::new(repo.path())
        .resolve(&ChangeSetMode::Staged)
        .await
        .expect("Failed to resolve staged changes");

    assert_eq!(changes.file_paths, vec!["db.rs"]);
    assert!(changes.diff_text.contains("+pub fn connect() {}"));
    assert!(!changes.diff_text.contains("Unstaged edit"));
}

#[tokio::test]
async fn test_all_uncommitted_includes_unstaged_edits() {
    let repo = seeded_repo();
    repo.stage_file("db.rs", "pub fn connect() {}\n");
    repo.write_file("README.md", "# Demo\n\nUnstaged edit\n");

    let changes = GitChangeSource::new(repo.path())
        .resolve(&ChangeSetMode::AllUncommitted)
        .await
        .expect("Failed to resolve uncommitted changes");

    assert_eq!(changes.file_paths.len(), 2);
    assert!(changes.file_paths.contains(&"db.rs".to_string()));
    assert!(changes.file_paths.contains(&"README.md".to_string()));
    assert!(changes.diff_text.contains("+Unstaged edit"));
}

#[tokio::test]
async fn test_clean_tree_is_empty() {
    let repo = seeded_repo();

    let changes = GitChangeSource::new(repo.path())
        .resolve(&ChangeSetMode::Staged)
        .await
        .expect("Failed to resolve staged changes");

    assert!(!changes.has_files());
    assert!(!changes.has_diff());
}

#[tokio::test]
async fn test_diff_uses_one_line_of_context() {
    let repo = TestRepo::new();
    let lines: String = (1..=20).map(|n| format!("line {}\n", n)).collect();
    repo.commit_files("initial", &[("data.txt", lines.as_str())]);
    repo.stage_file("data.txt", &lines.replace("line 10\n", "line ten\n"));

    let changes = GitChangeSource::new(repo.path())
        .resolve(&ChangeSetMode::Staged)
        .await
        .expect("Failed to resolve staged changes");

    assert!(changes.diff_text.contains(" line 9\n"));
    assert!(changes.diff_text.contains(" line 11\n"));
    assert!(!changes.diff_text.contains(" line 8\n"));
    assert!(!changes.diff_text.contains(" line 12\n"));
}

#[tokio::test]
async fn test_non_ascii_paths_are_not_quoted() {
    let repo = seeded_repo();
    repo.stage_file("café.rs", "pub struct Menu;\n");

    let changes = GitChangeSource::new(repo.path())
        .resolve(&ChangeSetMode::Staged)
        .await
        .expect("Failed to resolve staged changes");

    assert_eq!(changes.file_paths, vec!["café.rs"]);
    assert!(changes.diff_text.contains("café.rs"));
}

// =============================================================================
// IGNORE PATTERNS
// =============================================================================

#[tokio::test]
async fn test_ignore_patterns_filter_files_and_diff() {
    let repo = seeded_repo();
    repo.stage_file("Cargo.lock", "# generated\n");
    repo.stage_file("docs/guide.md", "Guide\n");
    repo.stage_file("cache.rs", "pub struct Cache;\n");

    let changes = GitChangeSource::new(repo.path())
        .with_ignore_patterns(&["*.lock".to_string(), "*.md".to_string()])
        .resolve(&ChangeSetMode::Staged)
        .await
        .expect("Failed to resolve staged changes");

    assert_eq!(changes.file_paths, vec!["cache.rs"]);
    assert!(!changes.diff_text.contains("Cargo.lock"));
    assert!(!changes.diff_text.contains("guide.md"));
}

// =============================================================================
// BRANCH MODE
// =============================================================================

#[tokio::test]
async fn test_branch_diff_uses_merge_base() {
    let repo = TestRepo::new();
    let root = repo.commit_files("initial", &[("README.md", "# Demo\n")]);
    repo.branch("base", root);
    repo.branch("feature", root);

    repo.commit_on_branch("base", "base moves on", &[("base_only.txt", "base\n")]);
    repo.commit_on_branch("feature", "add queue", &[("queue.rs", "pub struct Queue;\n")]);

    let changes = GitChangeSource::new(repo.path())
        .resolve(&ChangeSetMode::BranchDiff {
            base: Some("base".to_string()),
            head: Some("feature".to_string()),
        })
        .await
        .expect("Failed to resolve branch diff");

    assert_eq!(changes.file_paths, vec!["queue.rs"]);
    assert!(!changes.diff_text.contains("base_only.txt"));
}

#[tokio::test]
async fn test_branch_diff_unknown_reference() {
    let repo = seeded_repo();

    let err = GitChangeSource::new(repo.path())
        .resolve(&ChangeSetMode::BranchDiff {
            base: Some("does-not-exist".to_string()),
            head: None,
        })
        .await
        .unwrap_err();

    match err {
        VcsError::OperationFailed(msg) => {
            assert!(msg.contains("Invalid git references: does-not-exist...HEAD"), "{}", msg)
        }
        other => panic!("Expected OperationFailed, got {:?}", other),
    }
}

// =============================================================================
// FAILURES
// =============================================================================

#[tokio::test]
async fn test_outside_repository() {
    let dir = temp_test_dir();

    let err = GitChangeSource::new(dir.path())
        .resolve(&ChangeSetMode::Staged)
        .await
        .unwrap_err();

    assert!(matches!(err, VcsError::NotARepository));
}

#[tokio::test]
async fn test_all_uncommitted_without_commits() {
    let repo = TestRepo::new();
    repo.stage_file("first.rs", "fn first() {}\n");

    let err = GitChangeSource::new(repo.path())
        .resolve(&ChangeSetMode::AllUncommitted)
        .await
        .unwrap_err();

    match err {
        VcsError::OperationFailed(msg) => assert!(msg.contains("no commits yet"), "{}", msg),
        other => panic!("Expected OperationFailed, got {:?}", other),
    }
}
