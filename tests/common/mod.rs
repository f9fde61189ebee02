//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use git2::{BranchType, Oid, Repository, Signature};

/// Create a temporary directory for test output.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temp directory")
}

/// A throwaway git repository built with git2 and queried by the `git` CLI.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a new empty git repository in a temp directory.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Get the test signature for commits.
    fn signature(&self) -> Signature<'_> {
        Signature::now("Test User", "test@example.com").expect("Failed to create signature")
    }

    /// Write a file in the working tree without staging it.
    pub fn write_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directory");
        }
        std::fs::write(&path, content).expect("Failed to write test file");
        path
    }

    /// Write a file and add it to the index.
    pub fn stage_file(&self, rel: &str, content: &str) {
        self.write_file(rel, content);
        let mut index = self.repo.index().expect("Failed to get index");
        index.add_path(Path::new(rel)).expect("Failed to add file");
        index.write().expect("Failed to write index");
    }

    /// Stage `files` and commit them on HEAD. Returns the commit OID.
    pub fn commit_files(&self, message: &str, files: &[(&str, &str)]) -> Oid {
        for (rel, content) in files {
            self.stage_file(rel, content);
        }

        let sig = self.signature();
        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        // Get parent commit if exists
        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Create a branch pointing to the given OID.
    pub fn branch(&self, name: &str, oid: Oid) {
        let commit = self.repo.find_commit(oid).expect("Failed to find commit");
        self.repo
            .branch(name, &commit, false)
            .expect("Failed to create branch");
    }

    /// Commit top-level `files` onto `branch` without touching HEAD, the
    /// index or the working tree.
    pub fn commit_on_branch(&self, branch: &str, message: &str, files: &[(&str, &str)]) -> Oid {
        let parent = self
            .repo
            .find_branch(branch, BranchType::Local)
            .expect("Failed to find branch")
            .get()
            .peel_to_commit()
            .expect("Branch does not point at a commit");

        let parent_tree = parent.tree().expect("Failed to read parent tree");
        let mut builder = self
            .repo
            .treebuilder(Some(&parent_tree))
            .expect("Failed to create tree builder");
        for (name, content) in files {
            let blob = self.repo.blob(content.as_bytes()).expect("Failed to write blob");
            builder
                .insert(name, blob, 0o100644)
                .expect("Failed to insert tree entry");
        }
        let tree_id = builder.write().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");

        let sig = self.signature();
        let refname = format!("refs/heads/{}", branch);
        self.repo
            .commit(Some(&refname), &sig, &sig, message, &tree, &[&parent])
            .expect("Failed to create commit")
    }
}
