// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Path constants and utilities for the vault data directory.

use std::path::{Path, PathBuf};

use crate::config::DEFAULT_DATA_DIR;

/// Storage path utilities for the vault data directory.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DEFAULT_DATA_DIR)
    }
}

/// Whether `segment` can be used as a single path component.
///
/// Collection and document ids come from requests; only ASCII
/// alphanumerics, `-` and `_` are accepted.
pub fn is_safe_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment.len() <= 128
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Key Database ==========

    /// redb file holding principal signing keys.
    pub fn keys_db(&self) -> PathBuf {
        self.root.join("keys.redb")
    }

    // ========== Collection Paths ==========

    pub fn collections_dir(&self) -> PathBuf {
        self.root.join("collections")
    }

    /// Collection definition file.
    pub fn collection(&self, collection_id: &str) -> PathBuf {
        self.collections_dir().join(format!("{collection_id}.json"))
    }

    // ========== Document Paths ==========

    pub fn documents_dir(&self) -> PathBuf {
        self.root.join("documents")
    }

    /// Directory holding one collection's documents.
    pub fn collection_documents_dir(&self, collection_id: &str) -> PathBuf {
        self.documents_dir().join(collection_id)
    }

    pub fn document(&self, collection_id: &str, document_id: &str) -> PathBuf {
        self.collection_documents_dir(collection_id)
            .join(format!("{document_id}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("/data"));
    }

    #[test]
    fn document_layout() {
        let paths = StoragePaths::new("/tmp/vault");
        assert_eq!(
            paths.collection("notes"),
            PathBuf::from("/tmp/vault/collections/notes.json")
        );
        assert_eq!(
            paths.document("notes", "abc"),
            PathBuf::from("/tmp/vault/documents/notes/abc.json")
        );
        assert_eq!(paths.keys_db(), PathBuf::from("/tmp/vault/keys.redb"));
    }

    #[test]
    fn unsafe_segments_are_rejected() {
        assert!(is_safe_segment("memory-vault-collection"));
        assert!(is_safe_segment("a1b2c3d4-e5f6-7890-abcd-ef1234567890"));
        assert!(!is_safe_segment(""));
        assert!(!is_safe_segment("../etc"));
        assert!(!is_safe_segment("a/b"));
        assert!(!is_safe_segment("note.json"));
    }
}
