//! Destination document schema.
//!
//! One [`Document`] is produced per catalog file. It embeds the owning
//! repository and every recorded revision of the file, oldest first.

use serde::{Deserialize, Serialize};

use crate::compiler::extract_compiler_version;
use crate::source::{FileRow, RepositoryRow, VersionRow};

/// Language tag written on every document.
pub const LANGUAGE: &str = "Solidity";

/// A file and its history as stored in the destination collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// File name.
    pub name: String,
    /// Path inside the repository.
    pub path: String,
    /// Content hash of the file.
    pub sha: String,
    /// Always [`LANGUAGE`].
    pub language: String,
    /// License key of the repository, empty when unchecked.
    pub license: String,
    /// Owning repository.
    pub repo: RepoInfo,
    /// Revisions, oldest first.
    pub versions: Vec<VersionEntry>,
}

/// Repository fields embedded in each document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    /// Repository identifier; half of the deduplication key.
    pub repo_id: i64,
    /// Full name, e.g. "owner/project".
    pub full_name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// Repository URL.
    pub url: Option<String>,
    /// Identifier of the owning account.
    pub owner_id: Option<i64>,
}

/// One revision of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Zero-based position in creation order.
    pub version_id: u32,
    /// Content hash of the revision.
    pub sha: String,
    /// Commit message.
    pub message: String,
    /// Size in bytes.
    pub size: i64,
    /// Creation timestamp.
    pub created: String,
    /// Version from the first `pragma solidity` line, if any.
    pub compiler_version: Option<String>,
    /// Raw source text.
    pub content: String,
    /// Parent commit reference(s).
    pub parents: String,
}

impl From<&RepositoryRow> for RepoInfo {
    fn from(repo: &RepositoryRow) -> Self {
        Self {
            repo_id: repo.id,
            full_name: repo.full_name.clone(),
            description: repo.description.clone(),
            url: repo.url.clone(),
            owner_id: repo.owner_id,
        }
    }
}

impl Document {
    /// Builds the document for `file`.
    ///
    /// `versions` must already be in creation order; `version_id` is the
    /// position in that slice. An empty slice still yields a document, which
    /// callers must not persist.
    pub fn build(
        repo: &RepositoryRow,
        file: &FileRow,
        versions: &[VersionRow],
        license: &str,
    ) -> Self {
        let versions = versions
            .iter()
            .zip(0u32..)
            .map(|(version, version_id)| VersionEntry {
                version_id,
                sha: version.sha.clone(),
                message: version.message.clone(),
                size: version.size,
                created: version.created.clone(),
                compiler_version: extract_compiler_version(&version.content),
                content: version.content.clone(),
                parents: version.parents.clone(),
            })
            .collect();

        Self {
            name: file.name.clone(),
            path: file.path.clone(),
            sha: file.sha.clone(),
            language: LANGUAGE.to_string(),
            license: license.to_string(),
            repo: RepoInfo::from(repo),
            versions,
        }
    }

    /// Returns true if the document has no revisions and must be skipped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Deduplication key: (repository id, file sha).
    #[must_use]
    pub fn key(&self) -> (i64, &str) {
        (self.repo.repo_id, &self.sha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> RepositoryRow {
        RepositoryRow {
            id: 1,
            full_name: "acme/coin".to_string(),
            description: Some("ERC20 token".to_string()),
            url: Some("https://github.com/acme/coin".to_string()),
            owner_id: Some(42),
        }
    }

    fn file() -> FileRow {
        FileRow {
            id: 10,
            name: "Token.sol".to_string(),
            path: "contracts/Token.sol".to_string(),
            sha: "abc123".to_string(),
        }
    }

    fn version(sha: &str, created: &str, content: &str) -> VersionRow {
        VersionRow {
            sha: sha.to_string(),
            message: format!("commit {sha}"),
            size: content.len() as i64,
            created: created.to_string(),
            content: content.to_string(),
            parents: String::new(),
        }
    }

    #[test]
    fn test_build_populates_schema() {
        let versions = vec![
            version("v1", "2021-01-01", "pragma solidity ^0.6.12;"),
            version("v2", "2021-02-01", "pragma solidity ^0.8.10;"),
            version("v3", "2021-03-01", "contract Empty {}"),
        ];

        let doc = Document::build(&repo(), &file(), &versions, "mit");

        assert_eq!(doc.name, "Token.sol");
        assert_eq!(doc.path, "contracts/Token.sol");
        assert_eq!(doc.sha, "abc123");
        assert_eq!(doc.language, "Solidity");
        assert_eq!(doc.license, "mit");
        assert_eq!(doc.repo.repo_id, 1);
        assert_eq!(doc.repo.owner_id, Some(42));
        assert_eq!(doc.key(), (1, "abc123"));

        let ids: Vec<u32> = doc.versions.iter().map(|v| v.version_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(doc.versions[0].sha, "v1");
        assert_eq!(doc.versions[0].compiler_version.as_deref(), Some("0.6.12"));
        assert_eq!(doc.versions[1].compiler_version.as_deref(), Some("0.8.10"));
        assert_eq!(doc.versions[2].compiler_version, None);
    }

    #[test]
    fn test_build_without_versions() {
        let doc = Document::build(&repo(), &file(), &[], "");
        assert!(doc.is_empty());
        assert_eq!(doc.license, "");
    }

    #[test]
    fn test_serialized_shape() {
        let versions = vec![version("v1", "2021-01-01", "pragma solidity 0.4.24;")];
        let doc = Document::build(&repo(), &file(), &versions, "");
        let json = serde_json::to_value(&doc).unwrap();

        assert_eq!(json["language"], "Solidity");
        assert_eq!(json["repo"]["repo_id"], 1);
        assert_eq!(json["repo"]["full_name"], "acme/coin");
        assert_eq!(json["versions"][0]["version_id"], 0);
        assert_eq!(json["versions"][0]["compiler_version"], "0.4.24");
        assert!(json["versions"][0].get("parents").is_some());
    }
}
