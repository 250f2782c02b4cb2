// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Wildcard user resolution.
//!
//! Writing `_` in place of a user, e.g., `github.com/_/chezmoi`, asks for
//! whichever user owns a checkout of that repo under that forge. Every user
//! directory below `<source_dir>/<forge>` is checked for a `<repo>`
//! directory. Exactly one owner resolves the wildcard. None or several are
//! reported back, since guessing would open the wrong repository.
//!
//! Nothing is cached. The scan runs again on every call.

use std::{
    fs::{metadata, read_dir},
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tracing::{debug, instrument};

/// Placeholder user meaning "search every user".
pub const WILDCARD_USER: &str = "_";

/// Owner found for a wildcard user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    /// Name of the user directory holding the repository.
    pub user: String,

    /// Full path to the repository directory.
    pub repo_dir: PathBuf,
}

/// Find the single user under a forge that holds target repository.
///
/// # Errors
///
/// - Return [`DisambiguateError::ReadDir`] if the forge directory cannot be
///   read.
/// - Return [`DisambiguateError::Stat`] if a candidate cannot be inspected.
/// - Return [`DisambiguateError::NoUser`] if no user holds the repository.
/// - Return [`DisambiguateError::MultipleUsers`] if more than one does.
#[instrument(skip(source_dir), level = "debug")]
pub fn find_owner(source_dir: impl AsRef<Path>, forge: &str, repo: &str) -> Result<Owner> {
    let forge_dir = source_dir.as_ref().join(forge);
    let entries = read_dir(&forge_dir).map_err(|err| DisambiguateError::ReadDir {
        source: err,
        path: forge_dir.clone(),
    })?;

    let mut owners = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| DisambiguateError::ReadDir {
            source: err,
            path: forge_dir.clone(),
        })?;

        if !entry.file_type().is_ok_and(|kind| kind.is_dir()) {
            continue;
        }

        let user = entry.file_name().to_string_lossy().into_owned();
        if user == "." || user == ".." {
            continue;
        }

        let repo_dir = entry.path().join(repo);
        match metadata(&repo_dir) {
            Ok(info) if info.is_dir() => {
                debug!("candidate owner {user:?}");
                owners.push(Owner { user, repo_dir });
            }
            Ok(_) => continue,
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => {
                return Err(DisambiguateError::Stat {
                    source: err,
                    path: repo_dir,
                })
            }
        }
    }

    // INVARIANT: Report candidates in a stable order regardless of directory order.
    owners.sort_by(|a, b| a.user.cmp(&b.user));

    match owners.len() {
        0 => Err(DisambiguateError::NoUser {
            forge: forge.into(),
            repo: repo.into(),
        }),
        1 => Ok(owners.remove(0)),
        _ => Err(DisambiguateError::MultipleUsers {
            forge: forge.into(),
            repo: repo.into(),
            users: owners.into_iter().map(|owner| owner.user).collect(),
        }),
    }
}

/// Wildcard resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum DisambiguateError {
    /// Forge directory cannot be listed.
    #[error("failed to read directory {:?}", path.display())]
    ReadDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Candidate repository directory cannot be inspected.
    #[error("failed to inspect {:?}", path.display())]
    Stat {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// No user holds the repository.
    #[error("{forge}/_/{repo}: no user found")]
    NoUser { forge: String, repo: String },

    /// Several users hold the repository.
    #[error("{forge}/_/{repo}: multiple users found: {}", users.join(", "))]
    MultipleUsers {
        forge: String,
        repo: String,
        users: Vec<String>,
    },
}

/// Friendly result alias :3
pub type Result<T, E = DisambiguateError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::{
        env::current_dir,
        fs::{create_dir_all, write},
    };

    #[sealed_test]
    fn single_owner() -> anyhow::Result<()> {
        create_dir_all("src/github.com/alice/myrepo")?;
        create_dir_all("src/github.com/bob/other")?;

        let source_dir = current_dir()?.join("src");
        let owner = find_owner(&source_dir, "github.com", "myrepo")?;
        let expect = Owner {
            user: "alice".into(),
            repo_dir: source_dir.join("github.com/alice/myrepo"),
        };
        assert_eq!(owner, expect);

        Ok(())
    }

    #[sealed_test]
    fn several_owners() -> anyhow::Result<()> {
        create_dir_all("src/github.com/bob/myrepo")?;
        create_dir_all("src/github.com/alice/myrepo")?;

        let result = find_owner("src", "github.com", "myrepo");
        match result {
            Err(DisambiguateError::MultipleUsers { users, .. }) => {
                assert_eq!(users, vec!["alice", "bob"]);
            }
            other => panic!("expected multiple users, got {other:?}"),
        }

        let message = find_owner("src", "github.com", "myrepo")
            .unwrap_err()
            .to_string();
        assert_eq!(message, "github.com/_/myrepo: multiple users found: alice, bob");

        Ok(())
    }

    #[sealed_test]
    fn no_owner() -> anyhow::Result<()> {
        create_dir_all("src/github.com/alice/other")?;
        create_dir_all("src/github.com/bob")?;

        let result = find_owner("src", "github.com", "myrepo");
        assert!(matches!(result, Err(DisambiguateError::NoUser { .. })));

        Ok(())
    }

    #[sealed_test]
    fn ignore_files() -> anyhow::Result<()> {
        create_dir_all("src/github.com/alice/myrepo")?;
        create_dir_all("src/github.com/bob")?;
        write("src/github.com/bob/myrepo", "not a directory")?;
        write("src/github.com/README", "not a user")?;

        let owner = find_owner("src", "github.com", "myrepo")?;
        assert_eq!(owner.user, "alice");

        Ok(())
    }

    #[sealed_test]
    fn missing_forge_dir() {
        let result = find_owner("src", "github.com", "myrepo");
        assert!(matches!(result, Err(DisambiguateError::ReadDir { .. })));
    }
}
