// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository listing records.
//!
//! A listing is a flat collection of [`Repository`] records produced by a
//! [`RepoSource`](crate::source::RepoSource). Every record is named after the
//! trailing `forge/user/repo` components of the directory that holds it, e.g.,
//! `~/src/github.com/twpayne/forge` is named `github.com/twpayne/forge`.
//!
//! Records are built once per listing and never mutated afterwards.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// URI scheme used to point an editor at a folder on an SSH host.
pub const REMOTE_FOLDER_SCHEME: &str = "vscode-remote://ssh-remote+";

/// Editor flag that precedes a remote folder URI.
pub const FOLDER_URI_FLAG: &str = "--folder-uri";

/// A repository discovered on the local machine or on an SSH host.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Canonical `forge/user/repo` name.
    pub name: String,

    /// SSH host the repository was listed from. Empty for local repositories.
    pub host: String,

    /// Absolute path of the checkout on the host it was listed from.
    pub working_dir: String,

    /// Arguments handed to the editor to open this repository.
    pub open_args: Vec<String>,
}

impl Repository {
    /// Construct record for a repository on the local machine.
    pub fn local(name: impl Into<String>, working_dir: impl Into<String>) -> Self {
        let working_dir = working_dir.into();
        Self {
            name: name.into(),
            host: String::new(),
            open_args: vec![working_dir.clone()],
            working_dir,
        }
    }

    /// Construct record for a repository living on an SSH host.
    ///
    /// The editor is told to open a remote folder URI built from the host and
    /// the working directory instead of a bare path.
    pub fn remote(
        name: impl Into<String>,
        host: impl Into<String>,
        working_dir: impl Into<String>,
    ) -> Self {
        let host = host.into();
        let working_dir = working_dir.into();
        Self {
            name: name.into(),
            open_args: vec![
                FOLDER_URI_FLAG.into(),
                format!("{REMOTE_FOLDER_SCHEME}{host}{working_dir}"),
            ],
            host,
            working_dir,
        }
    }

    /// Check if repository was listed from the local machine.
    pub fn is_local(&self) -> bool {
        self.host.is_empty()
    }

    /// Where the checkout lives, as printed by listings.
    ///
    /// Remote checkouts are prefixed with their host, e.g.,
    /// `devbox:/src/github.com/twpayne/forge`.
    pub fn location(&self) -> String {
        if self.is_local() {
            self.working_dir.clone()
        } else {
            format!("{}:{}", self.host, self.working_dir)
        }
    }

    /// Home page of repository on its forge.
    pub fn url(&self) -> String {
        format!("https://{}", self.name)
    }

    /// Package documentation page of repository.
    pub fn doc_url(&self) -> String {
        format!("https://pkg.go.dev/{}", self.name)
    }
}

impl Display for Repository {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        if self.is_local() {
            fmt.write_str(&self.name)
        } else {
            write!(fmt, "{}:{}", self.host, self.name)
        }
    }
}

/// Derive repository name and working directory from path to a `.git`
/// directory.
///
/// Strips a trailing empty component and a trailing `.git` component. The
/// name drops the first `depth` slash-separated components, while the working
/// directory keeps every remaining component.
///
/// Returns `None` if nothing is left of the name after dropping `depth`
/// components.
pub fn name_and_working_dir(git_dir: &str, depth: usize) -> Option<(String, String)> {
    let mut components = git_dir.split('/').collect::<Vec<_>>();
    if components.last() == Some(&"") {
        components.pop();
    }
    if components.last() == Some(&".git") {
        components.pop();
    }

    if components.len() <= depth {
        return None;
    }

    let name = components[depth..].join("/");
    let working_dir = components.join("/");
    Some((name, working_dir))
}

/// Number of slash-separated components in a source directory.
///
/// This is the number of leading components to drop from a listed path to
/// obtain a repository name.
pub fn source_root_depth(source_dir: &str) -> usize {
    let trimmed = source_dir.trim_end_matches('/');
    if trimmed.is_empty() {
        // Source directory is the file system root.
        return 1;
    }

    trimmed.split('/').count()
}
