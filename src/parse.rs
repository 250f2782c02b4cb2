// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository argument grammar.
//!
//! ```text
//! arg := (forge "/")? (user "/")? repo ("@" remote)?
//! ```
//!
//! Segments are assigned from the end: one segment is a repo, two are
//! `user/repo`, and three are `forge/user/repo`. Segments never contain `/`.
//! The repo never contains `@`, so the first `@` of the last segment starts
//! the remote. Forge, user, and remote may contain `@` themselves.

use std::str::FromStr;

/// Components of a repository argument.
///
/// Components absent from the argument are `None`, never empty strings.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedArg {
    pub forge: Option<String>,
    pub user: Option<String>,
    pub repo: String,
    pub remote: Option<String>,
}

impl FromStr for ParsedArg {
    type Err = ParseError;

    fn from_str(arg: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidArgument(arg.to_string());

        let mut segments = arg.rsplit('/');
        let last = segments.next().unwrap_or_default();
        let user = segments.next();
        let forge = segments.next();

        if segments.next().is_some() {
            return Err(invalid());
        }

        // INVARIANT: Only the last segment can carry a remote, split at its first `@`.
        let (repo, remote) = match last.split_once('@') {
            Some((repo, remote)) => (repo, Some(remote)),
            None => (last, None),
        };

        if [Some(repo), user, forge, remote]
            .into_iter()
            .flatten()
            .any(str::is_empty)
        {
            return Err(invalid());
        }

        Ok(Self {
            forge: forge.map(Into::into),
            user: user.map(Into::into),
            repo: repo.into(),
            remote: remote.map(Into::into),
        })
    }
}

/// Argument parsing error types.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Argument does not follow `[[forge/]user/]repo[@remote]`.
    #[error("{0}: invalid argument")]
    InvalidArgument(String),
}
