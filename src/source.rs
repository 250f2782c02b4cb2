// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository sources.
//!
//! A __repository source__ enumerates every repository below a source
//! directory and hands back a flat listing of [`Repository`] records. The
//! enumeration itself is a small shell script that prints the path to each
//! `.git` directory terminated by a NUL byte. The same script runs either on
//! the local machine through `sh`, or on a remote machine through `ssh`.
//!
//! Exactly one external process is spawned per listing. Failures are never
//! retried, and a listing either succeeds as a whole or not at all.

use crate::repo::{name_and_working_dir, source_root_depth, Repository};

use std::{
    ffi::OsStr,
    process::{Command, ExitStatus},
};
use tracing::{debug, instrument};

/// Enumeration script shared by local and remote sources.
pub const LIST_REPOS_SH: &str = include_str!("list-repos.sh");

/// Layer of indirection for repository enumeration.
pub trait RepoSource {
    /// List every repository this source knows about.
    fn list(&self) -> Result<Vec<Repository>>;
}

/// Repositories on the local machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSource {
    source_dir: String,
}

impl LocalSource {
    /// Construct new local source rooted at target source directory.
    pub fn new(source_dir: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
        }
    }
}

impl RepoSource for LocalSource {
    #[instrument(skip(self), level = "debug")]
    fn list(&self) -> Result<Vec<Repository>> {
        debug!("list local repositories under {:?}", self.source_dir);
        let output = syscall_output(
            "sh",
            ["-c", LIST_REPOS_SH, "forge", self.source_dir.as_str()],
        )?;

        Ok(parse_listing(&output, |name, working_dir| {
            Repository::local(name, working_dir)
        }))
    }
}

/// Repositories on a remote machine reachable through SSH.
///
/// The source directory is interpreted on the remote machine. Without one,
/// the remote user's own `~/src` is listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshSource {
    host: String,
    source_dir: Option<String>,
}

impl SshSource {
    /// Construct new SSH source for target host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            source_dir: None,
        }
    }

    /// List below target source directory instead of the remote default.
    ///
    /// A leading `~` is expanded against the remote user's home directory.
    pub fn with_source_dir(mut self, source_dir: impl Into<String>) -> Self {
        self.source_dir = Some(source_dir.into());
        self
    }

    /// Remote command line handed to `ssh`.
    ///
    /// SSH joins its arguments into a single string that the remote login
    /// shell parses again, so every word is quoted up front.
    pub fn remote_command(&self) -> String {
        let mut words = vec!["sh", "-c", LIST_REPOS_SH, "forge"];
        words.extend(self.source_dir.as_deref());
        shell_words::join(words)
    }
}

impl RepoSource for SshSource {
    #[instrument(skip(self), fields(host = %self.host), level = "debug")]
    fn list(&self) -> Result<Vec<Repository>> {
        debug!("list repositories on {} under {:?}", self.host, self.source_dir);
        let output = syscall_output("ssh", [self.host.clone(), self.remote_command()])?;

        Ok(parse_listing(&output, |name, working_dir| {
            Repository::remote(name, self.host.as_str(), working_dir)
        }))
    }
}

/// Decode output of the listing script into repository records.
///
/// The first NUL-terminated record is the source directory the script
/// scanned, and determines how many leading components are dropped from each
/// following `.git` path to name it. Empty entries are skipped, so a trailing
/// NUL byte is harmless. Entries that do not reach deeper than the source
/// directory are skipped as well.
pub fn parse_listing<F>(output: &str, mut make: F) -> Vec<Repository>
where
    F: FnMut(String, String) -> Repository,
{
    let mut entries = output.split('\0');
    let Some(root) = entries.next().filter(|root| !root.is_empty()) else {
        return Vec::new();
    };
    let depth = source_root_depth(root);

    entries
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| name_and_working_dir(entry, depth))
        .map(|(name, working_dir)| make(name, working_dir))
        .collect()
}

fn syscall_output(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let program = cmd.as_ref().to_string_lossy().into_owned();
    let output = Command::new(cmd.as_ref())
        .args(args)
        .output()
        .map_err(|err| SourceError::Spawn {
            source: err,
            program: program.clone(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(SourceError::Exit {
            program,
            status: output.status,
            stderr: stderr.trim_end().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Repository source error types.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Listing process could not be started.
    #[error("failed to run {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// Listing process exited unsuccessfully.
    #[error("{program:?} failed ({status}): {stderr}")]
    Exit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// Friendly result alias :3
pub type Result<T, E = SourceError> = std::result::Result<T, E>;
