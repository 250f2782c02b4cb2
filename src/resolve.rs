// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Resolve arguments into repository targets.
//!
//! An argument is either the name of a configured alias, or follows the
//! `[[forge/]user/]repo[@remote]` grammar of [`ParsedArg`]. Either way every
//! unset component falls back through a fixed chain of defaults:
//!
//! | Component | Fallback order                                        |
//! |-----------|-------------------------------------------------------|
//! | forge     | argument or alias, config `forge`, `github.com`       |
//! | user      | argument or alias, config `user`, current OS user     |
//! | hostname  | remote config `hostname`, remote name                 |
//! | sourceDir | remote config `sourceDir`, config `sourceDir`, `~/src`|
//!
//! The repository directory is `<sourceDir>/<forge>/<user>/<repo>` unless an
//! alias names one explicitly, or a wildcard user was resolved by scanning
//! the source directory.

use crate::{
    config::Config,
    disambiguate::{find_owner, DisambiguateError, WILDCARD_USER},
    parse::{ParseError, ParsedArg},
    path::{current_user_name, NoUserName},
    repo::{Repository, FOLDER_URI_FLAG, REMOTE_FOLDER_SCHEME},
};

use std::path::PathBuf;
use tracing::{debug, instrument};

/// Forge assumed when neither argument nor configuration names one.
pub const DEFAULT_FORGE: &str = "github.com";

/// Pick the first candidate that is set and not empty.
///
/// Candidates are ordered from most to least specific.
pub fn first_non_empty<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Option<&'a str> {
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| !candidate.is_empty())
}

/// Fully resolved repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub forge: String,
    pub user: String,
    pub repo: String,

    /// Name of remote machine holding the repository, if any.
    pub remote: Option<String>,

    /// SSH host name of the remote machine, if any.
    pub hostname: Option<String>,

    /// Directory holding the repository, on the remote machine if any.
    pub repo_dir: PathBuf,
}

impl Target {
    /// Check if target lives on a remote machine.
    pub fn is_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// URL to clone from.
    ///
    /// Repositories owned by the configured user are cloned over SSH so they
    /// can be pushed to. Everything else is cloned over HTTPS.
    pub fn git_url(&self, config: &Config) -> String {
        if config.user.as_deref() == Some(self.user.as_str()) {
            format!("git@{}:{}/{}.git", self.forge, self.user, self.repo)
        } else {
            format!("https://{}/{}/{}.git", self.forge, self.user, self.repo)
        }
    }

    /// Home page of repository on its forge.
    pub fn url(&self) -> String {
        format!("https://{}/{}/{}", self.forge, self.user, self.repo)
    }

    /// Package documentation page of repository.
    pub fn doc_url(&self) -> String {
        format!("https://pkg.go.dev/{}/{}/{}", self.forge, self.user, self.repo)
    }

    /// Editor arguments to open this repository.
    pub fn open_args(&self) -> Vec<String> {
        let repo_dir = self.repo_dir.to_string_lossy().into_owned();
        match &self.hostname {
            Some(hostname) if self.is_remote() => vec![
                FOLDER_URI_FLAG.into(),
                format!("{REMOTE_FOLDER_SCHEME}{hostname}{repo_dir}"),
            ],
            _ => vec![repo_dir],
        }
    }
}

/// Resolve arguments against a configuration.
#[derive(Debug, Clone)]
pub struct Resolver<'cfg> {
    config: &'cfg Config,
    current_user: Option<String>,
}

impl<'cfg> Resolver<'cfg> {
    /// Construct new resolver that falls back to the user running this
    /// process.
    pub fn new(config: &'cfg Config) -> Self {
        Self {
            config,
            current_user: current_user_name().ok(),
        }
    }

    /// Construct new resolver that falls back to target user.
    pub fn with_current_user(config: &'cfg Config, user: impl Into<String>) -> Self {
        Self {
            config,
            current_user: Some(user.into()),
        }
    }

    /// Resolve argument into a repository target.
    ///
    /// # Errors
    ///
    /// - Return [`ResolveError::Parse`] if argument is neither an alias nor
    ///   valid grammar.
    /// - Return [`ResolveError::NoUserName`] if no user can be determined.
    /// - Return [`ResolveError::Disambiguate`] if a wildcard user cannot be
    ///   resolved to exactly one user.
    #[instrument(skip(self), level = "debug")]
    pub fn resolve(&self, arg: &str) -> Result<Target> {
        let (parsed, explicit_repo_dir) = match self.config.aliases.get(arg) {
            Some(alias) => {
                debug!("{arg:?} is an alias");
                let parsed = ParsedArg {
                    forge: alias.forge.clone(),
                    user: alias.user.clone(),
                    repo: first_non_empty([alias.repo.as_deref(), Some(arg)])
                        .unwrap_or(arg)
                        .to_string(),
                    remote: alias.remote.clone(),
                };
                (parsed, alias.repo_dir.as_deref().filter(|dir| !dir.is_empty()))
            }
            None => (arg.parse::<ParsedArg>()?, None),
        };

        let forge = first_non_empty([
            parsed.forge.as_deref(),
            self.config.forge.as_deref(),
            Some(DEFAULT_FORGE),
        ])
        .unwrap_or(DEFAULT_FORGE)
        .to_string();

        let user = first_non_empty([
            parsed.user.as_deref(),
            self.config.user.as_deref(),
            self.current_user.as_deref(),
        ])
        .ok_or(NoUserName)?
        .to_string();

        let remote = parsed.remote.filter(|remote| !remote.is_empty());
        let remote_config = remote
            .as_deref()
            .and_then(|remote| self.config.remotes.get(remote));
        let hostname = remote.as_deref().map(|remote| {
            first_non_empty([
                remote_config.and_then(|config| config.hostname.as_deref()),
                Some(remote),
            ])
            .unwrap_or(remote)
            .to_string()
        });
        let source_dir = remote_config
            .and_then(|config| config.source_dir.clone())
            .filter(|dir| !dir.is_empty())
            .unwrap_or_else(|| self.config.source_dir());

        let mut target = Target {
            forge,
            user,
            repo: parsed.repo,
            remote,
            hostname,
            repo_dir: PathBuf::new(),
        };

        if let Some(repo_dir) = explicit_repo_dir {
            target.repo_dir = PathBuf::from(repo_dir);
        } else if !target.is_remote() && target.user == WILDCARD_USER && !target.repo.is_empty() {
            let owner = find_owner(&source_dir, &target.forge, &target.repo)?;
            debug!("wildcard user resolved to {:?}", owner.user);
            target.user = owner.user;
            target.repo_dir = owner.repo_dir;
        } else {
            target.repo_dir = PathBuf::from(&source_dir)
                .join(&target.forge)
                .join(&target.user)
                .join(&target.repo);
        }

        Ok(target)
    }
}

/// Demand exactly one candidate out of a listing lookup.
///
/// # Errors
///
/// - Return [`ResolveError::NoMatch`] if there are no candidates.
/// - Return [`ResolveError::Ambiguous`] if there are several candidates.
pub fn exactly_one(query: &str, mut candidates: Vec<Repository>) -> Result<Repository> {
    match candidates.len() {
        0 => Err(ResolveError::NoMatch(query.into())),
        1 => Ok(candidates.remove(0)),
        _ => Err(ResolveError::Ambiguous {
            query: query.into(),
            candidates: candidates.into_iter().map(|repo| repo.to_string()).collect(),
        }),
    }
}

/// Argument resolution error types.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// Argument is neither an alias nor valid grammar.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// No user given, configured, or known to the OS.
    #[error(transparent)]
    NoUserName(#[from] NoUserName),

    /// Wildcard user cannot be resolved.
    #[error(transparent)]
    Disambiguate(#[from] DisambiguateError),

    /// Lookup matched no repository.
    #[error("{0}: no repository found")]
    NoMatch(String),

    /// Lookup matched several repositories.
    #[error("{query}: multiple repositories found: {}", candidates.join(", "))]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },
}

/// Friendly result alias :3
pub type Result<T, E = ResolveError> = std::result::Result<T, E>;
