// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Listing cache.
//!
//! Listings are expensive: a local listing walks the source directory, and a
//! remote listing round-trips through SSH. The [`ListingCache`] fetches each
//! listing lazily on first use, and at most once for its own lifetime. One
//! cache is meant to serve one resolution session, i.e., one invocation of the
//! tool, after which it is dropped along with every listing it holds.
//!
//! # Addressing
//!
//! A query of the form `host:pattern` is matched against the listing of SSH
//! host `host`. Any other query is matched against the local listing.

use crate::{
    config::Config,
    matcher::MatchStrategy,
    repo::Repository,
    source::{LocalSource, RepoSource, SourceError, SshSource},
};

use std::collections::HashMap;
use tracing::{debug, instrument};

/// Hand out repository sources for the local machine and for SSH hosts.
pub trait Sources {
    /// Source of local repositories.
    fn local(&self) -> Box<dyn RepoSource + '_>;

    /// Source of repositories on target SSH host.
    fn remote(&self, host: &str) -> Box<dyn RepoSource + '_>;
}

/// Sources backed by the listing script, configured through [`Config`].
#[derive(Debug, Clone)]
pub struct ScriptSources {
    config: Config,
}

impl ScriptSources {
    /// Construct new script sources.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Source of local repositories below the configured source directory.
    pub fn local_source(&self) -> LocalSource {
        LocalSource::new(self.config.source_dir())
    }

    /// Source of repositories on target SSH host.
    ///
    /// A host naming a configured remote is replaced by that remote's
    /// hostname. The remote is listed below its configured source directory,
    /// if any, or else below the remote user's own `~/src`. The local source
    /// directory never leaks to the remote side.
    pub fn remote_source(&self, host: &str) -> SshSource {
        let Some(remote) = self.config.remotes.get(host) else {
            return SshSource::new(host);
        };

        let hostname = remote
            .hostname
            .as_deref()
            .filter(|hostname| !hostname.is_empty())
            .unwrap_or(host);
        match remote.source_dir.as_deref().filter(|dir| !dir.is_empty()) {
            Some(source_dir) => SshSource::new(hostname).with_source_dir(source_dir),
            None => SshSource::new(hostname),
        }
    }
}

impl Sources for ScriptSources {
    fn local(&self) -> Box<dyn RepoSource + '_> {
        Box::new(self.local_source())
    }

    fn remote(&self, host: &str) -> Box<dyn RepoSource + '_> {
        Box::new(self.remote_source(host))
    }
}

/// Per-session cache of repository listings keyed by host.
pub struct ListingCache<S = ScriptSources>
where
    S: Sources,
{
    sources: S,
    local: Option<Vec<Repository>>,
    by_host: HashMap<String, Vec<Repository>>,
}

impl<S> ListingCache<S>
where
    S: Sources,
{
    /// Construct new empty cache.
    pub fn new(sources: S) -> Self {
        Self {
            sources,
            local: None,
            by_host: HashMap::new(),
        }
    }

    /// Listing of local repositories, fetched on first use.
    ///
    /// # Errors
    ///
    /// - Return [`SourceError`] if the listing cannot be fetched.
    pub fn local(&mut self) -> Result<&[Repository]> {
        if self.local.is_none() {
            debug!("fetch local listing");
            self.local = Some(self.sources.local().list()?);
        }

        Ok(self.local.as_deref().unwrap_or_default())
    }

    /// Listing of repositories on target host, fetched on first use.
    ///
    /// # Errors
    ///
    /// - Return [`SourceError`] if the listing cannot be fetched.
    pub fn remote(&mut self, host: &str) -> Result<&[Repository]> {
        if !self.by_host.contains_key(host) {
            debug!("fetch listing of {host}");
            let listing = self.sources.remote(host).list()?;
            self.by_host.insert(host.to_string(), listing);
        }

        Ok(self.by_host.get(host).map(Vec::as_slice).unwrap_or_default())
    }

    /// Find candidate repositories for a query with target strategy.
    ///
    /// A query of the form `host:pattern` is looked up on SSH host `host`.
    /// Zero or many candidates are not errors. Those are left to the caller.
    ///
    /// # Errors
    ///
    /// - Return [`SourceError`] if the listing cannot be fetched.
    #[instrument(skip(self, strategy), level = "debug")]
    pub fn find(&mut self, query: &str, strategy: &impl MatchStrategy) -> Result<Vec<Repository>> {
        let (listing, pattern) = match query.split_once(':') {
            Some((host, pattern)) => (self.remote(host)?, pattern),
            None => (self.local()?, query),
        };

        let candidates = strategy.candidates(pattern, listing);
        debug!("{} candidates for {pattern:?}", candidates.len());
        Ok(candidates)
    }
}

/// Friendly result alias :3
type Result<T, E = SourceError> = std::result::Result<T, E>;
