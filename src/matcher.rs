// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Repository matching strategies.
//!
//! Turn a user pattern into candidate repositories from a listing. Two
//! strategies are available, and they are kept apart:
//!
//! - [`SuffixMatch`] keeps every repository whose trailing name components
//!   equal the pattern's components. Results are sorted by name, so ambiguity
//!   stays visible to the caller.
//! - [`FuzzyMatch`] scores every repository name against the pattern as a
//!   subsequence and keeps only the single best one.
//!
//! Neither strategy mutates the listing it is handed.

use crate::repo::Repository;

use nucleo_matcher::{
    pattern::{AtomKind, CaseMatching, Normalization, Pattern},
    Config, Matcher, Utf32String,
};

/// Way to select candidate repositories for a pattern.
pub trait MatchStrategy {
    /// Select candidates for pattern out of listing.
    fn candidates(&self, pattern: &str, listing: &[Repository]) -> Vec<Repository>;
}

/// Match repositories whose trailing name components equal the pattern.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuffixMatch;

impl MatchStrategy for SuffixMatch {
    fn candidates(&self, pattern: &str, listing: &[Repository]) -> Vec<Repository> {
        find_repos(listing, pattern)
    }
}

/// Match the single repository whose name best fits the pattern.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyMatch;

impl MatchStrategy for FuzzyMatch {
    fn candidates(&self, pattern: &str, listing: &[Repository]) -> Vec<Repository> {
        find_repo(listing, pattern).into_iter().collect()
    }
}

/// Strategy selected by name, e.g., from a command line flag.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    #[default]
    Suffix,
    Fuzzy,
}

impl MatchStrategy for Strategy {
    fn candidates(&self, pattern: &str, listing: &[Repository]) -> Vec<Repository> {
        match self {
            Self::Suffix => SuffixMatch.candidates(pattern, listing),
            Self::Fuzzy => FuzzyMatch.candidates(pattern, listing),
        }
    }
}

/// Find all repositories whose name ends with the pattern's components.
///
/// Both name and pattern are split on `/`. A repository matches if and only
/// if it has at least as many components as the pattern, and its trailing
/// components equal the pattern's components in order. An empty pattern
/// matches everything.
///
/// Results are sorted by name in ascending order.
pub fn find_repos(listing: &[Repository], pattern: &str) -> Vec<Repository> {
    let mut matches = if pattern.is_empty() {
        listing.to_vec()
    } else {
        let wanted = pattern.split('/').collect::<Vec<_>>();
        listing
            .iter()
            .filter(|repo| ends_with_components(&repo.name, &wanted))
            .cloned()
            .collect::<Vec<_>>()
    };

    matches.sort_by(|a, b| a.name.cmp(&b.name));
    matches
}

fn ends_with_components(name: &str, wanted: &[&str]) -> bool {
    let components = name.split('/').collect::<Vec<_>>();
    if components.len() < wanted.len() {
        return false;
    }

    components[components.len() - wanted.len()..] == *wanted
}

/// Find the single repository whose name best fits the pattern.
///
/// Pattern characters must appear in the name in order. Compact and
/// contiguous occurrences score higher. Among equal top scores the earliest
/// repository in the listing wins.
///
/// Returns `None` for an empty pattern, or if no name contains the pattern as
/// a subsequence.
pub fn find_repo(listing: &[Repository], pattern: &str) -> Option<Repository> {
    if pattern.trim().is_empty() {
        return None;
    }

    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::new(
        pattern,
        CaseMatching::Smart,
        Normalization::Smart,
        AtomKind::Fuzzy,
    );

    let mut best: Option<(u32, &Repository)> = None;
    for repo in listing {
        let haystack = Utf32String::from(repo.name.as_str());
        let Some(score) = pattern.score(haystack.slice(..), &mut matcher) else {
            continue;
        };

        // INVARIANT: Strictly greater keeps first-seen on ties.
        if best.is_none_or(|(top, _)| score > top) {
            best = Some((score, repo));
        }
    }

    best.map(|(_, repo)| repo.clone())
}
