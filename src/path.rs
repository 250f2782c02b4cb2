// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Path resolution utilities.
//!
//! Determine relevent path and identity information about the current user
//! that configuration defaults are derived from.

use std::{env, path::PathBuf};

/// Default source directory, relative to the user's home directory.
pub const DEFAULT_SOURCE_DIR: &str = "~/src";

/// Determine absolute path to user's home directory.
///
/// Does not check if the path returned actually exists.
///
/// # Errors
///
/// - Return [`NoWayHome`] if home directory path cannot be determined.
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(NoWayHome)
}

/// Determine default source directory.
///
/// Expands `~/src` to an absolute path. Leaves the tilde in place if the
/// home directory cannot be determined.
pub fn default_source_dir() -> String {
    shellexpand::tilde(DEFAULT_SOURCE_DIR).into_owned()
}

/// Determine directories to search for configuration files, most important
/// first.
///
/// Follows the XDG Base Directory specification: `$XDG_CONFIG_HOME`, or
/// `~/.config` if unset, followed by each entry of `$XDG_CONFIG_DIRS`, or
/// `/etc/xdg` if unset. Does not check if any path returned actually exists.
///
/// # See Also
///
/// - [XDG Base Directory](https://specifications.freedesktop.org/basedir-spec/latest/)
pub fn config_search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    match non_empty_var("XDG_CONFIG_HOME") {
        Some(config_home) => dirs.push(PathBuf::from(config_home)),
        None => {
            if let Ok(home) = home_dir() {
                dirs.push(home.join(".config"));
            }
        }
    }

    let config_dirs = non_empty_var("XDG_CONFIG_DIRS").unwrap_or_else(|| "/etc/xdg".into());
    dirs.extend(
        config_dirs
            .split(':')
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from),
    );

    dirs
}

/// Determine name of user running this process.
///
/// The account database entry of the real user ID wins. `$USER` and then
/// `$LOGNAME` are consulted only if the account cannot be looked up.
///
/// # Errors
///
/// - Return [`NoUserName`] if no name can be determined at all.
pub fn current_user_name() -> Result<String, NoUserName> {
    user_name_or_env(account_user_name())
}

#[cfg(unix)]
fn account_user_name() -> Option<String> {
    use nix::unistd::{Uid, User};

    User::from_uid(Uid::current())
        .ok()
        .flatten()
        .map(|user| user.name)
        .filter(|name| !name.is_empty())
}

#[cfg(not(unix))]
fn account_user_name() -> Option<String> {
    None
}

fn user_name_or_env(account: Option<String>) -> Result<String, NoUserName> {
    account
        .or_else(|| non_empty_var("USER"))
        .or_else(|| non_empty_var("LOGNAME"))
        .ok_or(NoUserName)
}

/// Determine login shell of user running this process.
///
/// Falls back to `/bin/sh` if `$SHELL` is unset.
pub fn current_user_shell() -> String {
    non_empty_var("SHELL").unwrap_or_else(|| "/bin/sh".into())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

/// No way to determine user's home directory.
///
/// # See Also
///
/// - [`dirs::home_dir`](https://docs.rs/dirs/latest/dirs/fn.home_dir.html)
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine absolute path to user's home directory")]
pub struct NoWayHome;

/// No way to determine name of current user.
#[derive(Clone, Debug, thiserror::Error)]
#[error("cannot determine name of current user")]
pub struct NoUserName;

/// Friendly result alias :3
pub type Result<T, E = NoWayHome> = std::result::Result<T, E>;
