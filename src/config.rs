// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Configuration layout.
//!
//! Specify the layout of the configuration file, and how to find it. The
//! configuration file lives at `forge/forge.toml` inside any XDG
//! configuration directory. The first one found wins.
//!
//! # General Layout
//!
//! ```toml
//! user = "twpayne"
//! editor = "code"
//! forge = "github.com"
//! sourceDir = "~/src"
//!
//! [remote.dev]
//! hostname = "dev.example.com"
//! sourceDir = "/srv/src"
//!
//! [alias.dotfiles]
//! repo = "dotfiles"
//! repoDir = "~/.local/share/chezmoi"
//! ```
//!
//! Every field is optional.

use crate::path::{config_search_dirs, default_source_dir};

use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Error as FmtError, Formatter, Result as FmtResult},
    fs::read_to_string,
    io::ErrorKind,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::{debug, info};

/// Editor used when the configuration does not name one.
pub const DEFAULT_EDITOR: &str = "code";

/// Location of configuration file relative to a configuration directory.
pub const CONFIG_FILE: &str = "forge/forge.toml";

/// Top-level configuration.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Forge user name of the person running the tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Editor to open repositories with.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,

    /// Forge to assume when none is given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forge: Option<String>,

    /// Root of the `forge/user/repo` directory layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,

    /// Named remote machines.
    #[serde(default, rename = "remote", skip_serializing_if = "BTreeMap::is_empty")]
    pub remotes: BTreeMap<String, RemoteConfig>,

    /// Named shortcuts to fixed repositories.
    #[serde(default, rename = "alias", skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: BTreeMap<String, AliasConfig>,
}

impl Config {
    /// Search XDG configuration directories for the configuration file.
    ///
    /// Falls back to the default configuration if no configuration file
    /// exists in any search directory.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if an existing file cannot be read.
    /// - Return [`ConfigError::Parse`] if an existing file is invalid.
    pub fn find_and_load() -> Result<Self> {
        Self::find_and_load_in(config_search_dirs())
    }

    /// Search target directories in order for the configuration file.
    ///
    /// # Errors
    ///
    /// - Return [`ConfigError::Read`] if an existing file cannot be read.
    /// - Return [`ConfigError::Parse`] if an existing file is invalid.
    pub fn find_and_load_in(dirs: impl IntoIterator<Item = impl AsRef<Path>>) -> Result<Self> {
        for dir in dirs {
            let path = dir.as_ref().join(CONFIG_FILE);
            match read_to_string(&path) {
                Ok(data) => {
                    debug!("load configuration from {:?}", path.display());
                    return data.parse().map_err(|err| ConfigError::Parse {
                        source: Box::new(err),
                        path,
                    });
                }
                Err(err) if err.kind() == ErrorKind::NotFound => continue,
                Err(err) => return Err(ConfigError::Read { source: err, path }),
            }
        }

        info!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Editor to open repositories with.
    pub fn editor(&self) -> &str {
        self.editor.as_deref().unwrap_or(DEFAULT_EDITOR)
    }

    /// Root of the `forge/user/repo` directory layout.
    pub fn source_dir(&self) -> String {
        self.source_dir.clone().unwrap_or_else(default_source_dir)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        let mut config: Config = toml::de::from_str(data).map_err(ConfigError::Deserialize)?;

        // INVARIANT: Perform shell expansion on every local directory field.
        //   - Remote source directories are expanded by the remote shell.
        expand_in_place(&mut config.source_dir)?;
        for alias in config.aliases.values_mut() {
            expand_in_place(&mut alias.repo_dir)?;
        }

        Ok(config)
    }
}

impl Display for Config {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> FmtResult {
        fmt.write_str(
            toml::ser::to_string_pretty(self)
                .map_err(ConfigError::Serialize)?
                .as_str(),
        )
    }
}

fn expand_in_place(field: &mut Option<String>) -> Result<()> {
    if let Some(value) = field {
        *value = shellexpand::full(value.as_str())?.into_owned();
    }

    Ok(())
}

/// Remote machine settings.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteConfig {
    /// SSH host name. Defaults to the remote's own name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,

    /// Source directory on the remote machine.
    ///
    /// Kept verbatim, so a leading `~` refers to the remote user's home.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
}

/// Alias settings.
///
/// Unset fields fall back the same way as parsed arguments do.
#[derive(Default, Debug, PartialEq, Eq, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forge: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Explicit repository directory, bypassing the source directory layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_dir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error(transparent)]
    Deserialize(#[from] toml::de::Error),

    /// Failed to serialize configuration.
    #[error(transparent)]
    Serialize(#[from] toml::ser::Error),

    /// Failed to perform shell expansion on configuration.
    #[error(transparent)]
    ShellExpansion(#[from] shellexpand::LookupError<std::env::VarError>),

    /// Configuration file exists but cannot be read.
    #[error("failed to read configuration file {:?}", path.display())]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Configuration file exists but is invalid.
    #[error("invalid configuration file {:?}", path.display())]
    Parse {
        #[source]
        source: Box<ConfigError>,
        path: PathBuf,
    },
}

impl From<ConfigError> for FmtError {
    fn from(_: ConfigError) -> Self {
        FmtError
    }
}

/// Friendly result alias :3
type Result<T, E = ConfigError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::fs::{create_dir_all, write};

    #[sealed_test(env = [("BLAH", "/home/blah")])]
    fn deserialize_config() -> anyhow::Result<()> {
        let result: Config = indoc! {r#"
            user = "twpayne"
            editor = "nvim"
            forge = "gitlab.com"
            sourceDir = "$BLAH/src"

            [remote.dev]
            hostname = "dev.example.com"
            sourceDir = "~/remote-src"

            [alias.dotfiles]
            user = "someone"
            repo = "dotfiles"
            repoDir = "$BLAH/.dotfiles"
        "#}
        .parse()?;

        let expect = Config {
            user: Some("twpayne".into()),
            editor: Some("nvim".into()),
            forge: Some("gitlab.com".into()),
            source_dir: Some("/home/blah/src".into()),
            remotes: BTreeMap::from([(
                "dev".into(),
                RemoteConfig {
                    hostname: Some("dev.example.com".into()),
                    source_dir: Some("~/remote-src".into()),
                },
            )]),
            aliases: BTreeMap::from([(
                "dotfiles".into(),
                AliasConfig {
                    user: Some("someone".into()),
                    repo: Some("dotfiles".into()),
                    repo_dir: Some("/home/blah/.dotfiles".into()),
                    ..Default::default()
                },
            )]),
        };

        assert_eq!(result, expect);

        Ok(())
    }

    #[test]
    fn serialize_config() {
        let result = Config {
            user: Some("twpayne".into()),
            source_dir: Some("/home/blah/src".into()),
            remotes: BTreeMap::from([(
                "dev".into(),
                RemoteConfig {
                    hostname: Some("dev.example.com".into()),
                    source_dir: None,
                },
            )]),
            ..Default::default()
        }
        .to_string();

        let expect = indoc! {r#"
            user = "twpayne"
            sourceDir = "/home/blah/src"

            [remote.dev]
            hostname = "dev.example.com"
        "#};

        assert_eq!(result, expect);
    }

    #[test]
    fn defaults_for_unset_fields() -> anyhow::Result<()> {
        let config: Config = "".parse()?;
        assert_eq!(config.editor(), DEFAULT_EDITOR);
        assert_eq!(config, Config::default());

        Ok(())
    }

    #[test]
    fn reject_unknown_types() {
        let result = "sourceDir = 42".parse::<Config>();
        assert!(matches!(result, Err(ConfigError::Deserialize(_))));
    }

    #[sealed_test]
    fn first_config_file_wins() -> anyhow::Result<()> {
        create_dir_all("home/forge")?;
        create_dir_all("etc/forge")?;
        write("home/forge/forge.toml", r#"editor = "nvim""#)?;
        write("etc/forge/forge.toml", r#"editor = "vim""#)?;

        let config = Config::find_and_load_in(["missing", "home", "etc"])?;
        assert_eq!(config.editor(), "nvim");

        let config = Config::find_and_load_in(["missing", "etc"])?;
        assert_eq!(config.editor(), "vim");

        Ok(())
    }

    #[sealed_test]
    fn missing_config_file_is_default() -> anyhow::Result<()> {
        let config = Config::find_and_load_in(["missing"])?;
        assert_eq!(config, Config::default());

        Ok(())
    }

    #[sealed_test]
    fn invalid_config_file_is_fatal() -> anyhow::Result<()> {
        create_dir_all("home/forge")?;
        write("home/forge/forge.toml", "editor = [")?;

        let result = Config::find_and_load_in(["home"]);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));

        Ok(())
    }
}
