// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use forge::{
    action::{ActionError, Executor, Mode, Plan},
    cache::{ListingCache, ScriptSources},
    config::Config,
    matcher::Strategy,
    resolve::{exactly_one, Resolver},
};

use anyhow::Result;
use clap::Parser;
use std::process::exit;
use tracing::{debug, error};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Debug, Clone, Parser)]
#[command(
    about,
    override_usage = "\n  forge [options] [[forge/]user/]repo[@remote]|alias\n  forge [options] --fuzzy|--list [host:]pattern",
    version
)]
struct Cli {
    /// Repository to open.
    #[arg(value_name = "repo", required_unless_present = "list")]
    pub arg: Option<String>,

    /// Initialize missing repository instead of cloning it.
    #[arg(short, long, conflicts_with_all = ["fuzzy", "list"])]
    pub create: bool,

    /// Print what would be done without doing it.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Exec shell inside repository instead of editor.
    #[arg(short, long, group = "mode")]
    pub shell: bool,

    /// Open package documentation in web browser.
    #[arg(short, long, group = "mode")]
    pub doc: bool,

    /// Open repository in web browser.
    #[arg(short, long, group = "mode")]
    pub web: bool,

    /// Look up repository in listing of existing checkouts by fuzzy match.
    #[arg(short, long)]
    pub fuzzy: bool,

    /// Print working directories of matching checkouts and exit.
    #[arg(short, long, conflicts_with_all = ["mode", "fuzzy"])]
    pub list: bool,

    /// Override configured source directory.
    #[arg(short = 'S', long, value_name = "dir")]
    pub source_dir: Option<String>,

    /// Override configured editor.
    #[arg(short, long, value_name = "editor")]
    pub editor: Option<String>,

    /// Echo commands and enable debug logging.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.shell {
            Mode::Shell
        } else if self.doc {
            Mode::Doc
        } else if self.web {
            Mode::Web
        } else {
            Mode::Editor
        }
    }

    fn run(self) -> Result<()> {
        let mut config = Config::find_and_load()?;
        if let Some(source_dir) = &self.source_dir {
            config.source_dir = Some(shellexpand::full(source_dir)?.into_owned());
        }
        if let Some(editor) = &self.editor {
            config.editor = Some(editor.clone());
        }

        let query = self.arg.clone().unwrap_or_default();
        let mode = self.mode();
        debug!("{mode:?} on {query:?}");

        let plan = if self.list || self.fuzzy {
            let strategy = if self.fuzzy {
                Strategy::Fuzzy
            } else {
                Strategy::Suffix
            };
            let mut cache = ListingCache::new(ScriptSources::new(config.clone()));
            let candidates = cache.find(&query, &strategy)?;

            if self.list {
                for repo in &candidates {
                    println!("{}", repo.location());
                }
                return Ok(());
            }

            let repo = exactly_one(&query, candidates)?;
            Plan::for_repository(&repo, &config, mode)
        } else {
            let target = Resolver::new(&config).resolve(&query)?;
            debug!("resolved to {target:?}");
            Plan::for_target(&target, &config, mode, self.create)?
        };

        Executor::new(self.dry_run, self.verbose).run(&plan)?;
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();

    let layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_timer(false)
        .without_time();
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .init();

    if let Err(error) = cli.run() {
        if let Some(message) = failure_message(&error) {
            error!("{message}");
        }
        exit(exit_code(&error));
    }

    exit(0)
}

/// Exit code for a failed run.
///
/// Failed child processes hand their own exit code through.
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<ActionError>() {
        Some(ActionError::ChildExit { code, .. }) => *code,
        _ => 1,
    }
}

/// One-line report for a failed run, if any.
///
/// Failed child processes already reported themselves.
fn failure_message(error: &anyhow::Error) -> Option<String> {
    match error.downcast_ref::<ActionError>() {
        Some(ActionError::ChildExit { .. }) => None,
        _ => Some(format!("{error:#}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge::{disambiguate::DisambiguateError, parse::ParsedArg};
    use pretty_assertions::assert_eq;
    use std::{
        io::{Error as IoError, ErrorKind},
        path::PathBuf,
    };

    #[test]
    fn child_exit_code_is_forwarded_silently() {
        let error = anyhow::Error::from(ActionError::ChildExit {
            program: "git".into(),
            code: 128,
        });
        assert_eq!(exit_code(&error), 128);
        assert_eq!(failure_message(&error), None);
    }

    #[test]
    fn other_failures_exit_with_one() {
        let error = anyhow::Error::from("a/b/c/d".parse::<ParsedArg>().unwrap_err());
        assert_eq!(exit_code(&error), 1);
        assert_eq!(failure_message(&error).as_deref(), Some("a/b/c/d: invalid argument"));
    }

    #[test]
    fn error_chain_fits_on_one_line() {
        let error = anyhow::Error::from(DisambiguateError::ReadDir {
            source: IoError::new(ErrorKind::NotFound, "gone"),
            path: PathBuf::from("/src/github.com"),
        });
        let message = failure_message(&error).unwrap();
        assert!(!message.contains('\n'), "{message}");
        assert_eq!(message, r#"failed to read directory "/src/github.com": gone"#);
    }

    #[test]
    fn list_requires_no_argument() {
        let cli = Cli::try_parse_from(["forge", "--list"]).unwrap();
        assert_eq!(cli.arg, None);
        assert!(Cli::try_parse_from(["forge"]).is_err());
        assert!(Cli::try_parse_from(["forge", "-l", "-w", "x"]).is_err());
        assert!(Cli::try_parse_from(["forge", "-s", "-w", "x"]).is_err());
    }
}
