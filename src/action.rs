// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Act on resolved repositories.
//!
//! Acting happens in two stages. First a [`Plan`] is built from a resolved
//! [`Target`] or a listed [`Repository`]. Planning only inspects the file
//! system, and never changes it. Then an [`Executor`] carries the plan out:
//!
//! 1. __Bootstrap__ a missing local repository, either by cloning it, or by
//!    initializing an empty one with an `origin` remote.
//! 2. __Launch__ a program on the repository by replacing the current
//!    process, optionally after changing into the repository directory.
//!
//! A dry run reports what would happen without doing any of it.

use crate::{
    config::Config,
    path::current_user_shell,
    repo::Repository,
    resolve::Target,
};

use std::{
    env::set_current_dir,
    ffi::OsStr,
    fs::metadata,
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Command,
};
use tracing::{debug, info, instrument};

/// What to launch on a repository.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Open repository in configured editor.
    #[default]
    Editor,

    /// Replace process with login shell inside repository.
    Shell,

    /// Open forge page of repository in web browser.
    Web,

    /// Open package documentation of repository in web browser.
    Doc,
}

impl Mode {
    /// Check if mode only needs a URL, not a checkout.
    pub fn is_browser(&self) -> bool {
        matches!(self, Mode::Web | Mode::Doc)
    }
}

/// Way to bring a missing local repository into existence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bootstrap {
    /// Clone repository from URL.
    Clone { url: String, repo_dir: PathBuf },

    /// Initialize empty repository with URL as `origin` remote.
    Init { url: String, repo_dir: PathBuf },
}

/// Program to replace the current process with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    /// Directory to change into first.
    pub chdir: Option<PathBuf>,
    pub program: String,
    pub args: Vec<String>,
}

/// Everything to do for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    pub bootstrap: Option<Bootstrap>,
    pub launch: Launch,
}

impl Plan {
    /// Plan action on a resolved target.
    ///
    /// Local targets that do not exist yet are bootstrapped first, unless
    /// only a browser is needed. Remote targets are never checked.
    ///
    /// # Errors
    ///
    /// - Return [`ActionError::Stat`] if the repository directory cannot be
    ///   inspected for reasons other than not existing.
    #[instrument(skip(target, config), level = "debug")]
    pub fn for_target(target: &Target, config: &Config, mode: Mode, create: bool) -> Result<Self> {
        let bootstrap = if target.is_remote() || mode.is_browser() {
            None
        } else {
            match metadata(&target.repo_dir) {
                Ok(_) => None,
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    let url = target.git_url(config);
                    let repo_dir = target.repo_dir.clone();
                    debug!("{:?} does not exist", repo_dir.display());
                    if create {
                        Some(Bootstrap::Init { url, repo_dir })
                    } else {
                        Some(Bootstrap::Clone { url, repo_dir })
                    }
                }
                Err(err) => {
                    return Err(ActionError::Stat {
                        source: err,
                        path: target.repo_dir.clone(),
                    })
                }
            }
        };

        let launch = match mode {
            Mode::Editor => Launch {
                chdir: None,
                program: config.editor().into(),
                args: target.open_args(),
            },
            Mode::Shell => match &target.hostname {
                Some(hostname) if target.is_remote() => remote_shell(hostname, &target.repo_dir),
                _ => local_shell(&target.repo_dir),
            },
            Mode::Web => browser(target.url()),
            Mode::Doc => browser(target.doc_url()),
        };

        Ok(Self { bootstrap, launch })
    }

    /// Plan action on a repository found in a listing.
    ///
    /// Listed repositories exist by construction, so nothing is bootstrapped.
    pub fn for_repository(repo: &Repository, config: &Config, mode: Mode) -> Self {
        let launch = match mode {
            Mode::Editor => Launch {
                chdir: None,
                program: config.editor().into(),
                args: repo.open_args.clone(),
            },
            Mode::Shell if repo.is_local() => local_shell(Path::new(&repo.working_dir)),
            Mode::Shell => remote_shell(&repo.host, Path::new(&repo.working_dir)),
            Mode::Web => browser(repo.url()),
            Mode::Doc => browser(repo.doc_url()),
        };

        Self {
            bootstrap: None,
            launch,
        }
    }
}

fn local_shell(repo_dir: &Path) -> Launch {
    Launch {
        chdir: Some(repo_dir.to_path_buf()),
        program: current_user_shell(),
        args: Vec::new(),
    }
}

fn remote_shell(hostname: &str, repo_dir: &Path) -> Launch {
    let repo_dir = repo_dir.to_string_lossy();

    // INVARIANT: Leave a leading tilde unquoted so the remote shell expands it.
    let cd_target = match repo_dir.strip_prefix("~/") {
        Some(rest) => format!("~/{}", shell_words::quote(rest)),
        None => shell_words::quote(&repo_dir).into_owned(),
    };

    Launch {
        chdir: None,
        program: "ssh".into(),
        args: vec![
            "-t".into(),
            hostname.into(),
            format!("cd {cd_target} && exec \"$SHELL\" -l"),
        ],
    }
}

fn browser(url: String) -> Launch {
    Launch {
        chdir: None,
        program: url_opener().into(),
        args: vec![url],
    }
}

/// Program that opens URLs in the default web browser.
pub fn url_opener() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else {
        "xdg-open"
    }
}

/// Carry out plans.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Executor {
    /// Report steps without performing them.
    pub dry_run: bool,

    /// Echo every step to standard output.
    pub verbose: bool,
}

impl Executor {
    /// Construct new executor.
    pub fn new(dry_run: bool, verbose: bool) -> Self {
        Self { dry_run, verbose }
    }

    /// Carry out target plan.
    ///
    /// Does not return on success unless this is a dry run, or the platform
    /// cannot replace the current process.
    ///
    /// # Errors
    ///
    /// - Return [`ActionError::ChildExit`] if `git clone` fails.
    /// - Return [`ActionError::Git2`] if a repository cannot be initialized.
    /// - Return [`ActionError::NotOnPath`] if the launched program is missing.
    /// - Return [`ActionError::Exec`] if the process cannot be replaced.
    #[instrument(skip(self, plan), level = "debug")]
    pub fn run(&self, plan: &Plan) -> Result<()> {
        if let Some(bootstrap) = &plan.bootstrap {
            self.bootstrap(bootstrap)?;
        }

        self.launch(&plan.launch)
    }

    /// Bring missing repository into existence.
    ///
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// - Return [`ActionError::ChildExit`] if `git clone` fails.
    /// - Return [`ActionError::Git2`] if a repository cannot be initialized.
    pub fn bootstrap(&self, bootstrap: &Bootstrap) -> Result<()> {
        match bootstrap {
            Bootstrap::Clone { url, repo_dir } => {
                self.echo(format!("git clone {url} {}", repo_dir.display()));
                if self.dry_run {
                    return Ok(());
                }

                make_parent_dirs(repo_dir)?;
                info!("clone {url}");
                syscall_interactive("git", [OsStr::new("clone"), OsStr::new(url), repo_dir.as_os_str()])
            }
            Bootstrap::Init { url, repo_dir } => {
                self.echo(format!("git init {}", repo_dir.display()));
                self.echo(format!("git remote add origin {url}"));
                if self.dry_run {
                    return Ok(());
                }

                make_parent_dirs(repo_dir)?;
                info!("initialize {:?}", repo_dir.display());
                let repo = git2::Repository::init(repo_dir)?;
                repo.remote("origin", url)?;
                Ok(())
            }
        }
    }

    fn launch(&self, launch: &Launch) -> Result<()> {
        if let Some(chdir) = &launch.chdir {
            self.echo(format!("cd {}", chdir.display()));
            if !self.dry_run {
                set_current_dir(chdir).map_err(|err| ActionError::Chdir {
                    source: err,
                    path: chdir.clone(),
                })?;
            }
        }

        let program = which::which(&launch.program).map_err(|err| ActionError::NotOnPath {
            source: err,
            program: launch.program.clone(),
        })?;
        self.echo(format!("exec {} {}", program.display(), launch.args.join(" ")));
        if self.dry_run {
            return Ok(());
        }

        exec(&program, &launch.program, &launch.args)
    }

    fn echo(&self, line: String) {
        if self.verbose {
            println!("{}", line.trim_end());
        }
    }
}

fn make_parent_dirs(repo_dir: &Path) -> Result<()> {
    if let Some(parent) = repo_dir.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        mkdirp::mkdirp(parent).map_err(|err| ActionError::MakeDir {
            source: err,
            path: parent.to_path_buf(),
        })?;
    }

    Ok(())
}

fn syscall_interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<()> {
    let program = cmd.as_ref().to_string_lossy().into_owned();
    let status = Command::new(cmd.as_ref())
        .args(args)
        .status()
        .map_err(|err| ActionError::Spawn {
            source: err,
            program: program.clone(),
        })?;

    if !status.success() {
        // INVARIANT: Child killed by a signal still counts as a failure.
        return Err(ActionError::ChildExit {
            program,
            code: status.code().unwrap_or(1),
        });
    }

    Ok(())
}

#[cfg(unix)]
fn exec(program: &Path, arg0: &str, args: &[String]) -> Result<()> {
    use std::os::unix::process::CommandExt;

    let err = Command::new(program).arg0(arg0).args(args).exec();
    Err(ActionError::Exec {
        source: err,
        program: program.to_path_buf(),
    })
}

#[cfg(not(unix))]
fn exec(program: &Path, _arg0: &str, args: &[String]) -> Result<()> {
    syscall_interactive(program, args)
}

/// Action error types.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// Repository directory cannot be inspected.
    #[error("failed to inspect {:?}", path.display())]
    Stat {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Parent directories of repository cannot be created.
    #[error("failed to create directory {:?}", path.display())]
    MakeDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Cannot change into repository directory.
    #[error("failed to change directory to {:?}", path.display())]
    Chdir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },

    /// Child process could not be started.
    #[error("failed to run {program:?}")]
    Spawn {
        #[source]
        source: std::io::Error,
        program: String,
    },

    /// Child process exited unsuccessfully. Carries its exit code.
    #[error("{program:?} exited with code {code}")]
    ChildExit { program: String, code: i32 },

    /// Program to launch is not on `$PATH`.
    #[error("{program}: not found on PATH")]
    NotOnPath {
        #[source]
        source: which::Error,
        program: String,
    },

    /// Current process cannot be replaced.
    #[error("failed to exec {:?}", program.display())]
    Exec {
        #[source]
        source: std::io::Error,
        program: PathBuf,
    },

    /// Repository cannot be initialized.
    #[error(transparent)]
    Git2(#[from] git2::Error),
}

/// Friendly result alias :3
pub type Result<T, E = ActionError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Resolver;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;
    use std::{env::current_dir, fs::create_dir_all};

    fn config_in(source_dir: &Path) -> Config {
        Config {
            user: Some("twpayne".into()),
            editor: Some("nvim".into()),
            source_dir: Some(source_dir.to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    #[sealed_test]
    fn clone_missing_repository() -> anyhow::Result<()> {
        let source_dir = current_dir()?.join("src");
        let config = config_in(&source_dir);
        let target = Resolver::with_current_user(&config, "me").resolve("golang/go")?;

        let plan = Plan::for_target(&target, &config, Mode::Editor, false)?;
        let repo_dir = source_dir.join("github.com/golang/go");
        let expect = Plan {
            bootstrap: Some(Bootstrap::Clone {
                url: "https://github.com/golang/go.git".into(),
                repo_dir: repo_dir.clone(),
            }),
            launch: Launch {
                chdir: None,
                program: "nvim".into(),
                args: vec![repo_dir.to_string_lossy().into_owned()],
            },
        };
        assert_eq!(plan, expect);

        Ok(())
    }

    #[sealed_test]
    fn create_missing_repository() -> anyhow::Result<()> {
        let source_dir = current_dir()?.join("src");
        let config = config_in(&source_dir);
        let target = Resolver::with_current_user(&config, "me").resolve("newthing")?;

        let plan = Plan::for_target(&target, &config, Mode::Editor, true)?;
        let expect = Some(Bootstrap::Init {
            url: "git@github.com:twpayne/newthing.git".into(),
            repo_dir: source_dir.join("github.com/twpayne/newthing"),
        });
        assert_eq!(plan.bootstrap, expect);

        Ok(())
    }

    #[sealed_test]
    fn existing_repository_is_left_alone() -> anyhow::Result<()> {
        create_dir_all("src/github.com/twpayne/chezmoi")?;
        let source_dir = current_dir()?.join("src");
        let config = config_in(&source_dir);
        let target = Resolver::with_current_user(&config, "me").resolve("chezmoi")?;

        let plan = Plan::for_target(&target, &config, Mode::Shell, false)?;
        assert_eq!(plan.bootstrap, None);
        assert_eq!(
            plan.launch.chdir,
            Some(source_dir.join("github.com/twpayne/chezmoi"))
        );

        Ok(())
    }

    #[sealed_test]
    fn browsers_never_bootstrap() -> anyhow::Result<()> {
        let source_dir = current_dir()?.join("src");
        let config = config_in(&source_dir);
        let target = Resolver::with_current_user(&config, "me").resolve("golang/go")?;

        let web = Plan::for_target(&target, &config, Mode::Web, false)?;
        assert_eq!(web.bootstrap, None);
        assert_eq!(web.launch.program, url_opener());
        assert_eq!(web.launch.args, vec!["https://github.com/golang/go"]);

        let doc = Plan::for_target(&target, &config, Mode::Doc, true)?;
        assert_eq!(doc.bootstrap, None);
        assert_eq!(doc.launch.args, vec!["https://pkg.go.dev/github.com/golang/go"]);

        Ok(())
    }

    #[test]
    fn remote_targets_never_bootstrap() -> anyhow::Result<()> {
        let config: Config = indoc! {r#"
            editor = "code"

            [remote.dev]
            hostname = "dev.example.com"
            sourceDir = "/srv/src"
        "#}
        .parse()?;
        let target = Resolver::with_current_user(&config, "me").resolve("golang/go@dev")?;

        let plan = Plan::for_target(&target, &config, Mode::Editor, false)?;
        let expect = Plan {
            bootstrap: None,
            launch: Launch {
                chdir: None,
                program: "code".into(),
                args: vec![
                    "--folder-uri".into(),
                    "vscode-remote://ssh-remote+dev.example.com/srv/src/github.com/golang/go".into(),
                ],
            },
        };
        assert_eq!(plan, expect);

        let shell = Plan::for_target(&target, &config, Mode::Shell, false)?;
        assert_eq!(shell.launch.program, "ssh");
        assert_eq!(
            shell.launch.args,
            vec![
                "-t",
                "dev.example.com",
                "cd /srv/src/github.com/golang/go && exec \"$SHELL\" -l",
            ]
        );

        Ok(())
    }

    #[test]
    fn listed_repositories() {
        let config = Config::default();

        let local = Repository::local("github.com/twpayne/forge", "/src/github.com/twpayne/forge");
        let plan = Plan::for_repository(&local, &config, Mode::Editor);
        assert_eq!(plan.bootstrap, None);
        assert_eq!(plan.launch.program, "code");
        assert_eq!(plan.launch.args, vec!["/src/github.com/twpayne/forge"]);

        let plan = Plan::for_repository(&local, &config, Mode::Web);
        assert_eq!(plan.launch.args, vec!["https://github.com/twpayne/forge"]);

        let remote = Repository::remote("github.com/twpayne/forge", "devbox", "/srv/github.com/twpayne/forge");
        let plan = Plan::for_repository(&remote, &config, Mode::Shell);
        assert_eq!(plan.launch.chdir, None);
        assert_eq!(plan.launch.args[1], "devbox");
    }

    #[test]
    fn remote_shell_expands_tilde_remotely() -> anyhow::Result<()> {
        let config: Config = indoc! {r#"
            [remote.dev]
            sourceDir = "~/my src"
        "#}
        .parse()?;
        let target = Resolver::with_current_user(&config, "me").resolve("golang/go@dev")?;
        assert_eq!(target.repo_dir, PathBuf::from("~/my src/github.com/golang/go"));

        let plan = Plan::for_target(&target, &config, Mode::Shell, false)?;
        assert_eq!(
            plan.launch.args[2],
            "cd ~/'my src/github.com/golang/go' && exec \"$SHELL\" -l"
        );

        Ok(())
    }

    #[sealed_test(env = [("SHELL", "/bin/sh")])]
    fn dry_run_changes_nothing() -> anyhow::Result<()> {
        let source_dir = current_dir()?.join("src");
        let config = config_in(&source_dir);
        let target = Resolver::with_current_user(&config, "me").resolve("newthing")?;
        let plan = Plan::for_target(&target, &config, Mode::Shell, true)?;

        let before = current_dir()?;
        Executor::new(true, false).run(&plan)?;
        assert_eq!(current_dir()?, before);
        assert!(!source_dir.exists());

        Ok(())
    }

    #[sealed_test]
    fn init_with_origin_remote() -> anyhow::Result<()> {
        let repo_dir = current_dir()?.join("src/github.com/twpayne/newthing");
        let bootstrap = Bootstrap::Init {
            url: "git@github.com:twpayne/newthing.git".into(),
            repo_dir: repo_dir.clone(),
        };
        Executor::new(false, false).bootstrap(&bootstrap)?;

        let repo = git2::Repository::open(&repo_dir)?;
        let origin = repo.find_remote("origin")?;
        assert_eq!(origin.url(), Some("git@github.com:twpayne/newthing.git"));

        Ok(())
    }

    #[test]
    fn missing_program_is_reported() {
        let launch = Launch {
            chdir: None,
            program: "forge-test-no-such-program".into(),
            args: Vec::new(),
        };
        let result = Executor::new(true, false).launch(&launch);
        assert!(matches!(result, Err(ActionError::NotOnPath { .. })));
    }

    #[test]
    fn child_exit_code_is_kept() {
        let result = syscall_interactive("sh", ["-c", "exit 3"]);
        assert!(matches!(result, Err(ActionError::ChildExit { code: 3, .. })));
    }
}
