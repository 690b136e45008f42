mod commands;
mod config;
mod error;
mod logging;
mod output;
mod prompts;
mod pv_io;
mod story;
mod vcs;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands::{Context, Session};
use crate::config::Config;
use crate::error::PvError;

const LONG_ABOUT: &str = "Connects your git branches to tracker stories.\n\n\
Branches created with `pv branch` end in `-pv-<story id>`; `commit`, \
`pull-request` and `land` read the story from that suffix and move it \
through started, finished and delivered.";

#[derive(Debug, Parser)]
#[command(name = "pv")]
#[command(about = "Tie git branches to tracker stories", long_about = LONG_ABOUT)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List stories assigned to you, grouped by project
    List,

    /// Open a story in the browser
    Open {
        /// Story id (defaults to the current branch's story)
        id: Option<String>,
    },

    /// Create a branch for a story and mark it started
    Branch {
        /// Branch name; `-pv-<id>` is appended
        name: String,

        /// Story id (choose interactively when omitted)
        id: Option<String>,
    },

    /// Stage everything and commit with the story's message
    Commit {
        /// Extra text for the commit body
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Open a pull request and mark the story finished
    #[command(name = "pull-request", visible_alias = "pr")]
    PullRequest,

    /// Land the branch and mark the story delivered
    Land,

    /// Configure username, API token and projects
    Setup,
}

fn run(cli: Cli) -> Result<()> {
    let config_path = pv_io::config_path()?;

    match cli.command {
        Commands::Setup => commands::run_setup(&config_path),
        Commands::List => with_session(&config_path, |ctx| commands::run_list(ctx)),
        Commands::Open { id } => {
            with_session(&config_path, |ctx| commands::run_open(ctx, id.as_deref()))
        }
        Commands::Branch { name, id } => with_session(&config_path, |ctx| {
            commands::run_branch(ctx, &name, id.as_deref())
        }),
        Commands::Commit { message } => with_session(&config_path, |ctx| {
            commands::run_commit(ctx, message.as_deref())
        }),
        Commands::PullRequest => {
            with_session(&config_path, |ctx| commands::run_pull_request(ctx))
        }
        Commands::Land => with_session(&config_path, |ctx| commands::run_land(ctx)),
    }
}

/// Runs `command` against a session built from the saved config. An
/// incomplete config only prints a hint.
fn with_session(
    config_path: &Path,
    command: impl FnOnce(&Context<'_>) -> Result<()>,
) -> Result<()> {
    let config = Config::load(config_path)?;
    if !config.is_complete() {
        println!(
            "Configuration at {} is incomplete; run `pv setup`",
            config_path.display()
        );
        return Ok(());
    }

    let session = Session::new(config);
    tracing::debug!(projects = ?session.config.project_ids, "session ready");
    command(&session.context())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();
    tracing::info!(command = ?cli.command, "starting");

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let handled = err
                .downcast_ref::<PvError>()
                .map_or(true, PvError::is_handled);
            tracing::error!("{err:#}");
            eprintln!("error: {err:#}");
            if handled {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::{Cell, RefCell};

    use clap::CommandFactory;
    use tempfile::tempdir;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn branch_takes_name_and_optional_id() {
        let cli = Cli::try_parse_from(["pv", "branch", "add-login", "4821"]).unwrap();
        match cli.command {
            Commands::Branch { name, id } => {
                assert_eq!(name, "add-login");
                assert_eq!(id.as_deref(), Some("4821"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn pull_request_has_short_alias() {
        let cli = Cli::try_parse_from(["pv", "pr"]).unwrap();
        assert!(matches!(cli.command, Commands::PullRequest));
    }

    #[test]
    fn setup_takes_no_arguments() {
        let cli = Cli::try_parse_from(["pv", "setup"]).unwrap();
        assert!(matches!(cli.command, Commands::Setup));
        assert!(Cli::try_parse_from(["pv", "setup", "extra"]).is_err());
    }

    #[test]
    fn incomplete_config_skips_the_command() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config {
            username: "ada".to_string(),
            ..Config::default()
        }
        .save(&path)
        .unwrap();
        let ran = Cell::new(false);

        with_session(&path, |_| {
            ran.set(true);
            Ok(())
        })
        .unwrap();

        assert!(!ran.get());
    }

    #[test]
    fn complete_config_runs_the_command_with_its_projects() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config {
            username: "ada".to_string(),
            api_token: "abcdefABCDEF0123456789abcdefABCD".to_string(),
            project_ids: vec![101, 202],
            ..Config::default()
        }
        .save(&path)
        .unwrap();
        let projects = RefCell::new(Vec::new());

        with_session(&path, |ctx| {
            *projects.borrow_mut() = ctx.tracker.project_ids().to_vec();
            Ok(())
        })
        .unwrap();

        assert_eq!(*projects.borrow(), vec![101, 202]);
    }

    #[test]
    fn missing_config_is_an_error() {
        let dir = tempdir().unwrap();
        let result = with_session(&dir.path().join("config.toml"), |_| Ok(()));
        assert!(result.is_err());
    }
}
