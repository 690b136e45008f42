use std::process::Command;

use crate::error::{PvError, PvResult};

/// Local repository operations the workflow needs.
pub trait VersionControl {
    fn current_branch_name(&self) -> PvResult<String>;
    /// Returns `false` when git ran but refused to create the branch.
    fn create_and_checkout_branch(&self, name: &str) -> PvResult<bool>;
    fn stage_all(&self) -> PvResult<()>;
    fn commit(&self, message: &str) -> PvResult<()>;
}

/// An external tool run once with a title, e.g. `hub pull-request -m <title>`.
pub trait ExternalAction {
    fn label(&self) -> &str;
    fn execute(&self, title: &str) -> PvResult<bool>;
}

#[derive(Debug, Default)]
pub struct GitCli;

impl GitCli {
    fn git(&self, args: &[&str]) -> PvResult<std::process::Output> {
        tracing::debug!("git {}", args.join(" "));
        Command::new("git")
            .args(args)
            .output()
            .map_err(|source| PvError::Command {
                program: "git".to_string(),
                source,
            })
    }

    fn git_checked(&self, args: &[&str]) -> PvResult<String> {
        let output = self.git(args)?;
        if !output.status.success() {
            return Err(PvError::ExternalAction {
                action: format!("git {}", args.join(" ")),
                detail: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VersionControl for GitCli {
    fn current_branch_name(&self) -> PvResult<String> {
        self.git_checked(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    fn create_and_checkout_branch(&self, name: &str) -> PvResult<bool> {
        let output = self.git(&["checkout", "-b", name])?;
        if !output.status.success() {
            tracing::warn!(
                branch = name,
                "git checkout -b failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return Ok(false);
        }
        Ok(true)
    }

    fn stage_all(&self) -> PvResult<()> {
        self.git_checked(&["add", "--all"]).map(|_| ())
    }

    fn commit(&self, message: &str) -> PvResult<()> {
        let status = Command::new("git")
            .args(["commit", "-m", message])
            .status()
            .map_err(|source| PvError::Command {
                program: "git".to_string(),
                source,
            })?;
        if !status.success() {
            return Err(PvError::ExternalAction {
                action: "git commit".to_string(),
                detail: format!("exited with {status}"),
            });
        }
        Ok(())
    }
}

/// Runs a configured argv with the title appended as the final argument.
/// Output is inherited so interactive tools keep the terminal.
#[derive(Debug, Clone)]
pub struct ShellAction {
    label: String,
    argv: Vec<String>,
}

impl ShellAction {
    pub fn new(label: impl Into<String>, argv: Vec<String>) -> Self {
        Self {
            label: label.into(),
            argv,
        }
    }

    pub fn command_line(&self, title: &str) -> Vec<String> {
        let mut line = self.argv.clone();
        line.push(title.to_string());
        line
    }
}

impl ExternalAction for ShellAction {
    fn label(&self) -> &str {
        &self.label
    }

    fn execute(&self, title: &str) -> PvResult<bool> {
        let Some((program, args)) = self.argv.split_first() else {
            return Err(PvError::Config(format!("no command configured for {}", self.label)));
        };
        tracing::info!(action = %self.label, "running {}", self.command_line(title).join(" "));
        let status = Command::new(program)
            .args(args)
            .arg(title)
            .status()
            .map_err(|source| PvError::Command {
                program: program.clone(),
                source,
            })?;
        Ok(status.success())
    }
}
