use std::io::IsTerminal;
use std::path::Path;

use anyhow::{anyhow, Context as _, Result};

use crate::config::Config;
use crate::output;
use crate::prompts::{self, DialoguerPrompter, Prompter};
use crate::story::client::{StoryTracker, TrackerClient};
use crate::story::model::{commit_message, Story};
use crate::story::resolver::{BranchMatch, Resolver};
use crate::story::transition::Workflow;
use crate::vcs::{ExternalAction, GitCli, ShellAction, VersionControl};

/// Collaborators built once per invocation and shared by every handler.
pub struct Session {
    pub config: Config,
    tracker: TrackerClient,
    git: GitCli,
    prompter: DialoguerPrompter,
    pull_request: ShellAction,
    land: ShellAction,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            tracker: TrackerClient::new(&config),
            git: GitCli,
            prompter: DialoguerPrompter,
            pull_request: ShellAction::new("pull request", config.tools.pull_request.clone()),
            land: ShellAction::new("land", config.tools.land.clone()),
            config,
        }
    }

    pub fn context(&self) -> Context<'_> {
        Context {
            tracker: &self.tracker,
            vcs: &self.git,
            prompter: &self.prompter,
            pull_request: &self.pull_request,
            land: &self.land,
        }
    }
}

/// Borrowed view of the collaborators a command needs.
pub struct Context<'a> {
    pub tracker: &'a dyn StoryTracker,
    pub vcs: &'a dyn VersionControl,
    pub prompter: &'a dyn Prompter,
    pub pull_request: &'a dyn ExternalAction,
    pub land: &'a dyn ExternalAction,
}

impl<'a> Context<'a> {
    fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.tracker, self.prompter)
    }

    fn workflow(&self) -> Workflow<'a> {
        Workflow::new(self.tracker, self.vcs, self.prompter)
    }

    /// The story linked to the current branch, or `None` after telling the
    /// user why there isn't one.
    fn story_for_branch(&self) -> Result<Option<Story>> {
        let matched = self.resolver().resolve_from_branch(self.vcs)?;
        if let BranchMatch::Found(story) = matched {
            return Ok(Some(story));
        }
        println!("{}", matched.describe());
        Ok(None)
    }
}

pub fn run_list(ctx: &Context) -> Result<()> {
    let groups = ctx.tracker.list_my_stories()?;
    let styled = std::io::stdout().is_terminal();
    print!("{}", output::render_groups(&groups, styled));
    Ok(())
}

pub fn run_open(ctx: &Context, id: Option<&str>) -> Result<()> {
    let story = match id {
        Some(id) => ctx.resolver().resolve(Some(id), false)?,
        None => match ctx.resolver().resolve_from_branch(ctx.vcs)?.into_story() {
            Some(story) => story,
            None => ctx.resolver().resolve(None, false)?,
        },
    };

    println!("{}", output::render_story(&story));
    let url = story
        .browser_url()
        .ok_or_else(|| anyhow!("story has no url"))?;
    tracing::info!(%url, "opening story");
    open::that(&url).with_context(|| format!("failed to open {url}"))?;
    Ok(())
}

pub fn run_branch(ctx: &Context, name: &str, id: Option<&str>) -> Result<()> {
    let story = ctx.resolver().resolve(id, true)?;
    let transition = ctx.workflow().start(story, name)?;
    println!("{}", output::render_transition(&transition));
    Ok(())
}

pub fn run_commit(ctx: &Context, message: Option<&str>) -> Result<()> {
    let Some(story) = ctx.story_for_branch()? else {
        return Ok(());
    };

    let mut full_message = commit_message(&story);
    if let Some(extra) = message.map(str::trim).filter(|m| !m.is_empty()) {
        full_message.push_str("\n\n");
        full_message.push_str(extra);
    }

    ctx.vcs.stage_all()?;
    ctx.vcs.commit(&full_message)?;
    tracing::info!(story_id = ?story.id, "committed");
    Ok(())
}

pub fn run_pull_request(ctx: &Context) -> Result<()> {
    let Some(story) = ctx.story_for_branch()? else {
        return Ok(());
    };
    let transition = ctx.workflow().finish(story, ctx.pull_request)?;
    println!("{}", output::render_transition(&transition));
    Ok(())
}

pub fn run_land(ctx: &Context) -> Result<()> {
    let Some(story) = ctx.story_for_branch()? else {
        return Ok(());
    };
    let transition = ctx.workflow().deliver(story, ctx.land)?;
    println!("{}", output::render_transition(&transition));
    Ok(())
}

pub fn run_setup(config_path: &Path) -> Result<()> {
    let existing = Config::load_or_default(config_path)?;
    let config = prompts::prompt_config(&existing)?;

    let me = TrackerClient::new(&config)
        .me()
        .context("could not verify the API token")?;
    if me.username != config.username {
        println!(
            "Note: the token belongs to {}, not {}",
            me.username, config.username
        );
    }

    config.save(config_path)?;
    println!(
        "Authenticated as {}. Saved {}",
        me.name.as_deref().unwrap_or(&me.username),
        config_path.display()
    );
    Ok(())
}
