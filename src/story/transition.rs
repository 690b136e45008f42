//! Moves stories through unstarted → started → finished → delivered.
//!
//! Every transition runs its local or external action first and only asks
//! the tracker to change state once that action reports success.

use crate::error::{PvError, PvResult};
use crate::prompts::Prompter;
use crate::story::branch;
use crate::story::client::StoryTracker;
use crate::story::model::{Estimate, Story, StoryState};
use crate::vcs::{ExternalAction, VersionControl};

#[derive(Debug)]
pub struct Transition {
    pub story: Story,
    /// Branch created by `start`.
    pub branch: Option<String>,
    /// False when the story was already at or past the target state.
    pub advanced: bool,
}

pub struct Workflow<'a> {
    tracker: &'a dyn StoryTracker,
    vcs: &'a dyn VersionControl,
    prompter: &'a dyn Prompter,
}

fn check_errors(story: Story) -> PvResult<Story> {
    if story.errors.is_empty() {
        Ok(story)
    } else {
        Err(PvError::Validation(story.errors))
    }
}

impl<'a> Workflow<'a> {
    pub fn new(
        tracker: &'a dyn StoryTracker,
        vcs: &'a dyn VersionControl,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            tracker,
            vcs,
            prompter,
        }
    }

    /// Prompt for the new story's fields and create it remotely.
    pub fn create_story(&self) -> PvResult<Story> {
        let project_id = self.prompter.project(self.tracker.project_ids())?;
        let name = self.prompter.text("Story name")?;
        if name.trim().is_empty() {
            return Err(PvError::InvalidInput("story name is required".to_string()));
        }
        let description = self.prompter.text("Description (optional)")?;
        let story_type = self.prompter.story_type()?;

        let draft = Story::draft(project_id, &name, &description, story_type);
        let created = check_errors(self.tracker.create_story(&draft)?)?;
        if created.id.is_none() {
            return Err(PvError::Validation(vec![
                "tracker did not assign an id".to_string(),
            ]));
        }
        tracing::info!(story_id = ?created.id, "created story");
        Ok(created)
    }

    /// Create `<requested>-pv-<id>` and mark the story started. The
    /// placeholder story is created first; unestimated features are
    /// estimated once the branch exists.
    pub fn start(&self, story: Story, requested_branch: &str) -> PvResult<Transition> {
        let requested = branch::normalize_branch_name(requested_branch)?;
        let story = if story.is_placeholder() {
            self.create_story()?
        } else {
            story
        };
        let story_id = story
            .id
            .ok_or_else(|| PvError::InvalidInput("story has no id".to_string()))?;
        let branch = branch::branch_name_for(&requested, story_id)?;

        let estimate: Option<Estimate> = if story.needs_estimate() {
            Some(self.prompter.estimate()?)
        } else {
            None
        };

        if !self.vcs.create_and_checkout_branch(&branch)? {
            return Err(PvError::ExternalAction {
                action: format!("creating branch {branch}"),
                detail: "git refused to create the branch".to_string(),
            });
        }
        tracing::info!(story_id, branch = %branch, "created branch");

        let story = match estimate {
            Some(estimate) => check_errors(self.tracker.set_estimate(&story, estimate)?)?,
            None => story,
        };

        let mut transition = self.advance(story, StoryState::Started)?;
        transition.branch = Some(branch);
        Ok(transition)
    }

    /// Open a pull request titled after the story, then mark it finished.
    pub fn finish(&self, story: Story, pull_request: &dyn ExternalAction) -> PvResult<Transition> {
        self.run_action(&story, pull_request)?;
        self.advance(story, StoryState::Finished)
    }

    /// Land the branch, then mark the story delivered.
    pub fn deliver(&self, story: Story, land: &dyn ExternalAction) -> PvResult<Transition> {
        self.run_action(&story, land)?;
        self.advance(story, StoryState::Delivered)
    }

    fn run_action(&self, story: &Story, action: &dyn ExternalAction) -> PvResult<()> {
        if !action.execute(&story.name)? {
            return Err(PvError::ExternalAction {
                action: action.label().to_string(),
                detail: "command exited unsuccessfully".to_string(),
            });
        }
        Ok(())
    }

    fn advance(&self, story: Story, target: StoryState) -> PvResult<Transition> {
        if !story.current_state.is_behind(target) {
            tracing::info!(
                story_id = ?story.id,
                state = story.current_state.as_str(),
                "story already at or past {}",
                target.as_str()
            );
            return Ok(Transition {
                story,
                branch: None,
                advanced: false,
            });
        }
        let updated = check_errors(self.tracker.transition_state(&story, target)?)?;
        tracing::info!(story_id = ?updated.id, state = target.as_str(), "transitioned story");
        Ok(Transition {
            story: updated,
            branch: None,
            advanced: true,
        })
    }
}
