use std::ops::RangeInclusive;

use crate::error::{PvError, PvResult};
use crate::prompts::Prompter;
use crate::story::branch;
use crate::story::client::StoryTracker;
use crate::story::model::{ProjectStoryGroup, Story};
use crate::vcs::VersionControl;

/// Outcome of matching the checked-out branch to a story.
#[derive(Debug)]
pub enum BranchMatch {
    Found(Story),
    /// The branch name carries no `-pv-<id>` marker.
    NoMarker { branch: String },
    /// The marker names a story none of the configured projects have.
    Missing { branch: String, story_id: u64 },
}

impl BranchMatch {
    pub fn into_story(self) -> Option<Story> {
        match self {
            BranchMatch::Found(story) => Some(story),
            _ => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            BranchMatch::Found(story) => story.to_string(),
            BranchMatch::NoMarker { branch } => {
                format!("branch '{branch}' is not linked to a story")
            }
            BranchMatch::Missing { branch, story_id } => {
                format!("story #{story_id} from branch '{branch}' was not found")
            }
        }
    }
}

/// Stories in selection order: each project's stories in listing order,
/// then the create entry when requested.
pub fn flatten_choices(groups: &[ProjectStoryGroup], allow_create: bool) -> Vec<Story> {
    let mut choices: Vec<Story> = groups
        .iter()
        .flat_map(|group| group.stories.iter().cloned())
        .collect();
    if allow_create {
        choices.push(Story::placeholder());
    }
    choices
}

pub fn selection_range(
    groups: &[ProjectStoryGroup],
    allow_create: bool,
) -> RangeInclusive<usize> {
    let stories: usize = groups.iter().map(|group| group.stories.len()).sum();
    1..=stories + usize::from(allow_create)
}

fn choice_labels(groups: &[ProjectStoryGroup], allow_create: bool) -> Vec<String> {
    let mut labels: Vec<String> = groups
        .iter()
        .flat_map(|group| {
            group
                .stories
                .iter()
                .map(move |story| format!("{}: {story}", group.project_name))
        })
        .collect();
    if allow_create {
        labels.push(Story::placeholder().to_string());
    }
    labels
}

pub struct Resolver<'a> {
    tracker: &'a dyn StoryTracker,
    prompter: &'a dyn Prompter,
}

impl<'a> Resolver<'a> {
    pub fn new(tracker: &'a dyn StoryTracker, prompter: &'a dyn Prompter) -> Self {
        Self { tracker, prompter }
    }

    /// Look up `explicit_id` when it is a number, otherwise (or when it is
    /// not found) fall back to choosing from the user's stories.
    pub fn resolve(&self, explicit_id: Option<&str>, allow_create: bool) -> PvResult<Story> {
        if let Some(id) = explicit_id.and_then(|raw| raw.trim().parse::<u64>().ok()) {
            if let Some(story) = self.tracker.find_story(id)? {
                return Ok(story);
            }
            tracing::info!(story_id = id, "explicit story not found, choosing interactively");
        } else if let Some(raw) = explicit_id {
            tracing::debug!("ignoring non-numeric story id {raw:?}");
        }

        let groups = self.tracker.list_my_stories()?;
        self.choose(&groups, allow_create)
    }

    pub fn choose(&self, groups: &[ProjectStoryGroup], allow_create: bool) -> PvResult<Story> {
        let range = selection_range(groups, allow_create);
        if range.is_empty() {
            return Err(PvError::NotFound("no stories are assigned to you".to_string()));
        }

        let index = self
            .prompter
            .choose_index(&choice_labels(groups, allow_create))?;
        if !range.contains(&index) {
            return Err(PvError::InvalidSelection {
                index,
                max: *range.end(),
            });
        }

        flatten_choices(groups, allow_create)
            .into_iter()
            .nth(index - 1)
            .ok_or(PvError::InvalidSelection {
                index,
                max: *range.end(),
            })
    }

    pub fn resolve_from_branch(&self, vcs: &dyn VersionControl) -> PvResult<BranchMatch> {
        let branch = vcs.current_branch_name()?;
        let Some(story_id) = branch::parse_story_id(&branch) else {
            return Ok(BranchMatch::NoMarker { branch });
        };
        match self.tracker.find_story(story_id)? {
            Some(story) => Ok(BranchMatch::Found(story)),
            None => Ok(BranchMatch::Missing { branch, story_id }),
        }
    }
}
