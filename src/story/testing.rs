//! In-memory collaborators for exercising the resolver and workflow.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::{PvError, PvResult};
use crate::prompts::Prompter;
use crate::story::client::StoryTracker;
use crate::story::model::{Estimate, ProjectStoryGroup, Story, StoryState, StoryType};
use crate::vcs::{ExternalAction, VersionControl};

#[derive(Debug, Clone, PartialEq)]
pub enum TrackerCall {
    List,
    Find(u64),
    Create(String),
    SetEstimate(u64, u32),
    Transition(u64, StoryState),
}

pub fn story(id: u64, name: &str, story_type: StoryType, estimate: Option<u32>) -> Story {
    Story {
        id: Some(id),
        estimate,
        ..Story::draft(1, name, "", story_type)
    }
}

pub fn group(project_id: u64, name: &str, stories: Vec<Story>) -> ProjectStoryGroup {
    ProjectStoryGroup {
        project_id,
        project_name: name.to_string(),
        stories,
    }
}

#[derive(Default)]
pub struct FakeTracker {
    pub groups: Vec<ProjectStoryGroup>,
    pub create_errors: Vec<String>,
    pub next_id: u64,
    pub calls: RefCell<Vec<TrackerCall>>,
}

impl FakeTracker {
    pub fn with_groups(groups: Vec<ProjectStoryGroup>) -> Self {
        Self {
            groups,
            next_id: 1000,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.calls.borrow().clone()
    }

    pub fn transitions(&self) -> Vec<(u64, StoryState)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                TrackerCall::Transition(id, state) => Some((id, state)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: TrackerCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl StoryTracker for FakeTracker {
    fn project_ids(&self) -> &[u64] {
        &[1]
    }

    fn list_my_stories(&self) -> PvResult<Vec<ProjectStoryGroup>> {
        self.record(TrackerCall::List);
        Ok(self.groups.clone())
    }

    fn find_story(&self, id: u64) -> PvResult<Option<Story>> {
        self.record(TrackerCall::Find(id));
        Ok(self
            .groups
            .iter()
            .flat_map(|group| group.stories.iter())
            .find(|story| story.id == Some(id))
            .cloned())
    }

    fn create_story(&self, draft: &Story) -> PvResult<Story> {
        self.record(TrackerCall::Create(draft.name.clone()));
        let mut story = draft.clone();
        if self.create_errors.is_empty() {
            story.id = Some(self.next_id);
        } else {
            story.errors = self.create_errors.clone();
        }
        Ok(story)
    }

    fn set_estimate(&self, story: &Story, estimate: Estimate) -> PvResult<Story> {
        let id = story.id.ok_or_else(|| PvError::InvalidInput("no id".to_string()))?;
        self.record(TrackerCall::SetEstimate(id, estimate.points()));
        let mut story = story.clone();
        story.estimate = Some(estimate.points());
        Ok(story)
    }

    fn transition_state(&self, story: &Story, state: StoryState) -> PvResult<Story> {
        let id = story.id.ok_or_else(|| PvError::InvalidInput("no id".to_string()))?;
        self.record(TrackerCall::Transition(id, state));
        let mut story = story.clone();
        story.current_state = state;
        Ok(story)
    }
}

pub struct FakeVcs {
    pub branch: String,
    pub create_succeeds: bool,
    pub created: RefCell<Vec<String>>,
    pub staged: RefCell<usize>,
    pub commits: RefCell<Vec<String>>,
}

impl FakeVcs {
    pub fn on_branch(branch: &str) -> Self {
        Self {
            branch: branch.to_string(),
            create_succeeds: true,
            created: RefCell::new(Vec::new()),
            staged: RefCell::new(0),
            commits: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            create_succeeds: false,
            ..Self::on_branch("main")
        }
    }
}

impl VersionControl for FakeVcs {
    fn current_branch_name(&self) -> PvResult<String> {
        Ok(self.branch.clone())
    }

    fn create_and_checkout_branch(&self, name: &str) -> PvResult<bool> {
        self.created.borrow_mut().push(name.to_string());
        Ok(self.create_succeeds)
    }

    fn stage_all(&self) -> PvResult<()> {
        *self.staged.borrow_mut() += 1;
        Ok(())
    }

    fn commit(&self, message: &str) -> PvResult<()> {
        self.commits.borrow_mut().push(message.to_string());
        Ok(())
    }
}

pub struct FakeAction {
    pub succeeds: bool,
    pub titles: RefCell<Vec<String>>,
}

impl FakeAction {
    pub fn new(succeeds: bool) -> Self {
        Self {
            succeeds,
            titles: RefCell::new(Vec::new()),
        }
    }
}

impl ExternalAction for FakeAction {
    fn label(&self) -> &str {
        "fake action"
    }

    fn execute(&self, title: &str) -> PvResult<bool> {
        self.titles.borrow_mut().push(title.to_string());
        Ok(self.succeeds)
    }
}

/// Answers prompts from queues; an exhausted queue is a prompt failure.
#[derive(Default)]
pub struct ScriptedPrompter {
    pub indexes: RefCell<VecDeque<usize>>,
    pub texts: RefCell<VecDeque<String>>,
    pub estimates: RefCell<VecDeque<u32>>,
    pub shown: RefCell<Vec<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn choosing(index: usize) -> Self {
        let prompter = Self::default();
        prompter.indexes.borrow_mut().push_back(index);
        prompter
    }

    pub fn with_texts(self, texts: &[&str]) -> Self {
        self.texts
            .borrow_mut()
            .extend(texts.iter().map(|text| text.to_string()));
        self
    }

    pub fn with_estimate(self, points: u32) -> Self {
        self.estimates.borrow_mut().push_back(points);
        self
    }

    pub fn times_shown(&self) -> usize {
        self.shown.borrow().len()
    }
}

impl Prompter for ScriptedPrompter {
    fn choose_index(&self, labels: &[String]) -> PvResult<usize> {
        self.shown.borrow_mut().push(labels.to_vec());
        self.indexes
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PvError::Prompt("no scripted selection".to_string()))
    }

    fn text(&self, _prompt: &str) -> PvResult<String> {
        self.texts
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PvError::Prompt("no scripted text".to_string()))
    }

    fn estimate(&self) -> PvResult<Estimate> {
        let points = self
            .estimates
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| PvError::Prompt("no scripted estimate".to_string()))?;
        Estimate::new(points)
    }

    fn story_type(&self) -> PvResult<StoryType> {
        Ok(StoryType::Feature)
    }

    fn project(&self, project_ids: &[u64]) -> PvResult<u64> {
        project_ids
            .first()
            .copied()
            .ok_or_else(|| PvError::Config("no projects".to_string()))
    }
}
