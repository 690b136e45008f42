use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PvError, PvResult};

pub const STORY_URL_BASE: &str = "https://www.pivotaltracker.com/story/show";
pub const CREATE_ENTRY_NAME: &str = "<Create a new story>";
pub const MAX_ESTIMATE: u32 = 8;

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoryType {
    Feature,
    Bug,
    Chore,
    Release,
}

impl StoryType {
    pub const ALL: [StoryType; 4] = [
        StoryType::Feature,
        StoryType::Bug,
        StoryType::Chore,
        StoryType::Release,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoryType::Feature => "feature",
            StoryType::Bug => "bug",
            StoryType::Chore => "chore",
            StoryType::Release => "release",
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoryState {
    Unscheduled,
    Planned,
    Unstarted,
    Started,
    Finished,
    Delivered,
    Accepted,
    Rejected,
}

impl StoryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryState::Unscheduled => "unscheduled",
            StoryState::Planned => "planned",
            StoryState::Unstarted => "unstarted",
            StoryState::Started => "started",
            StoryState::Finished => "finished",
            StoryState::Delivered => "delivered",
            StoryState::Accepted => "accepted",
            StoryState::Rejected => "rejected",
        }
    }

    /// Position in the lifecycle. Rejected stories restart from the bottom.
    pub fn rank(&self) -> u8 {
        match self {
            StoryState::Unscheduled
            | StoryState::Planned
            | StoryState::Unstarted
            | StoryState::Rejected => 0,
            StoryState::Started => 1,
            StoryState::Finished => 2,
            StoryState::Delivered => 3,
            StoryState::Accepted => 4,
        }
    }

    pub fn is_behind(&self, target: StoryState) -> bool {
        self.rank() < target.rank()
    }
}

/// Story points, limited to `0..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate(u32);

impl Estimate {
    pub fn new(points: u32) -> PvResult<Self> {
        if points > MAX_ESTIMATE {
            return Err(PvError::InvalidEstimate(points));
        }
        Ok(Self(points))
    }

    pub fn points(&self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Story {
    /// `None` until the tracker has created the story.
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub story_type: StoryType,
    #[serde(default)]
    pub estimate: Option<u32>,
    pub current_state: StoryState,
    #[serde(default)]
    pub project_id: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub errors: Vec<String>,
}

impl Story {
    pub fn draft(project_id: u64, name: &str, description: &str, story_type: StoryType) -> Self {
        let description = description.trim();
        Self {
            id: None,
            name: name.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            story_type,
            estimate: None,
            current_state: StoryState::Unstarted,
            project_id,
            url: None,
            updated_at: None,
            errors: Vec::new(),
        }
    }

    /// The synthetic "create a new story" entry offered by the resolver.
    pub fn placeholder() -> Self {
        Self::draft(0, CREATE_ENTRY_NAME, "", StoryType::Feature)
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.is_none()
    }

    pub fn needs_estimate(&self) -> bool {
        self.story_type == StoryType::Feature && self.estimate.is_none()
    }

    pub fn browser_url(&self) -> Option<String> {
        self.url
            .clone()
            .or_else(|| self.id.map(|id| format!("{STORY_URL_BASE}/{id}")))
    }
}

impl fmt::Display for Story {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(id) = self.id else {
            return write!(f, "{}", self.name);
        };
        let estimate = match (self.story_type, self.estimate) {
            (_, Some(points)) => format!("{points} pts"),
            (StoryType::Feature, None) => "unestimated".to_string(),
            (_, None) => "-".to_string(),
        };
        write!(
            f,
            "#{id} [{}] {} ({estimate}, {})",
            self.story_type.as_str(),
            self.name,
            self.current_state.as_str()
        )
    }
}

/// Commit message tagged so the tracker links the commit to the story.
pub fn commit_message(story: &Story) -> String {
    match story.id {
        Some(id) => format!("[#{id}] {}", story.name),
        None => story.name.clone(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectStoryGroup {
    pub project_id: u64,
    pub project_name: String,
    pub stories: Vec<Story>,
}
