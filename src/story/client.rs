//! Client for the Pivotal Tracker v5 REST API.
//!
//! All calls are blocking; each command issues its requests one at a time
//! and stops at the first transport or service failure. Story lookups skip
//! projects the token cannot read.

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::config::Config;
use crate::error::{PvError, PvResult};
use crate::story::model::{Estimate, ProjectStoryGroup, Story, StoryState};

const TOKEN_HEADER: &str = "X-TrackerToken";

/// Remote operations the resolver and transition engine rely on.
pub trait StoryTracker {
    fn project_ids(&self) -> &[u64];
    fn list_my_stories(&self) -> PvResult<Vec<ProjectStoryGroup>>;
    fn find_story(&self, id: u64) -> PvResult<Option<Story>>;
    /// Validation failures come back on `Story::errors`, not as `Err`.
    fn create_story(&self, draft: &Story) -> PvResult<Story>;
    fn set_estimate(&self, story: &Story, estimate: Estimate) -> PvResult<Story>;
    fn transition_state(&self, story: &Story, state: StoryState) -> PvResult<Story>;
}

#[derive(Debug, Deserialize)]
struct Project {
    name: String,
}

#[derive(Debug, Deserialize)]
pub struct Me {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    general_problem: Option<String>,
    #[serde(default)]
    validation_errors: Vec<FieldProblem>,
}

#[derive(Debug, Deserialize)]
struct FieldProblem {
    field: String,
    problem: String,
}

impl ErrorBody {
    fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    fn problems(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .validation_errors
            .iter()
            .map(|p| format!("{}: {}", p.field, p.problem))
            .collect();
        if let Some(general) = &self.general_problem {
            problems.push(general.clone());
        }
        problems
    }

    fn message(&self, body: &str) -> String {
        self.error
            .clone()
            .or_else(|| self.general_problem.clone())
            .unwrap_or_else(|| body.trim().to_string())
    }
}

/// What a non-success response means for the caller.
#[derive(Debug)]
enum Failure {
    NotFound,
    Validation(Vec<String>),
    Error(PvError),
}

fn classify(status: StatusCode, body: &str) -> Failure {
    let parsed = ErrorBody::parse(body);
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Failure::Error(PvError::Auth),
        StatusCode::NOT_FOUND => Failure::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY
            if !parsed.problems().is_empty() =>
        {
            Failure::Validation(parsed.problems())
        }
        _ => Failure::Error(PvError::Service {
            status: status.as_u16(),
            message: parsed.message(body),
        }),
    }
}

pub struct TrackerClient {
    base_url: String,
    token: String,
    username: String,
    project_ids: Vec<u64>,
    client: Client,
}

impl TrackerClient {
    pub fn new(config: &Config) -> Self {
        Self {
            base_url: config.api_url().trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
            username: config.username.clone(),
            project_ids: config.project_ids.clone(),
            client: Client::new(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client
            .request(method, url)
            .header(TOKEN_HEADER, self.token.as_str())
    }

    fn send(&self, request: RequestBuilder) -> PvResult<Response> {
        request
            .send()
            .map_err(|err| PvError::Network(err.to_string()))
    }

    /// Decode a success body, or report what the failure means.
    fn read<T: DeserializeOwned>(&self, response: Response) -> PvResult<Result<T, Failure>> {
        let status = response.status();
        if status.is_success() {
            let value = response.json().map_err(|err| PvError::Service {
                status: status.as_u16(),
                message: format!("unexpected response body: {err}"),
            })?;
            return Ok(Ok(value));
        }
        let body = response.text().unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "tracker error body: {body}");
        Ok(Err(classify(status, &body)))
    }

    fn get<T: DeserializeOwned>(&self, path: &str) -> PvResult<Option<T>> {
        let response = self.send(self.request(Method::GET, path))?;
        match self.read(response)? {
            Ok(value) => Ok(Some(value)),
            Err(Failure::NotFound) => Ok(None),
            Err(Failure::Validation(problems)) => Err(PvError::Validation(problems)),
            Err(Failure::Error(err)) => Err(err),
        }
    }

    /// POST/PUT a story payload. Validation problems are attached to the
    /// returned story instead of failing the call.
    fn write_story(
        &self,
        method: Method,
        path: &str,
        payload: serde_json::Value,
        fallback: &Story,
    ) -> PvResult<Story> {
        let response = self.send(self.request(method, path).json(&payload))?;
        match self.read::<Story>(response)? {
            Ok(story) => Ok(story),
            Err(Failure::Validation(problems)) => {
                tracing::info!("tracker rejected story: {}", problems.join("; "));
                let mut story = fallback.clone();
                story.errors = problems;
                Ok(story)
            }
            Err(Failure::NotFound) => Err(PvError::NotFound(format!("{path} not found"))),
            Err(Failure::Error(err)) => Err(err),
        }
    }

    fn project_name(&self, project_id: u64) -> PvResult<String> {
        let project: Option<Project> = self.get(&format!("/projects/{project_id}"))?;
        Ok(project
            .map(|p| p.name)
            .unwrap_or_else(|| format!("Project {project_id}")))
    }

    fn story_path(story: &Story) -> PvResult<String> {
        let id = story
            .id
            .ok_or_else(|| PvError::InvalidInput("story has not been created yet".to_string()))?;
        Ok(format!("/projects/{}/stories/{id}", story.project_id))
    }

    /// The account behind the configured token.
    pub fn me(&self) -> PvResult<Me> {
        self.get("/me")?
            .ok_or_else(|| PvError::NotFound("account not found".to_string()))
    }
}

pub fn my_work_filter(username: &str) -> String {
    format!("mywork:{username}")
}

impl StoryTracker for TrackerClient {
    fn project_ids(&self) -> &[u64] {
        &self.project_ids
    }

    fn list_my_stories(&self) -> PvResult<Vec<ProjectStoryGroup>> {
        let filter = urlencoding::encode(&my_work_filter(&self.username)).into_owned();
        let mut groups = Vec::with_capacity(self.project_ids.len());
        for &project_id in &self.project_ids {
            let project_name = self.project_name(project_id)?;
            let stories: Vec<Story> = self
                .get(&format!("/projects/{project_id}/stories?filter={filter}"))?
                .unwrap_or_default();
            tracing::debug!(project_id, count = stories.len(), "listed stories");
            groups.push(ProjectStoryGroup {
                project_id,
                project_name,
                stories,
            });
        }
        Ok(groups)
    }

    fn find_story(&self, id: u64) -> PvResult<Option<Story>> {
        let mut forbidden = 0;
        for &project_id in &self.project_ids {
            match self.get::<Story>(&format!("/projects/{project_id}/stories/{id}")) {
                Ok(Some(story)) => return Ok(Some(story)),
                Ok(None) => {}
                Err(PvError::Auth) => {
                    tracing::warn!(project_id, story_id = id, "no access to project, skipping");
                    forbidden += 1;
                }
                Err(err) => return Err(err),
            }
        }
        if forbidden > 0 && forbidden == self.project_ids.len() {
            return Err(PvError::Auth);
        }
        tracing::info!(story_id = id, "story not found in configured projects");
        Ok(None)
    }

    fn create_story(&self, draft: &Story) -> PvResult<Story> {
        let mut payload = json!({
            "name": draft.name,
            "story_type": draft.story_type,
        });
        if let Some(description) = &draft.description {
            payload["description"] = json!(description);
        }
        if let Some(estimate) = draft.estimate {
            payload["estimate"] = json!(estimate);
        }
        let path = format!("/projects/{}/stories", draft.project_id);
        self.write_story(Method::POST, &path, payload, draft)
    }

    fn set_estimate(&self, story: &Story, estimate: Estimate) -> PvResult<Story> {
        let path = Self::story_path(story)?;
        let payload = json!({ "estimate": estimate.points() });
        self.write_story(Method::PUT, &path, payload, story)
    }

    fn transition_state(&self, story: &Story, state: StoryState) -> PvResult<Story> {
        let path = Self::story_path(story)?;
        let payload = json!({ "current_state": state });
        self.write_story(Method::PUT, &path, payload, story)
    }
}
