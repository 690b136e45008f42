use anyhow::{anyhow, Result};
use dialoguer::{Input, Password, Select};

use crate::config::{parse_project_ids, validate_token, Config};
use crate::error::{PvError, PvResult};
use crate::story::model::{Estimate, StoryType, MAX_ESTIMATE};

/// Interactive input the story workflow depends on.
pub trait Prompter {
    /// Show `labels` numbered from 1 and return the chosen 1-based index.
    fn choose_index(&self, labels: &[String]) -> PvResult<usize>;
    fn text(&self, prompt: &str) -> PvResult<String>;
    fn estimate(&self) -> PvResult<Estimate>;
    fn story_type(&self) -> PvResult<StoryType>;
    fn project(&self, project_ids: &[u64]) -> PvResult<u64>;
}

#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn choose_index(&self, labels: &[String]) -> PvResult<usize> {
        if labels.is_empty() {
            return Err(PvError::NotFound("nothing to choose from".to_string()));
        }
        for (position, label) in labels.iter().enumerate() {
            println!("{:>3}) {label}", position + 1);
        }
        let max = labels.len();
        let index = Input::<usize>::new()
            .with_prompt(format!("Select a story (1-{max})"))
            .validate_with(|value: &usize| -> Result<(), String> {
                if (1..=max).contains(value) {
                    Ok(())
                } else {
                    Err(format!("enter a number between 1 and {max}"))
                }
            })
            .interact_text()?;
        Ok(index)
    }

    fn text(&self, prompt: &str) -> PvResult<String> {
        let value = Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        Ok(value.trim().to_string())
    }

    fn estimate(&self) -> PvResult<Estimate> {
        let points = Input::<u32>::new()
            .with_prompt(format!("Estimate (0-{MAX_ESTIMATE})"))
            .validate_with(|value: &u32| -> Result<(), String> {
                Estimate::new(*value).map(|_| ()).map_err(|err| err.to_string())
            })
            .interact_text()?;
        Estimate::new(points)
    }

    fn story_type(&self) -> PvResult<StoryType> {
        let labels: Vec<&str> = StoryType::ALL.iter().map(StoryType::as_str).collect();
        let selection = Select::new()
            .with_prompt("Story type")
            .items(&labels)
            .default(0)
            .interact()?;
        StoryType::ALL
            .get(selection)
            .copied()
            .ok_or_else(|| PvError::InvalidSelection {
                index: selection + 1,
                max: labels.len(),
            })
    }

    fn project(&self, project_ids: &[u64]) -> PvResult<u64> {
        match project_ids {
            [] => Err(PvError::Config("no projects configured".to_string())),
            [only] => Ok(*only),
            _ => {
                let labels: Vec<String> = project_ids.iter().map(u64::to_string).collect();
                let selection = Select::new()
                    .with_prompt("Project")
                    .items(&labels)
                    .default(0)
                    .interact()?;
                Ok(project_ids[selection])
            }
        }
    }
}

/// Collect the fields `pv setup` writes, pre-filled from any existing config.
pub fn prompt_config(existing: &Config) -> Result<Config> {
    let username = Input::<String>::new()
        .with_prompt("Tracker username")
        .with_initial_text(existing.username.clone())
        .interact_text()?;
    if username.trim().is_empty() {
        return Err(anyhow!("username is required"));
    }

    let api_token = Password::new()
        .with_prompt("API token (32 letters/digits)")
        .validate_with(|value: &String| -> Result<(), &str> {
            if validate_token(value.trim()) {
                Ok(())
            } else {
                Err("token must be 32 letters or digits")
            }
        })
        .interact()?;

    let current_ids = existing
        .project_ids
        .iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let project_ids = Input::<String>::new()
        .with_prompt("Project ids (comma separated)")
        .with_initial_text(current_ids)
        .validate_with(|value: &String| -> Result<(), String> {
            parse_project_ids(value).map(|_| ()).map_err(|err| err.to_string())
        })
        .interact_text()?;

    Ok(Config {
        username: username.trim().to_string(),
        api_token: api_token.trim().to_string(),
        project_ids: parse_project_ids(&project_ids)?,
        ..existing.clone()
    })
}
