use crossterm::style::Stylize;

use crate::story::model::{ProjectStoryGroup, Story, StoryState};
use crate::story::transition::Transition;

fn paint(label: String, state: StoryState, styled: bool) -> String {
    if !styled {
        return label;
    }
    match state {
        StoryState::Started => label.yellow().to_string(),
        StoryState::Finished => label.blue().to_string(),
        StoryState::Delivered => label.magenta().to_string(),
        StoryState::Accepted => label.green().to_string(),
        StoryState::Rejected => label.red().to_string(),
        _ => label.dark_grey().to_string(),
    }
}

/// One block per project; story numbers continue across projects so they
/// match the selection numbers.
pub fn render_groups(groups: &[ProjectStoryGroup], styled: bool) -> String {
    let mut out = String::new();
    let mut index = 0;
    for group in groups {
        let header = format!("{} ({})", group.project_name, group.project_id);
        if styled {
            out.push_str(&header.bold().to_string());
        } else {
            out.push_str(&header);
        }
        out.push('\n');
        if group.stories.is_empty() {
            out.push_str("  (no stories)\n");
        }
        for story in &group.stories {
            index += 1;
            let line = format!("{index:>4}) {story}");
            out.push_str(&paint(line, story.current_state, styled));
            out.push('\n');
        }
    }
    out
}

pub fn render_story(story: &Story) -> String {
    let mut out = story.to_string();
    if let Some(description) = story.description.as_deref().filter(|d| !d.trim().is_empty()) {
        out.push_str("\n\n");
        out.push_str(description.trim());
    }
    if let Some(updated) = story.updated_at {
        out.push_str(&format!("\n\nUpdated {}", updated.format("%Y-%m-%d %H:%M")));
    }
    out
}

pub fn render_transition(transition: &Transition) -> String {
    let mut lines = Vec::new();
    if let Some(branch) = &transition.branch {
        lines.push(format!("Switched to new branch {branch}"));
    }
    if transition.advanced {
        lines.push(format!(
            "{} is now {}",
            transition.story,
            transition.story.current_state.as_str()
        ));
    } else {
        lines.push(format!(
            "{} left as {}",
            transition.story,
            transition.story.current_state.as_str()
        ));
    }
    lines.join("\n")
}
