use thiserror::Error;

/// Failures raised by the story core and its collaborators.
#[derive(Debug, Error)]
pub enum PvError {
    #[error("authentication failed: check the API token in your config")]
    Auth,

    #[error("could not reach the tracker: {0}")]
    Network(String),

    #[error("tracker returned {status}: {message}")]
    Service { status: u16, message: String },

    #[error("story was rejected: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{0}")]
    NotFound(String),

    #[error("selection {index} is out of range (1-{max})")]
    InvalidSelection { index: usize, max: usize },

    #[error("estimate must be between 0 and 8, got {0}")]
    InvalidEstimate(u32),

    #[error("{action} failed: {detail}")]
    ExternalAction { action: String, detail: String },

    #[error("failed to run {program}: {source}")]
    Command {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("prompt failed: {0}")]
    Prompt(String),
}

impl PvError {
    /// Errors the command boundary reports and then returns normally from.
    pub fn is_handled(&self) -> bool {
        !matches!(self, PvError::Command { .. } | PvError::Prompt(_))
    }
}

impl From<dialoguer::Error> for PvError {
    fn from(err: dialoguer::Error) -> Self {
        PvError::Prompt(err.to_string())
    }
}

pub type PvResult<T> = Result<T, PvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_joins_problems() {
        let err = PvError::Validation(vec![
            "name: can't be blank".to_string(),
            "estimate: invalid".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "story was rejected: name: can't be blank; estimate: invalid"
        );
    }

    #[test]
    fn spawn_failures_are_not_handled() {
        let err = PvError::Command {
            program: "git".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(!err.is_handled());
        assert!(PvError::Auth.is_handled());
        assert!(PvError::NotFound("no story".to_string()).is_handled());
    }
}
