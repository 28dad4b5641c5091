use serde::{Deserialize, Serialize};

/// Lifecycle of one ingestion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum RunStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed(String),
}

impl RunStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, RunStatus::Pending)
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, RunStatus::Processing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed(_))
    }

    pub fn can_transition_to(&self, new_status: &RunStatus) -> bool {
        matches!(
            (self, new_status),
            (RunStatus::Pending, RunStatus::Processing)
                | (RunStatus::Pending, RunStatus::Failed(_))
                | (RunStatus::Processing, RunStatus::Completed)
                | (RunStatus::Processing, RunStatus::Failed(_))
        )
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RunStatus::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Short label stored in the `status` column; failure details live in `error_message`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Processing => "processing",
            RunStatus::Completed => "completed",
            RunStatus::Failed(_) => "failed",
        }
    }

    pub fn parse(status: &str, error_message: Option<&str>) -> Result<Self, String> {
        match status.to_lowercase().as_str() {
            "pending" => Ok(RunStatus::Pending),
            "processing" => Ok(RunStatus::Processing),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed(
                error_message.unwrap_or("Unknown error").to_string(),
            )),
            other => Err(format!("Invalid run status: {}", other)),
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State of the out-of-band citation graph population for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GraphStatus {
    #[default]
    Disabled,
    Scheduled,
    Completed,
    Failed,
}

impl GraphStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphStatus::Disabled => "disabled",
            GraphStatus::Scheduled => "scheduled",
            GraphStatus::Completed => "completed",
            GraphStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        match value {
            "disabled" => Ok(GraphStatus::Disabled),
            "scheduled" => Ok(GraphStatus::Scheduled),
            "completed" => Ok(GraphStatus::Completed),
            "failed" => Ok(GraphStatus::Failed),
            other => Err(format!("Invalid graph status: {}", other)),
        }
    }
}

impl std::fmt::Display for GraphStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
