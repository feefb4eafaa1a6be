use std::fmt;

/// Status vocabulary reported by the render service for a submitted job.
///
/// Anything outside the known set parses to `Unknown` and is treated as a
/// terminal failure, never polled further.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    InQueue,
    InProgress,
    Completed,
    Failed,
    Unknown(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "IN_QUEUE" => Self::InQueue,
            "IN_PROGRESS" => Self::InProgress,
            "COMPLETED" => Self::Completed,
            "FAILED" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Still worth polling: the job has not reached a terminal state yet.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InQueue | Self::InProgress)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InQueue => write!(f, "IN_QUEUE"),
            Self::InProgress => write!(f, "IN_PROGRESS"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Unknown(raw) => write!(f, "{raw}"),
        }
    }
}
