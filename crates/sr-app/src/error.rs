use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or incomplete request; raised before any side effect.
    #[error("{0}")]
    Validation(String),

    /// A collaborator call failed or answered with a malformed response.
    #[error("Error from {system}: {message}")]
    Upstream { system: &'static str, message: String },

    /// The remote job ended in a non-completed state, or the poll budget ran
    /// out while it was still active.
    #[error("Job {job_id} finished with status {status}")]
    JobFailed { job_id: String, status: String },
}

impl AppError {
    pub fn upstream(system: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            system,
            message: message.into(),
        }
    }
}
