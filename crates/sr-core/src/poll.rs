use crate::JobStatus;

/// Maximum number of status checks spent on a single job.
pub const POLL_BUDGET: u32 = 20;
/// Seconds to wait between consecutive status checks.
pub const POLL_INTERVAL_SECS: u64 = 5;

/// Next move for the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollStep {
    /// Wait one interval and check status again.
    Continue,
    /// The job finished successfully; fetch its output.
    Completed,
    /// The job reached a terminal status other than completed.
    Failed,
    /// The attempt budget ran out while the job was still active.
    BudgetExhausted,
}

/// Pure transition function for the poll loop. The sleep/timer mechanism
/// lives with the caller so this stays testable without real delays.
pub fn next_step(status: &JobStatus, attempts: u32, budget: u32) -> PollStep {
    if !status.is_active() {
        return if *status == JobStatus::Completed {
            PollStep::Completed
        } else {
            PollStep::Failed
        };
    }
    if attempts >= budget {
        PollStep::BudgetExhausted
    } else {
        PollStep::Continue
    }
}
