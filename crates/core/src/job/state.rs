//! Job lifecycle states.

use serde::Serialize;
use std::fmt;

/// Stage of a conversion job.
///
/// Jobs move forward through the pipeline and end in exactly one terminal
/// state. Any non-terminal state may fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Fetching,
    Tracing,
    Optimizing,
    Finalizing,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Tracing => "tracing",
            Self::Optimizing => "optimizing",
            Self::Finalizing => "finalizing",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this state.
    pub fn can_transition_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Succeeded | Failed, _) => false,
            (_, Failed) => true,
            (Pending, Fetching) => true,
            (Fetching, Tracing) => true,
            (Tracing, Optimizing | Finalizing) => true,
            (Optimizing, Finalizing) => true,
            (Finalizing, Succeeded) => true,
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let path = [
            JobState::Pending,
            JobState::Fetching,
            JobState::Tracing,
            JobState::Optimizing,
            JobState::Finalizing,
            JobState::Succeeded,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
        assert!(JobState::Tracing.can_transition_to(JobState::Finalizing));
    }

    #[test]
    fn test_terminal_states_are_final() {
        for next in [JobState::Pending, JobState::Fetching, JobState::Failed, JobState::Succeeded] {
            assert!(!JobState::Succeeded.can_transition_to(next));
            assert!(!JobState::Failed.can_transition_to(next));
        }
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!JobState::Pending.can_transition_to(JobState::Tracing));
        assert!(!JobState::Finalizing.can_transition_to(JobState::Tracing));
        assert!(!JobState::Pending.can_transition_to(JobState::Succeeded));
        assert!(JobState::Pending.can_transition_to(JobState::Failed));
    }
}
