use crate::HarvestError;
use std::fmt;

/// Lifecycle of a single crawl run
///
/// ```text
/// Seeded -> Running -> Completed | PageBudgetReached | AttemptBudgetReached | Cancelled
/// Seeded -> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Frontier holds only the start URL; no results yet
    Seeded,

    /// Batches are being dispatched
    Running,

    /// Frontier ran dry
    Completed,

    /// The result collection reached `max_pages`
    PageBudgetReached,

    /// Total fetch attempts reached `max_attempts`
    AttemptBudgetReached,

    /// An external stop signal ended the run
    Cancelled,
}

impl RunState {
    /// Returns true if no further work will be dispatched
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Seeded | Self::Running)
    }

    /// Checks whether moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: RunState) -> bool {
        match (self, next) {
            (Self::Seeded, Self::Running) => true,
            (Self::Seeded, Self::Cancelled) => true,
            (Self::Running, next) => next.is_terminal(),
            _ => false,
        }
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: RunState) -> Result<(), HarvestError> {
        if !self.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::PageBudgetReached => "page_budget_reached",
            Self::AttemptBudgetReached => "attempt_budget_reached",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
