use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolverError {
    // Malformed instance: blocked or out-of-bounds endpoint, duplicate
    // starts/goals, ragged grid.
    InvalidInput { reason: String },
    // No joint solution exists under the explored constraints.
    Infeasible,
    // The search gave up before reaching a conclusion.
    BudgetExceeded { what: &'static str, limit: usize },
}

impl SolverError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        SolverError::InvalidInput {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidInput { reason } => write!(f, "invalid input: {reason}"),
            Self::Infeasible => write!(f, "instance has no conflict-free solution"),
            Self::BudgetExceeded { what, limit } => {
                write!(f, "{what} budget of {limit} exceeded")
            }
        }
    }
}

impl std::error::Error for SolverError {}
