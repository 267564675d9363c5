//! Builder approval lifecycle: `draft → submitted → approved | rejected`, `rejected → draft`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BuilderStatus {
    #[default]
    Draft,
    Submitted,
    Approved,
    Rejected,
}

impl BuilderStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    pub const fn allowed_targets(self) -> &'static [BuilderStatus] {
        match self {
            Self::Draft => &[Self::Submitted],
            Self::Submitted => &[Self::Approved, Self::Rejected],
            Self::Approved => &[],
            Self::Rejected => &[Self::Draft],
        }
    }

    pub fn can_transition_to(self, target: BuilderStatus) -> bool {
        self.allowed_targets().contains(&target)
    }

    /// Check a move without applying it.
    pub fn transition(self, target: BuilderStatus) -> Result<BuilderStatus, TransitionError> {
        if self.can_transition_to(target) {
            Ok(target)
        } else {
            Err(TransitionError {
                from: self,
                to: target,
            })
        }
    }
}

impl fmt::Display for BuilderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Disallowed status move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status transition from {from} to {to}")]
pub struct TransitionError {
    pub from: BuilderStatus,
    pub to: BuilderStatus,
}

impl From<TransitionError> for ServiceError {
    fn from(value: TransitionError) -> Self {
        ServiceError::Validation(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [BuilderStatus; 4] = [
        BuilderStatus::Draft,
        BuilderStatus::Submitted,
        BuilderStatus::Approved,
        BuilderStatus::Rejected,
    ];

    #[test]
    fn only_documented_moves_are_allowed() {
        let allowed = [
            (BuilderStatus::Draft, BuilderStatus::Submitted),
            (BuilderStatus::Submitted, BuilderStatus::Approved),
            (BuilderStatus::Submitted, BuilderStatus::Rejected),
            (BuilderStatus::Rejected, BuilderStatus::Draft),
        ];

        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.transition(to).is_ok(),
                    allowed.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn approved_is_terminal() {
        assert!(BuilderStatus::Approved.allowed_targets().is_empty());
    }

    #[test]
    fn error_names_both_states() {
        let err = BuilderStatus::Draft
            .transition(BuilderStatus::Rejected)
            .expect_err("draft cannot be rejected");
        assert_eq!(
            err.to_string(),
            "Invalid status transition from draft to rejected"
        );
        assert!(matches!(ServiceError::from(err), ServiceError::Validation(_)));
    }
}
