use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a single reconciliation of one quota currently stands.
///
/// `Unmanaged -> Reading -> {Noop | Increasing | Error} -> Managed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcilePhase {
    Unmanaged,
    Reading,
    Noop,
    Increasing,
    Error,
    Managed,
}

impl ReconcilePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unmanaged => "unmanaged",
            Self::Reading => "reading",
            Self::Noop => "noop",
            Self::Increasing => "increasing",
            Self::Error => "error",
            Self::Managed => "managed",
        }
    }

    pub fn valid_transitions(&self) -> Vec<ReconcilePhase> {
        match self {
            Self::Unmanaged | Self::Managed => vec![Self::Reading],
            Self::Reading => vec![Self::Noop, Self::Increasing, Self::Error],
            Self::Noop => vec![Self::Managed, Self::Error],
            Self::Increasing => vec![Self::Managed, Self::Error],
            Self::Error => vec![Self::Reading],
        }
    }

    pub fn can_transition_to(&self, next: Self) -> bool {
        self.valid_transitions().contains(&next)
    }
}

impl fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_transitions() {
        assert!(ReconcilePhase::Unmanaged.can_transition_to(ReconcilePhase::Reading));
        assert!(ReconcilePhase::Reading.can_transition_to(ReconcilePhase::Increasing));
        assert!(ReconcilePhase::Increasing.can_transition_to(ReconcilePhase::Managed));
        assert!(!ReconcilePhase::Unmanaged.can_transition_to(ReconcilePhase::Increasing));
        assert!(!ReconcilePhase::Noop.can_transition_to(ReconcilePhase::Increasing));
    }
}
