//! State comparison between a declared and an observed quota.
//!
//! Only increases are actionable. Remote quota services do not support
//! automated decreases, so a declared value below the observed one is a
//! no-op rather than an error.

use serde::Serialize;

use crate::domain::models::{DesiredQuota, ObservedQuota};

/// Direction of the difference between desired and observed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeDirection {
    Increase,
    Decrease,
    Unchanged,
}

/// Result of comparing desired and observed state for one quota.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChangeSet {
    pub needs_increase: bool,
    /// `desired - observed`; negative for a declared decrease
    pub delta: f64,
    pub direction: ChangeDirection,
}

impl ChangeSet {
    pub fn is_noop(&self) -> bool {
        !self.needs_increase
    }
}

/// Compare desired against observed state.
pub fn diff(desired: &DesiredQuota, observed: &ObservedQuota) -> ChangeSet {
    let delta = desired.value - observed.value;
    let direction = if desired.value > observed.value {
        ChangeDirection::Increase
    } else if desired.value < observed.value {
        ChangeDirection::Decrease
    } else {
        ChangeDirection::Unchanged
    };

    ChangeSet {
        needs_increase: direction == ChangeDirection::Increase,
        delta,
        direction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::QuotaIdentity;

    fn pair(desired: f64, observed: f64) -> (DesiredQuota, ObservedQuota) {
        let id = QuotaIdentity::new("vpc", "L-F678F1CE").unwrap();
        (
            DesiredQuota::new(id.clone(), desired).unwrap(),
            ObservedQuota::new(id, observed),
        )
    }

    #[test]
    fn test_increase() {
        let (d, o) = pair(75.0, 70.0);
        let change = diff(&d, &o);
        assert!(change.needs_increase);
        assert_eq!(change.direction, ChangeDirection::Increase);
        assert!((change.delta - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_decrease_is_noop() {
        let (d, o) = pair(75.0, 80.0);
        let change = diff(&d, &o);
        assert!(change.is_noop());
        assert_eq!(change.direction, ChangeDirection::Decrease);
        assert!(change.delta < 0.0);
    }

    #[test]
    fn test_equal_is_noop() {
        let (d, o) = pair(75.0, 75.0);
        let change = diff(&d, &o);
        assert!(change.is_noop());
        assert_eq!(change.direction, ChangeDirection::Unchanged);
    }
}
