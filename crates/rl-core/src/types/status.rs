//! Plan status types.
//!
//! This module provides the [`PlanStatus`] enum for tracking where a
//! relocation plan sits in its lifecycle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The lifecycle status of a migration plan.
///
/// Plans move through `Pending → InProgress → {Completed | Failed}` and may
/// end in `RolledBack`. Every transition is persisted by the plan store.
///
/// # Examples
///
/// ```
/// use rl_core::PlanStatus;
///
/// assert!(PlanStatus::Completed.can_roll_back());
/// assert!(!PlanStatus::Pending.can_roll_back());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum PlanStatus {
    /// Created and persisted, not yet executed.
    #[default]
    Pending,

    /// Execution has started. A plan left in this state after a restart was
    /// interrupted mid-phase.
    InProgress,

    /// Every phase finished successfully.
    Completed,

    /// A phase stopped on its first failing operation.
    Failed,

    /// Every completed step was undone.
    RolledBack,
}

impl PlanStatus {
    /// Returns `true` if a rollback may be started from this status.
    ///
    /// # Examples
    ///
    /// ```
    /// use rl_core::PlanStatus;
    ///
    /// assert!(PlanStatus::Failed.can_roll_back());
    /// assert!(!PlanStatus::RolledBack.can_roll_back());
    /// ```
    #[inline]
    #[must_use]
    pub const fn can_roll_back(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Returns `true` for statuses eligible for retention pruning. Failed
    /// plans stay until rolled back.
    #[inline]
    #[must_use]
    pub const fn is_prunable(self) -> bool {
        matches!(self, Self::Completed | Self::RolledBack)
    }

    /// Returns a human-readable label for this status.
    ///
    /// # Examples
    ///
    /// ```
    /// use rl_core::PlanStatus;
    ///
    /// assert_eq!(PlanStatus::InProgress.label(), "IN_PROGRESS");
    /// ```
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::RolledBack => "ROLLED_BACK",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}
