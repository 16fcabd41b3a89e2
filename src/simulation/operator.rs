use serde::{Deserialize, Serialize};

use crate::simulation::directive::DirectiveId;
use crate::simulation::time::TimeSkipPeriod;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct OperatorId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorStatus {
    Active,
    UnderReview,
    Suspended,
    Terminated,
}

impl OperatorStatus {
    /// Suspended and terminated operators can no longer act; the controller
    /// turns their next call into an ending.
    pub fn can_act(&self) -> bool {
        matches!(self, OperatorStatus::Active | OperatorStatus::UnderReview)
    }
}

/// The sole decision-maker of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operator {
    pub id: OperatorId,
    pub codename: String,
    pub current_directive: Option<DirectiveId>,
    pub total_flags_submitted: u32,
    pub reviews_completed: u32,
    /// 0..=100, clamped after every delta.
    pub compliance: i32,
    pub hesitation_incidents: u32,
    pub status: OperatorStatus,
    pub week: u32,
    pub period: TimeSkipPeriod,
}

/// Partial update for an Operator; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct OperatorPatch {
    pub current_directive: Option<Option<DirectiveId>>,
    pub total_flags_submitted: Option<u32>,
    pub reviews_completed: Option<u32>,
    pub compliance: Option<i32>,
    pub hesitation_incidents: Option<u32>,
    pub status: Option<OperatorStatus>,
    pub week: Option<u32>,
    pub period: Option<TimeSkipPeriod>,
}
