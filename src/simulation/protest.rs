use serde::{Deserialize, Serialize};

use crate::simulation::action::ActionId;
use crate::simulation::neighborhood::NeighborhoodId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ProtestId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtestStatus {
    Forming,
    Active,
    Dispersed,
    Crushed,
}

impl ProtestStatus {
    /// Only forming or active protests are valid action targets.
    pub fn is_live(&self) -> bool {
        matches!(self, ProtestStatus::Forming | ProtestStatus::Active)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Protest {
    pub id: ProtestId,
    pub neighborhood: NeighborhoodId,
    pub cause: String,
    pub size: u32,
    /// 0..=100 growth pressure; drives Forming -> Active and decay.
    pub momentum: i32,
    pub status: ProtestStatus,
    pub has_inciting_agent: bool,
    pub week_started: u32,
    pub triggering_action: Option<ActionId>,
}

/// Partial update for a Protest; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ProtestPatch {
    pub size: Option<u32>,
    pub momentum: Option<i32>,
    pub status: Option<ProtestStatus>,
    pub has_inciting_agent: Option<bool>,
}
