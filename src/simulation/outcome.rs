use serde::{Deserialize, Serialize};

use crate::simulation::action::ActionId;
use crate::simulation::time::TimeSkipPeriod;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct OutcomeId(pub u32);

/// What a generated outcome did to the people in it. Used by the ending
/// statistics; derived from the template, never inferred from text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisruptionTag {
    Detained,
    JobLost,
    FamilySeparated,
    Relocated,
    Surveilled,
}

/// One entry of an action's narrative timeline, keyed by (action, period).
/// Append-only; regeneration for a pair that already exists returns the
/// stored record untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    pub id: OutcomeId,
    pub action: ActionId,
    pub period: TimeSkipPeriod,
    pub narrative: String,
    pub tags: Vec<DisruptionTag>,
    pub generated_week: u32,
}
