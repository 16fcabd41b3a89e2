use serde::{Deserialize, Serialize};

use crate::simulation::directive::DirectiveId;
use crate::simulation::news::ArticleId;
use crate::simulation::operator::OperatorId;
use crate::simulation::protest::ProtestId;
use crate::simulation::subject::SubjectId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ActionId(pub u32);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct RefusalId(pub u32);

/// Every operator action. Citizen, protest and media actions are mutually
/// exclusive target kinds; the catalog binds each type to exactly one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Monitoring,
    Audit,
    TravelRestriction,
    Detention,
    LegalDispersal,
    ForcedDispersal,
    InciteCrackdown,
    PressInjunction,
    DiscreditCampaign,
}

impl ActionType {
    pub fn label(&self) -> &'static str {
        match self {
            ActionType::Monitoring => "enhanced monitoring",
            ActionType::Audit => "financial audit",
            ActionType::TravelRestriction => "travel restriction",
            ActionType::Detention => "preventive detention",
            ActionType::LegalDispersal => "legal dispersal order",
            ActionType::ForcedDispersal => "forced dispersal",
            ActionType::InciteCrackdown => "incited crackdown",
            ActionType::PressInjunction => "press injunction",
            ActionType::DiscreditCampaign => "discredit campaign",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Citizen,
    Protest,
    News,
}

/// The concrete entity an action is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionTarget {
    Citizen(SubjectId),
    Protest(ProtestId),
    News(ArticleId),
}

impl ActionTarget {
    pub fn kind(&self) -> TargetKind {
        match self {
            ActionTarget::Citizen(_) => TargetKind::Citizen,
            ActionTarget::Protest(_) => TargetKind::Protest,
            ActionTarget::News(_) => TargetKind::News,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionResolution {
    Deterministic,
    GambleSuccess,
    GambleFailure,
}

impl ActionResolution {
    pub fn succeeded(&self) -> bool {
        !matches!(self, ActionResolution::GambleFailure)
    }
}

/// Immutable log entry for a submitted flag. Only the store's cascade
/// unlink may clear `subject`; the display snapshot keeps the log readable
/// after the subject is gone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub id: ActionId,
    pub operator: OperatorId,
    pub subject: Option<SubjectId>,
    pub target_kind: TargetKind,
    /// Display snapshot of the target at write time (subject name, protest
    /// cause or article headline).
    pub target_label: String,
    pub directive: DirectiveId,
    pub action: ActionType,
    pub justification: String,
    pub decision_seconds: u32,
    pub hesitation: bool,
    pub resolution: ActionResolution,
    pub week: u32,
}

/// A refuse-to-flag decision. Logged separately from flags so the ending
/// statistics can distinguish the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefusalRecord {
    pub id: RefusalId,
    pub operator: OperatorId,
    pub subject: SubjectId,
    pub directive: DirectiveId,
    pub justification: String,
    pub decision_seconds: u32,
    pub hesitation: bool,
    pub week: u32,
}
