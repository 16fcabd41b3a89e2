use serde::{Deserialize, Serialize};

use crate::simulation::neighborhood::NeighborhoodId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct SubjectId(pub u32);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct RecordId(pub u32);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct MessageId(pub u32);

/// A monitored citizen. Domain records live in their own table, keyed back
/// here through the store's per-subject index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub age: u32,
    pub street: String,
    pub neighborhood: NeighborhoodId,
    pub occupation: String,
    /// Advisory cache of the last risk computation. Readers must compare
    /// `risk_computed_at` against the store's touch stamp before trusting it.
    #[serde(default)]
    pub risk_score: Option<f32>,
    #[serde(default)]
    pub risk_computed_at: Option<u64>,
}

/// Partial update for a Subject; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SubjectPatch {
    pub name: Option<String>,
    pub age: Option<u32>,
    pub street: Option<String>,
    pub neighborhood: Option<NeighborhoodId>,
    pub occupation: Option<String>,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DomainKind {
    Health,
    Finance,
    Judicial,
    Location,
    Social,
}

impl DomainKind {
    pub const ALL: [DomainKind; 5] = [
        DomainKind::Health,
        DomainKind::Finance,
        DomainKind::Judicial,
        DomainKind::Location,
        DomainKind::Social,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DomainKind::Health => "health",
            DomainKind::Finance => "finance",
            DomainKind::Judicial => "judicial",
            DomainKind::Location => "location",
            DomainKind::Social => "social",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Employed,
    Unemployed,
    Informal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub conditions: Vec<String>,
    pub chronic: bool,
    pub medications: u32,
    pub last_visit_week: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinanceRecord {
    pub employment: EmploymentStatus,
    pub monthly_income: u32,
    pub debt: u32,
    pub missed_payments: u32,
    pub irregular_deposits: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JudicialRecord {
    pub prior_arrests: u32,
    pub open_case: bool,
    pub associates_flagged: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub home_neighborhood: NeighborhoodId,
    pub frequent_venues: Vec<String>,
    pub night_travel_events: u32,
    pub border_crossings: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialRecord {
    pub post_excerpts: Vec<String>,
    /// Aggregate sentiment of recent posts, -100 (hostile) to 100.
    pub sentiment: i32,
    pub dependents_mentioned: u32,
    pub network_size: u32,
    pub flagged_contacts: u32,
}

/// Strict per-domain payload. Each variant carries its own field set so a
/// partial update can never leak fields across domains.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainData {
    Health(HealthRecord),
    Finance(FinanceRecord),
    Judicial(JudicialRecord),
    Location(LocationRecord),
    Social(SocialRecord),
}

impl DomainData {
    pub fn kind(&self) -> DomainKind {
        match self {
            DomainData::Health(_) => DomainKind::Health,
            DomainData::Finance(_) => DomainKind::Finance,
            DomainData::Judicial(_) => DomainKind::Judicial,
            DomainData::Location(_) => DomainKind::Location,
            DomainData::Social(_) => DomainKind::Social,
        }
    }
}

/// One category of a Subject's file, owned exclusively by that Subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub id: RecordId,
    pub subject: SubjectId,
    pub data: DomainData,
}

/// An intercepted communication attached to a Subject's file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub subject: SubjectId,
    pub week: u32,
    pub text: String,
    pub intercepted: bool,
}
