use serde::{Deserialize, Serialize};

use crate::simulation::subject::{
    DomainData, DomainKind, EmploymentStatus, FinanceRecord, HealthRecord, JudicialRecord,
    LocationRecord, SocialRecord, SubjectId,
};
use crate::world::store::EntityStore;

/// Read-only view of one subject's domain records, assembled once per
/// assessment so every trigger sees the same data.
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainView<'a> {
    pub health: Option<&'a HealthRecord>,
    pub finance: Option<&'a FinanceRecord>,
    pub judicial: Option<&'a JudicialRecord>,
    pub location: Option<&'a LocationRecord>,
    pub social: Option<&'a SocialRecord>,
}

impl<'a> DomainView<'a> {
    pub fn collect(store: &'a EntityStore, subject: SubjectId) -> Self {
        let mut view = DomainView::default();
        for record in store.records_for(subject) {
            match &record.data {
                DomainData::Health(r) => view.health = Some(r),
                DomainData::Finance(r) => view.finance = Some(r),
                DomainData::Judicial(r) => view.judicial = Some(r),
                DomainData::Location(r) => view.location = Some(r),
                DomainData::Social(r) => view.social = Some(r),
            }
        }
        view
    }

    pub fn present_domains(&self) -> Vec<DomainKind> {
        let mut present = Vec::new();
        if self.health.is_some() {
            present.push(DomainKind::Health);
        }
        if self.finance.is_some() {
            present.push(DomainKind::Finance);
        }
        if self.judicial.is_some() {
            present.push(DomainKind::Judicial);
        }
        if self.location.is_some() {
            present.push(DomainKind::Location);
        }
        if self.social.is_some() {
            present.push(DomainKind::Social);
        }
        present
    }
}

/// Trigger condition of one configured risk factor. Evaluation returns the
/// trigger strength in (0, 1] when the condition holds, `None` otherwise.
/// Strictly deterministic: same records, same strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum FactorTrigger {
    MissedPaymentsAtLeast { count: u32 },
    DebtToIncomeAbove { ratio: f32 },
    IrregularDeposits { count: u32 },
    ChronicCondition,
    MedicationCountAtLeast { count: u32 },
    PriorArrestsAtLeast { count: u32 },
    OpenJudicialCase,
    FlaggedAssociatesAtLeast { count: u32 },
    NightTravelAtLeast { count: u32 },
    BorderCrossingsAtLeast { count: u32 },
    KeywordMatch { keywords: Vec<String> },
    NegativeSentimentBelow { threshold: i32 },
    FlaggedContactsAtLeast { count: u32 },
    UnemployedWithDependents,
}

/// Graded strength for a count-style trigger: the minimum maps to 0.5 and
/// twice the minimum (or more) saturates at 1.0.
fn graded(value: u32, min: u32) -> Option<f32> {
    if value < min.max(1) {
        return None;
    }
    let min = min.max(1) as f32;
    Some((value as f32 / (min * 2.0)).clamp(0.5, 1.0))
}

impl FactorTrigger {
    pub fn domain(&self) -> DomainKind {
        match self {
            FactorTrigger::MissedPaymentsAtLeast { .. }
            | FactorTrigger::DebtToIncomeAbove { .. }
            | FactorTrigger::IrregularDeposits { .. }
            | FactorTrigger::UnemployedWithDependents => DomainKind::Finance,
            FactorTrigger::ChronicCondition | FactorTrigger::MedicationCountAtLeast { .. } => {
                DomainKind::Health
            }
            FactorTrigger::PriorArrestsAtLeast { .. }
            | FactorTrigger::OpenJudicialCase
            | FactorTrigger::FlaggedAssociatesAtLeast { .. } => DomainKind::Judicial,
            FactorTrigger::NightTravelAtLeast { .. }
            | FactorTrigger::BorderCrossingsAtLeast { .. } => DomainKind::Location,
            FactorTrigger::KeywordMatch { .. }
            | FactorTrigger::NegativeSentimentBelow { .. }
            | FactorTrigger::FlaggedContactsAtLeast { .. } => DomainKind::Social,
        }
    }

    pub fn evaluate(&self, view: &DomainView<'_>) -> Option<f32> {
        match self {
            FactorTrigger::MissedPaymentsAtLeast { count } => {
                graded(view.finance?.missed_payments, *count)
            }
            FactorTrigger::DebtToIncomeAbove { ratio } => {
                let finance = view.finance?;
                if finance.monthly_income == 0 {
                    return if finance.debt > 0 { Some(1.0) } else { None };
                }
                let actual = finance.debt as f32 / finance.monthly_income as f32;
                if actual > *ratio {
                    Some((actual / (ratio * 2.0)).clamp(0.5, 1.0))
                } else {
                    None
                }
            }
            FactorTrigger::IrregularDeposits { count } => {
                graded(view.finance?.irregular_deposits, *count)
            }
            FactorTrigger::ChronicCondition => view.health?.chronic.then_some(1.0),
            FactorTrigger::MedicationCountAtLeast { count } => {
                graded(view.health?.medications, *count)
            }
            FactorTrigger::PriorArrestsAtLeast { count } => {
                graded(view.judicial?.prior_arrests, *count)
            }
            FactorTrigger::OpenJudicialCase => view.judicial?.open_case.then_some(1.0),
            FactorTrigger::FlaggedAssociatesAtLeast { count } => {
                graded(view.judicial?.associates_flagged, *count)
            }
            FactorTrigger::NightTravelAtLeast { count } => {
                graded(view.location?.night_travel_events, *count)
            }
            FactorTrigger::BorderCrossingsAtLeast { count } => {
                graded(view.location?.border_crossings, *count)
            }
            FactorTrigger::KeywordMatch { keywords } => {
                let social = view.social?;
                let mut hits = 0u32;
                for keyword in keywords {
                    let keyword = keyword.to_lowercase();
                    if social
                        .post_excerpts
                        .iter()
                        .any(|post| post.to_lowercase().contains(&keyword))
                    {
                        hits += 1;
                    }
                }
                if hits == 0 {
                    return None;
                }
                Some((hits as f32 / keywords.len().max(1) as f32).clamp(0.25, 1.0))
            }
            FactorTrigger::NegativeSentimentBelow { threshold } => {
                let social = view.social?;
                if social.sentiment < *threshold {
                    let depth = (*threshold - social.sentiment) as f32;
                    Some((0.5 + depth / 100.0).clamp(0.5, 1.0))
                } else {
                    None
                }
            }
            FactorTrigger::FlaggedContactsAtLeast { count } => {
                graded(view.social?.flagged_contacts, *count)
            }
            FactorTrigger::UnemployedWithDependents => {
                let finance = view.finance?;
                let social = view.social?;
                (finance.employment == EmploymentStatus::Unemployed
                    && social.dependents_mentioned > 0)
                    .then_some(1.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finance(missed: u32, income: u32, debt: u32) -> FinanceRecord {
        FinanceRecord {
            employment: EmploymentStatus::Employed,
            monthly_income: income,
            debt,
            missed_payments: missed,
            irregular_deposits: 0,
        }
    }

    #[test]
    fn graded_trigger_scales_between_half_and_one() {
        let record = finance(2, 2_000, 0);
        let view = DomainView {
            finance: Some(&record),
            ..DomainView::default()
        };
        let trigger = FactorTrigger::MissedPaymentsAtLeast { count: 2 };
        assert_eq!(trigger.evaluate(&view), Some(0.5));

        let record = finance(4, 2_000, 0);
        let view = DomainView {
            finance: Some(&record),
            ..DomainView::default()
        };
        assert_eq!(trigger.evaluate(&view), Some(1.0));

        let record = finance(1, 2_000, 0);
        let view = DomainView {
            finance: Some(&record),
            ..DomainView::default()
        };
        assert_eq!(trigger.evaluate(&view), None);
    }

    #[test]
    fn missing_domain_never_triggers() {
        let view = DomainView::default();
        assert_eq!(
            FactorTrigger::OpenJudicialCase.evaluate(&view),
            None
        );
        assert_eq!(
            FactorTrigger::KeywordMatch {
                keywords: vec!["border".to_string()]
            }
            .evaluate(&view),
            None
        );
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let social = SocialRecord {
            post_excerpts: vec!["They raised the BORDER fees again".to_string()],
            sentiment: 0,
            dependents_mentioned: 0,
            network_size: 10,
            flagged_contacts: 0,
        };
        let view = DomainView {
            social: Some(&social),
            ..DomainView::default()
        };
        let trigger = FactorTrigger::KeywordMatch {
            keywords: vec!["border".to_string(), "visa".to_string()],
        };
        assert_eq!(trigger.evaluate(&view), Some(0.5));
    }
}
