use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::risk_rules::RiskRuleSet;
use crate::rules::correlation::{evaluate_correlations, CorrelationAlert};
use crate::rules::factors::DomainView;
use crate::simulation::action::ActionType;
use crate::simulation::subject::{DomainKind, SubjectId};
use crate::world::store::EntityStore;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    High,
    Severe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Routine,
    Elevated,
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributingFactor {
    pub id: String,
    pub domain: DomainKind,
    pub weight: f32,
    pub strength: f32,
    pub contribution: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedAction {
    pub action: ActionType,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub subject: SubjectId,
    pub score: f32,
    pub level: RiskLevel,
    pub contributing_factors: Vec<ContributingFactor>,
    pub correlation_alerts: Vec<CorrelationAlert>,
    pub recommended_actions: Vec<RecommendedAction>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssessError {
    #[error("subject {} not found", .0.0)]
    UnknownSubject(SubjectId),
}

/// Compute a subject's risk assessment. Pure over (records, rules): no
/// randomness, no clock reads — the case queue sort depends on repeated
/// calls returning bit-identical output.
pub fn assess(
    store: &EntityStore,
    rules: &RiskRuleSet,
    subject: SubjectId,
) -> Result<RiskAssessment, AssessError> {
    if store.subject(subject).is_none() {
        return Err(AssessError::UnknownSubject(subject));
    }
    let view = DomainView::collect(store, subject);
    let present_domains = view.present_domains();

    let mut score = 0.0f32;
    let mut contributing_factors = Vec::new();
    for factor in &rules.factors {
        if let Some(strength) = factor.trigger.evaluate(&view) {
            let contribution = factor.weight * strength;
            score += contribution;
            contributing_factors.push(ContributingFactor {
                id: factor.id.clone(),
                domain: factor.trigger.domain(),
                weight: factor.weight,
                strength,
                contribution,
            });
        }
    }
    let score = score.clamp(0.0, 100.0);
    let level = rules.level_for_score(score);

    let contributing_ids: Vec<&str> = contributing_factors
        .iter()
        .map(|factor| factor.id.as_str())
        .collect();
    let correlation_alerts =
        evaluate_correlations(&rules.correlation_rules, &present_domains, &contributing_ids);

    let recommended_actions = rules.recommendations_for(level);

    Ok(RiskAssessment {
        subject,
        score,
        level,
        contributing_factors,
        correlation_alerts,
        recommended_actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::neighborhood::NeighborhoodId;
    use crate::simulation::subject::{
        DomainData, EmploymentStatus, FinanceRecord, JudicialRecord, SocialRecord, Subject,
    };

    fn store_with_subject() -> (EntityStore, SubjectId) {
        let mut store = EntityStore::default();
        let id = store.add_subject(Subject {
            id: SubjectId(0),
            name: "Mara Vossen".to_string(),
            age: 34,
            street: "12 Karl-Liebknecht-Str".to_string(),
            neighborhood: NeighborhoodId(1),
            occupation: "teacher".to_string(),
            risk_score: None,
            risk_computed_at: None,
        });
        store
            .add_record(
                id,
                DomainData::Finance(FinanceRecord {
                    employment: EmploymentStatus::Unemployed,
                    monthly_income: 800,
                    debt: 14_000,
                    missed_payments: 4,
                    irregular_deposits: 3,
                }),
            )
            .unwrap();
        store
            .add_record(
                id,
                DomainData::Judicial(JudicialRecord {
                    prior_arrests: 2,
                    open_case: true,
                    associates_flagged: 1,
                }),
            )
            .unwrap();
        store
            .add_record(
                id,
                DomainData::Social(SocialRecord {
                    post_excerpts: vec![
                        "the curfew is strangling us".to_string(),
                        "meeting at the border office about papers".to_string(),
                    ],
                    sentiment: -60,
                    dependents_mentioned: 2,
                    network_size: 90,
                    flagged_contacts: 3,
                }),
            )
            .unwrap();
        (store, id)
    }

    #[test]
    fn assess_is_deterministic() {
        let (store, id) = store_with_subject();
        let rules = RiskRuleSet::builtin();
        let first = assess(&store, &rules, id).unwrap();
        let second = assess(&store, &rules, id).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn score_is_clamped_and_level_matches_bands() {
        let (store, id) = store_with_subject();
        let rules = RiskRuleSet::builtin();
        let assessment = assess(&store, &rules, id).unwrap();
        assert!(assessment.score >= 0.0 && assessment.score <= 100.0);
        assert_eq!(assessment.level, rules.level_for_score(assessment.score));
        assert!(!assessment.contributing_factors.is_empty());
        assert!(!assessment.recommended_actions.is_empty());
    }

    #[test]
    fn unknown_subject_is_rejected() {
        let store = EntityStore::default();
        let err = assess(&store, &RiskRuleSet::builtin(), SubjectId(9)).unwrap_err();
        assert_eq!(err, AssessError::UnknownSubject(SubjectId(9)));
    }
}
