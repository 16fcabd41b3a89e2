use rand::Rng;
use thiserror::Error;
use tracing::info;

use crate::data::SimulationConfig;
use crate::narrative::{build_context, instantiate};
use crate::simulation::directive::DirectiveId;
use crate::simulation::operator::{OperatorId, OperatorPatch};
use crate::simulation::outcome::{OutcomeId, OutcomeRecord};
use crate::simulation::time::{period_for_week, TimeSkipPeriod};
use crate::world::store::{EntityStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProgressionError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u32 },
    #[error("directive quota not met: {submitted} of {quota} flags")]
    QuotaNotMet { submitted: u32, quota: u32 },
    #[error("operator cannot advance: {0}")]
    Inactive(String),
    #[error("campaign is already over")]
    CampaignOver,
}

impl From<StoreError> for ProgressionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => ProgressionError::NotFound { kind, id },
            other => ProgressionError::Inactive(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvanceReport {
    pub week: u32,
    pub period: TimeSkipPeriod,
    pub directive: Option<DirectiveId>,
    pub new_outcomes: Vec<OutcomeId>,
    pub campaign_complete: bool,
}

/// Close out the current directive and move the campaign forward one week.
///
/// Gated on the flag quota of the directive the operator currently holds.
/// When the week rollover changes the time-skip period and a next directive
/// exists, an outcome is generated for every flag the operator has ever
/// submitted, keyed `(action, new period)`; pairs that already have an
/// outcome are skipped, so regenerating is idempotent. All narrative text is
/// resolved before the first write and the operator row updates in the same
/// pass, never partially.
pub fn advance_directive<R: Rng>(
    store: &mut EntityStore,
    config: &SimulationConfig,
    rng: &mut R,
    operator_id: OperatorId,
) -> Result<AdvanceReport, ProgressionError> {
    let operator = store
        .operator(operator_id)
        .ok_or(ProgressionError::NotFound {
            kind: "operator",
            id: operator_id.0,
        })?
        .clone();
    if !operator.status.can_act() {
        return Err(ProgressionError::Inactive(format!(
            "operator {} is {:?}",
            operator.codename, operator.status
        )));
    }
    let current = operator
        .current_directive
        .ok_or(ProgressionError::CampaignOver)?;
    let quota = store
        .directive(current)
        .ok_or(ProgressionError::NotFound {
            kind: "directive",
            id: current.0,
        })?
        .quota;

    let submitted = store
        .actions_for_operator(operator_id)
        .iter()
        .filter(|action| action.directive == current)
        .count() as u32;
    if submitted < quota {
        return Err(ProgressionError::QuotaNotMet { submitted, quota });
    }

    let next_week = operator.week + 1;
    let next_period = period_for_week(next_week);
    let next_directive = store.directive_for_week(next_week).map(|d| d.id);
    let campaign_complete = next_directive.is_none();

    // Resolve every outcome narrative up front; the write pass below cannot
    // fail part-way through.
    let mut pending: Vec<OutcomeRecord> = Vec::new();
    if next_period != operator.period && !campaign_complete {
        for action in store.actions_for_operator(operator_id) {
            if store.outcome_for(action.id, next_period).is_some() {
                continue;
            }
            let Some(template) = config.templates.template_for(action.action, next_period) else {
                continue;
            };
            let context = build_context(
                store,
                action.subject,
                &action.target_label,
                &config.templates.pools,
                rng,
            );
            pending.push(OutcomeRecord {
                id: OutcomeId(0),
                action: action.id,
                period: next_period,
                narrative: instantiate(&template.text, &context),
                tags: template.tags.clone(),
                generated_week: next_week,
            });
        }
    }

    let mut new_outcomes = Vec::with_capacity(pending.len());
    for outcome in pending {
        new_outcomes.push(store.add_outcome(outcome)?);
    }
    store.update_operator(
        operator_id,
        OperatorPatch {
            current_directive: Some(next_directive),
            reviews_completed: Some(operator.reviews_completed + 1),
            week: Some(next_week),
            period: Some(next_period),
            ..OperatorPatch::default()
        },
    )?;
    info!(
        week = next_week,
        period = ?next_period,
        outcomes = new_outcomes.len(),
        campaign_complete,
        "directive closed"
    );

    Ok(AdvanceReport {
        week: next_week,
        period: next_period,
        directive: next_directive,
        new_outcomes,
        campaign_complete,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::mock::StepRng;

    use crate::simulation::action::{ActionTarget, ActionType};
    use crate::simulation::directive::Directive;
    use crate::simulation::exposure::OperatorExposure;
    use crate::simulation::neighborhood::{Neighborhood, NeighborhoodId};
    use crate::simulation::operator::{Operator, OperatorStatus};
    use crate::simulation::subject::{Subject, SubjectId};
    use crate::systems::flagging::{execute_flag, FlagRequest};

    fn fixture() -> (EntityStore, SimulationConfig, OperatorId, SubjectId) {
        let mut store = EntityStore::default();
        let config = SimulationConfig::builtin();
        let hood = store.add_neighborhood(Neighborhood {
            id: NeighborhoodId(0),
            name: "Veldt Quarter".to_string(),
            population: 41_000,
            unrest: 20,
        });
        let subject = store.add_subject(Subject {
            id: SubjectId(0),
            name: "Mara Vossen".to_string(),
            age: 34,
            street: "Kanaalstraat 12".to_string(),
            neighborhood: hood,
            occupation: "archivist".to_string(),
            risk_score: None,
            risk_computed_at: None,
        });
        for def in &config.directives.directives {
            store.add_directive(Directive {
                id: DirectiveId(0),
                week: def.week,
                title: def.title.clone(),
                brief: def.brief.clone(),
                required_domains: def.required_domains.clone(),
                quota: def.quota,
                severity: def.severity,
            });
        }
        let first = store.directive_for_week(1).map(|d| d.id);
        let operator = store.add_operator(Operator {
            id: OperatorId(0),
            codename: "K-41".to_string(),
            current_directive: first,
            total_flags_submitted: 0,
            reviews_completed: 0,
            compliance: 50,
            hesitation_incidents: 0,
            status: OperatorStatus::Active,
            week: 1,
            period: TimeSkipPeriod::Immediate,
        });
        store.insert_exposure(OperatorExposure::new(operator));
        (store, config, operator, subject)
    }

    fn meet_quota(
        store: &mut EntityStore,
        config: &SimulationConfig,
        op: OperatorId,
        subject: SubjectId,
    ) {
        let current = store.operator(op).unwrap().current_directive.unwrap();
        let quota = store.directive(current).unwrap().quota;
        let already = store
            .actions_for_operator(op)
            .iter()
            .filter(|a| a.directive == current)
            .count() as u32;
        let mut rng = StepRng::new(0, 0);
        for _ in already..quota {
            execute_flag(
                store,
                config,
                &mut rng,
                &FlagRequest {
                    operator: op,
                    target: ActionTarget::Citizen(subject),
                    action: ActionType::Monitoring,
                    justification: "quota".to_string(),
                    decision_seconds: 5,
                },
            )
            .unwrap();
        }
    }

    #[test]
    fn advance_is_blocked_until_the_quota_is_met() {
        let (mut store, config, op, _) = fixture();
        let mut rng = StepRng::new(0, 0);
        let err = advance_directive(&mut store, &config, &mut rng, op).unwrap_err();
        assert!(matches!(err, ProgressionError::QuotaNotMet { submitted: 0, .. }));
    }

    #[test]
    fn week_two_rollover_generates_one_month_outcomes() {
        let (mut store, config, op, subject) = fixture();
        meet_quota(&mut store, &config, op, subject);
        let flags = store.actions_for_operator(op).len();

        let mut rng = StepRng::new(0, 0);
        let report = advance_directive(&mut store, &config, &mut rng, op).unwrap();

        assert_eq!(report.week, 2);
        assert_eq!(report.period, TimeSkipPeriod::OneMonth);
        assert!(!report.campaign_complete);
        assert_eq!(report.new_outcomes.len(), flags);
        let operator = store.operator(op).unwrap();
        assert_eq!(operator.week, 2);
        assert_eq!(operator.reviews_completed, 1);
        assert_eq!(operator.current_directive, report.directive);
        for id in &report.new_outcomes {
            let outcome = store.outcome(*id).unwrap();
            assert_eq!(outcome.period, TimeSkipPeriod::OneMonth);
            assert!(outcome.narrative.contains("Mara Vossen"));
        }
    }

    #[test]
    fn same_period_rollover_generates_nothing() {
        let (mut store, config, op, subject) = fixture();
        // Weeks 3 and 4 are both SixMonths.
        let mut rng = StepRng::new(0, 0);
        for _ in 0..2 {
            meet_quota(&mut store, &config, op, subject);
            advance_directive(&mut store, &config, &mut rng, op).unwrap();
        }
        let before = store.outcomes_sorted().len();

        meet_quota(&mut store, &config, op, subject);
        let report = advance_directive(&mut store, &config, &mut rng, op).unwrap();
        assert_eq!(report.week, 4);
        assert_eq!(report.period, TimeSkipPeriod::SixMonths);
        assert!(report.new_outcomes.is_empty());
        assert_eq!(store.outcomes_sorted().len(), before);
    }

    #[test]
    fn existing_period_pairs_are_never_regenerated() {
        let (mut store, config, op, subject) = fixture();
        meet_quota(&mut store, &config, op, subject);
        let mut rng = StepRng::new(0, 0);
        let first = advance_directive(&mut store, &config, &mut rng, op).unwrap();
        assert!(!first.new_outcomes.is_empty());

        // Week 3 changes the period again; only the new pairs appear, and the
        // week-2 outcomes stay byte-identical.
        let kept: Vec<OutcomeRecord> = first
            .new_outcomes
            .iter()
            .map(|id| store.outcome(*id).unwrap().clone())
            .collect();
        meet_quota(&mut store, &config, op, subject);
        advance_directive(&mut store, &config, &mut rng, op).unwrap();
        for outcome in kept {
            assert_eq!(store.outcome(outcome.id), Some(&outcome));
        }
    }

    #[test]
    fn final_week_ends_the_campaign_without_an_outcome_pass() {
        let (mut store, config, op, subject) = fixture();
        let mut rng = StepRng::new(0, 0);
        let final_week = config.directives.final_week();
        let mut last = None;
        for _ in 1..=final_week {
            meet_quota(&mut store, &config, op, subject);
            last = Some(advance_directive(&mut store, &config, &mut rng, op).unwrap());
        }
        let last = last.unwrap();
        assert!(last.campaign_complete);
        assert_eq!(last.directive, None);
        assert!(last.new_outcomes.is_empty());
        assert_eq!(store.operator(op).unwrap().current_directive, None);

        let err = advance_directive(&mut store, &config, &mut rng, op).unwrap_err();
        assert!(matches!(err, ProgressionError::CampaignOver));
    }
}
