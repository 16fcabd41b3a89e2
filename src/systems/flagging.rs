use rand::Rng;
use thiserror::Error;
use tracing::debug;

use crate::data::action_defs::{ActionDef, ResolutionSpec};
use crate::data::SimulationConfig;
use crate::simulation::action::{
    ActionId, ActionRecord, ActionResolution, ActionTarget, ActionType, RefusalId, RefusalRecord,
};
use crate::simulation::exposure::advance_stages;
use crate::simulation::metrics::clamp_metric;
use crate::simulation::neighborhood::NeighborhoodId;
use crate::simulation::news::{ArticleId, EditorialStance, NewsArticle};
use crate::simulation::operator::{OperatorId, OperatorPatch};
use crate::simulation::protest::{ProtestPatch, ProtestStatus};
use crate::simulation::subject::SubjectId;
use crate::systems::termination::{check_termination, TerminationDecision};
use crate::world::store::{EntityStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ActionError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u32 },
    #[error("action unavailable: {0}")]
    Gated(String),
}

impl From<StoreError> for ActionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => ActionError::NotFound { kind, id },
            other => ActionError::Validation(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlagRequest {
    pub operator: OperatorId,
    pub target: ActionTarget,
    pub action: ActionType,
    pub justification: String,
    pub decision_seconds: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlagReport {
    pub action_id: ActionId,
    pub resolution: ActionResolution,
    pub severity: u8,
    pub arrests: u32,
    pub casualties: u32,
    pub article: Option<ArticleId>,
    pub hesitation: bool,
    pub termination: Option<TerminationDecision>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefusalRequest {
    pub operator: OperatorId,
    pub subject: SubjectId,
    pub justification: String,
    pub decision_seconds: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefusalReport {
    pub refusal_id: RefusalId,
    pub hesitation: bool,
    pub termination: Option<TerminationDecision>,
}

/// Everything validation resolved, captured before the first mutation.
struct ValidatedTarget {
    label: String,
    subject: Option<SubjectId>,
    neighborhood: Option<NeighborhoodId>,
}

/// Resolve one flag decision: Validate -> ComputeSeverity -> ResolveOutcome
/// -> ApplySideEffects -> UpdateMetrics -> CheckTermination.
///
/// All validation completes before the first write; a rejected call leaves
/// the store untouched. Gamble actions draw from the rng exactly once and
/// the resolved branch feeds every downstream effect.
pub fn execute_flag<R: Rng>(
    store: &mut EntityStore,
    config: &SimulationConfig,
    rng: &mut R,
    req: &FlagRequest,
) -> Result<FlagReport, ActionError> {
    // Validate.
    let def = config
        .actions
        .def_for(req.action)
        .ok_or_else(|| ActionError::Validation(format!("unknown action type {:?}", req.action)))?
        .clone();

    let operator = store
        .operator(req.operator)
        .ok_or(ActionError::NotFound {
            kind: "operator",
            id: req.operator.0,
        })?
        .clone();
    if !operator.status.can_act() {
        return Err(ActionError::Validation(format!(
            "operator {} is {:?} and cannot act",
            operator.codename, operator.status
        )));
    }
    let directive = operator
        .current_directive
        .ok_or_else(|| ActionError::Validation("operator holds no active directive".to_string()))?;
    if store.directive(directive).is_none() {
        return Err(ActionError::NotFound {
            kind: "directive",
            id: directive.0,
        });
    }
    if req.target.kind() != def.target {
        return Err(ActionError::Validation(format!(
            "{:?} targets {:?}, got {:?}",
            req.action,
            def.target,
            req.target.kind()
        )));
    }
    let target = validate_target(store, &def, &req.target)?;

    // ComputeSeverity is a table lookup. ResolveOutcome draws exactly once
    // per invocation so replaying a seed replays the whole session.
    let roll: f32 = rng.gen();
    let resolution = match def.resolution {
        ResolutionSpec::Deterministic => ActionResolution::Deterministic,
        ResolutionSpec::Gamble { success_chance } => {
            if roll < success_chance {
                ActionResolution::GambleSuccess
            } else {
                ActionResolution::GambleFailure
            }
        }
    };
    let hesitation = req.decision_seconds > config.actions.hesitation_threshold_secs;

    // First mutation: the action record itself.
    let action_id = store.add_action(ActionRecord {
        id: ActionId(0),
        operator: operator.id,
        subject: target.subject,
        target_kind: def.target,
        target_label: target.label.clone(),
        directive,
        action: req.action,
        justification: req.justification.clone(),
        decision_seconds: req.decision_seconds,
        hesitation,
        resolution,
        week: operator.week,
    })?;
    debug!(action = ?req.action, id = action_id.0, ?resolution, "flag recorded");

    store.update_operator(
        operator.id,
        OperatorPatch {
            total_flags_submitted: Some(operator.total_flags_submitted + 1),
            hesitation_incidents: hesitation.then(|| operator.hesitation_incidents + 1),
            compliance: Some(operator.compliance + def.effects.compliance),
            ..OperatorPatch::default()
        },
    )?;

    // ApplySideEffects: additive only, branch chosen by the single draw.
    let (arrests, casualties, article) =
        apply_side_effects(store, &def, &req.target, &target, action_id, resolution, &operator.codename)?;

    // UpdateMetrics: clamp after every delta, tiers derived on read only.
    let effects = def.effects;
    let metrics = &mut store.public_metrics;
    metrics.awareness = clamp_metric(metrics.awareness + effects.awareness);
    metrics.anger = clamp_metric(metrics.anger + effects.anger);
    metrics.trust = clamp_metric(metrics.trust + effects.trust);
    if resolution == ActionResolution::GambleFailure {
        metrics.awareness = clamp_metric(metrics.awareness + effects.failure_awareness);
        metrics.anger = clamp_metric(metrics.anger + effects.failure_anger);
    }
    store.reluctance.score = clamp_metric(store.reluctance.score + effects.reluctance);
    if hesitation {
        store.reluctance.hesitations += 1;
    }

    let reluctance_score = store.reluctance.score;
    if let Some(exposure) = store.exposure_mut(operator.id) {
        advance_stages(
            exposure,
            reluctance_score,
            &config.actions.exposure_stage_thresholds,
        );
    }

    // CheckTermination: record the transition; the controller ends sessions.
    let termination = apply_termination(store, operator.id, config)?;

    Ok(FlagReport {
        action_id,
        resolution,
        severity: def.severity,
        arrests,
        casualties,
        article,
        hesitation,
        termination,
    })
}

/// Reduced pipeline for a refuse-to-flag decision: no severity, no draw, no
/// action record. Fixed compliance penalty, reluctance increment, and the
/// same hesitation check as flagging.
pub fn execute_no_action<R: Rng>(
    store: &mut EntityStore,
    config: &SimulationConfig,
    _rng: &mut R,
    req: &RefusalRequest,
) -> Result<RefusalReport, ActionError> {
    let operator = store
        .operator(req.operator)
        .ok_or(ActionError::NotFound {
            kind: "operator",
            id: req.operator.0,
        })?
        .clone();
    if !operator.status.can_act() {
        return Err(ActionError::Validation(format!(
            "operator {} is {:?} and cannot act",
            operator.codename, operator.status
        )));
    }
    let directive = operator
        .current_directive
        .ok_or_else(|| ActionError::Validation("operator holds no active directive".to_string()))?;
    if store.subject(req.subject).is_none() {
        return Err(ActionError::NotFound {
            kind: "subject",
            id: req.subject.0,
        });
    }

    let hesitation = req.decision_seconds > config.actions.hesitation_threshold_secs;

    let refusal_id = store.add_refusal(RefusalRecord {
        id: RefusalId(0),
        operator: operator.id,
        subject: req.subject,
        directive,
        justification: req.justification.clone(),
        decision_seconds: req.decision_seconds,
        hesitation,
        week: operator.week,
    })?;

    store.update_operator(
        operator.id,
        OperatorPatch {
            compliance: Some(operator.compliance - config.actions.refusal.compliance_penalty),
            hesitation_incidents: hesitation.then(|| operator.hesitation_incidents + 1),
            ..OperatorPatch::default()
        },
    )?;

    store.reluctance.score =
        clamp_metric(store.reluctance.score + config.actions.refusal.reluctance_increase);
    store.reluctance.refusals += 1;
    if hesitation {
        store.reluctance.hesitations += 1;
    }

    let reluctance_score = store.reluctance.score;
    if let Some(exposure) = store.exposure_mut(operator.id) {
        advance_stages(
            exposure,
            reluctance_score,
            &config.actions.exposure_stage_thresholds,
        );
    }

    let termination = apply_termination(store, operator.id, config)?;

    Ok(RefusalReport {
        refusal_id,
        hesitation,
        termination,
    })
}

fn validate_target(
    store: &EntityStore,
    def: &ActionDef,
    target: &ActionTarget,
) -> Result<ValidatedTarget, ActionError> {
    match target {
        ActionTarget::Citizen(id) => {
            let subject = store.subject(*id).ok_or(ActionError::NotFound {
                kind: "subject",
                id: id.0,
            })?;
            Ok(ValidatedTarget {
                label: subject.name.clone(),
                subject: Some(*id),
                neighborhood: Some(subject.neighborhood),
            })
        }
        ActionTarget::Protest(id) => {
            let protest = store.protest(*id).ok_or(ActionError::NotFound {
                kind: "protest",
                id: id.0,
            })?;
            if !protest.status.is_live() {
                return Err(ActionError::Validation(format!(
                    "protest '{}' is already {:?}",
                    protest.cause, protest.status
                )));
            }
            if def.requires_inciting_agent && !protest.has_inciting_agent {
                return Err(ActionError::Gated(format!(
                    "no inciting agent placed in protest '{}'",
                    protest.cause
                )));
            }
            Ok(ValidatedTarget {
                label: protest.cause.clone(),
                subject: None,
                neighborhood: Some(protest.neighborhood),
            })
        }
        ActionTarget::News(id) => {
            let article = store.article(*id).ok_or(ActionError::NotFound {
                kind: "article",
                id: id.0,
            })?;
            if article.suppressed {
                return Err(ActionError::Validation(format!(
                    "article '{}' is already suppressed",
                    article.headline
                )));
            }
            Ok(ValidatedTarget {
                label: article.headline.clone(),
                subject: None,
                neighborhood: None,
            })
        }
    }
}

fn apply_side_effects(
    store: &mut EntityStore,
    def: &ActionDef,
    target: &ActionTarget,
    validated: &ValidatedTarget,
    action_id: ActionId,
    resolution: ActionResolution,
    operator_codename: &str,
) -> Result<(u32, u32, Option<ArticleId>), ActionError> {
    let succeeded = resolution.succeeded();
    let arrests = if succeeded {
        def.effects.arrests_on_success
    } else {
        0
    };
    let casualties = if succeeded {
        0
    } else {
        def.effects.casualties_on_failure
    };

    if let Some(neighborhood) = validated.neighborhood {
        let delta = if succeeded {
            def.effects.unrest
        } else {
            // A botched operation inflames the district instead of cowing it.
            def.effects.unrest.abs() * 2
        };
        if delta != 0 {
            store.adjust_unrest(neighborhood, delta)?;
        }
    }

    let mut article = None;
    match target {
        ActionTarget::Citizen(_) => {
            // High-severity citizen actions are visible enough to make the
            // state broadcast.
            if def.severity >= 7 {
                article = publish(
                    store,
                    EditorialStance::State,
                    format!("Order Preserved: measures taken in {}", validated.label),
                    format!(
                        "Authorities confirmed a {} was executed without incident.",
                        def.action.label()
                    ),
                    action_id,
                )?;
            }
        }
        ActionTarget::Protest(id) => {
            if succeeded {
                let status = match def.action {
                    ActionType::LegalDispersal => ProtestStatus::Dispersed,
                    _ => ProtestStatus::Crushed,
                };
                store.update_protest(
                    *id,
                    ProtestPatch {
                        status: Some(status),
                        momentum: Some(0),
                        ..ProtestPatch::default()
                    },
                )?;
            } else {
                let protest = store.protest(*id).ok_or(ActionError::NotFound {
                    kind: "protest",
                    id: id.0,
                })?;
                let size = protest.size + protest.size / 2;
                let momentum = protest.momentum + 25;
                store.update_protest(
                    *id,
                    ProtestPatch {
                        status: Some(ProtestStatus::Active),
                        momentum: Some(momentum),
                        size: Some(size),
                        ..ProtestPatch::default()
                    },
                )?;
                article = publish(
                    store,
                    EditorialStance::Independent,
                    format!("Crackdown at '{}' leaves {} injured", validated.label, casualties),
                    "Witnesses dispute the official account of last night's operation."
                        .to_string(),
                    action_id,
                )?;
            }
            store.link_protest_action(*id, action_id)?;
        }
        ActionTarget::News(id) => match def.action {
            ActionType::PressInjunction => {
                store.suppress_article(*id)?;
            }
            _ => {
                let channel = store
                    .article(*id)
                    .map(|a| a.channel)
                    .ok_or(ActionError::NotFound {
                        kind: "article",
                        id: id.0,
                    })?;
                if succeeded {
                    store.adjust_channel_credibility(channel, -20)?;
                } else {
                    article = publish(
                        store,
                        EditorialStance::Underground,
                        "Leak: coordinated smear traced to ministry desk".to_string(),
                        format!(
                            "Internal memos name desk officer {} in the campaign.",
                            operator_codename
                        ),
                        action_id,
                    )?;
                }
            }
        },
    }

    Ok((arrests, casualties, article))
}

fn publish(
    store: &mut EntityStore,
    stance: EditorialStance,
    headline: String,
    body: String,
    action_id: ActionId,
) -> Result<Option<ArticleId>, ActionError> {
    let Some(channel) = store.channel_with_stance(stance).map(|c| c.id) else {
        return Ok(None);
    };
    let week = store
        .action(action_id)
        .map(|action| action.week)
        .unwrap_or(0);
    let id = store.add_article(NewsArticle {
        id: ArticleId(0),
        channel,
        headline,
        body,
        week,
        triggering_action: Some(action_id),
        suppressed: false,
    })?;
    Ok(Some(id))
}

fn apply_termination(
    store: &mut EntityStore,
    operator: OperatorId,
    config: &SimulationConfig,
) -> Result<Option<TerminationDecision>, ActionError> {
    let current = store
        .operator(operator)
        .ok_or(ActionError::NotFound {
            kind: "operator",
            id: operator.0,
        })?
        .clone();
    let decision = check_termination(&current, store.exposure(operator), &config.endings);
    if let Some(decision) = &decision {
        store.update_operator(
            operator,
            OperatorPatch {
                status: Some(decision.new_status),
                ..OperatorPatch::default()
            },
        )?;
    }
    Ok(decision)
}
