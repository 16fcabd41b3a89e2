use serde::{Deserialize, Serialize};

use crate::data::endings::EndingThresholds;
use crate::simulation::ending::EndingCategory;
use crate::simulation::exposure::OperatorExposure;
use crate::simulation::operator::{Operator, OperatorStatus};

/// Emitted when an operator status transition fires. The state machine
/// records the transition; only the controller may end the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminationDecision {
    pub new_status: OperatorStatus,
    pub reason: String,
    pub candidate_ending: EndingCategory,
}

/// Evaluate the status transition rules: active -> under_review ->
/// suspended, with exposure stage 3 terminating outright from any state.
pub fn check_termination(
    operator: &Operator,
    exposure: Option<&OperatorExposure>,
    thresholds: &EndingThresholds,
) -> Option<TerminationDecision> {
    if !operator.status.can_act() {
        return None;
    }

    if exposure.is_some_and(|e| e.stage >= 3) {
        return Some(TerminationDecision {
            new_status: OperatorStatus::Terminated,
            reason: "conduct exposure reached stage 3".to_string(),
            candidate_ending: EndingCategory::Purged,
        });
    }

    match operator.status {
        OperatorStatus::UnderReview
            if operator.compliance < thresholds.suspend_compliance_below =>
        {
            Some(TerminationDecision {
                new_status: OperatorStatus::Suspended,
                reason: format!(
                    "compliance {} below suspension floor while under review",
                    operator.compliance
                ),
                candidate_ending: EndingCategory::Purged,
            })
        }
        OperatorStatus::Active if operator.compliance < thresholds.review_compliance_below => {
            Some(TerminationDecision {
                new_status: OperatorStatus::UnderReview,
                reason: format!(
                    "compliance {} fell below review threshold",
                    operator.compliance
                ),
                candidate_ending: EndingCategory::OpenDefiance,
            })
        }
        _ => None,
    }
}
