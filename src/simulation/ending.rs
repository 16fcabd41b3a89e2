use serde::{Deserialize, Serialize};

use crate::data::endings::EndingThresholds;
use crate::simulation::operator::{Operator, OperatorStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingCategory {
    ModelCitizen,
    WillingInstrument,
    Functionary,
    QuietSaboteur,
    OpenDefiance,
    Purged,
}

/// Aggregate statistics shown with the ending card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EndingStats {
    pub lives_disrupted: u32,
    pub detentions: u32,
    pub jobs_lost: u32,
    pub refusals: u32,
    pub flags_submitted: u32,
    pub final_compliance: i32,
    pub final_reluctance: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndingReport {
    pub category: EndingCategory,
    pub stats: EndingStats,
}

/// Map final operator state to a terminal branch. Pure read; every boundary
/// comes from the thresholds table and the rule order is fixed.
pub fn evaluate_ending(
    operator: &Operator,
    stats: EndingStats,
    thresholds: &EndingThresholds,
) -> EndingReport {
    let category = if matches!(
        operator.status,
        OperatorStatus::Suspended | OperatorStatus::Terminated
    ) {
        EndingCategory::Purged
    } else if stats.refusals >= thresholds.open_defiance_refusals
        || operator.compliance < thresholds.open_defiance_compliance_below
    {
        EndingCategory::OpenDefiance
    } else if stats.final_reluctance >= thresholds.quiet_saboteur_reluctance
        && stats.flags_submitted < thresholds.quiet_saboteur_flags_below
    {
        EndingCategory::QuietSaboteur
    } else if operator.compliance >= thresholds.model_citizen_compliance
        && stats.flags_submitted >= thresholds.model_citizen_flags
    {
        EndingCategory::ModelCitizen
    } else if operator.compliance >= thresholds.willing_instrument_compliance {
        EndingCategory::WillingInstrument
    } else {
        EndingCategory::Functionary
    };

    EndingReport { category, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::directive::DirectiveId;
    use crate::simulation::operator::OperatorId;
    use crate::simulation::time::TimeSkipPeriod;

    fn operator(compliance: i32, status: OperatorStatus) -> Operator {
        Operator {
            id: OperatorId(1),
            codename: "K-41".to_string(),
            current_directive: Some(DirectiveId(1)),
            total_flags_submitted: 0,
            reviews_completed: 0,
            compliance,
            hesitation_incidents: 0,
            status,
            week: 6,
            period: TimeSkipPeriod::OneYear,
        }
    }

    #[test]
    fn suspension_always_reads_as_purged() {
        let report = evaluate_ending(
            &operator(95, OperatorStatus::Suspended),
            EndingStats::default(),
            &EndingThresholds::default(),
        );
        assert_eq!(report.category, EndingCategory::Purged);
    }

    #[test]
    fn high_compliance_high_volume_is_model_citizen() {
        let stats = EndingStats {
            flags_submitted: 20,
            ..EndingStats::default()
        };
        let report = evaluate_ending(
            &operator(95, OperatorStatus::Active),
            stats,
            &EndingThresholds::default(),
        );
        assert_eq!(report.category, EndingCategory::ModelCitizen);
    }

    #[test]
    fn refusals_with_low_volume_read_as_sabotage() {
        let stats = EndingStats {
            refusals: 4,
            flags_submitted: 5,
            final_reluctance: 65,
            ..EndingStats::default()
        };
        let report = evaluate_ending(
            &operator(60, OperatorStatus::Active),
            stats,
            &EndingThresholds::default(),
        );
        assert_eq!(report.category, EndingCategory::QuietSaboteur);
    }

    #[test]
    fn middling_record_is_functionary() {
        let stats = EndingStats {
            flags_submitted: 10,
            ..EndingStats::default()
        };
        let report = evaluate_ending(
            &operator(55, OperatorStatus::Active),
            stats,
            &EndingThresholds::default(),
        );
        assert_eq!(report.category, EndingCategory::Functionary);
    }
}
