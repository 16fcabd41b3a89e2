use serde::{Deserialize, Serialize};

use crate::simulation::operator::OperatorId;

/// How close the Operator's own conduct is to being noticed. Stage 0..=3;
/// stage 3 is terminal and forces a termination decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorExposure {
    pub operator: OperatorId,
    pub stage: u8,
    /// 0..=100 internal-affairs awareness of the operator.
    pub awareness: i32,
    pub leak_events: Vec<String>,
}

impl OperatorExposure {
    pub fn new(operator: OperatorId) -> Self {
        Self {
            operator,
            stage: 0,
            awareness: 0,
            leak_events: Vec::new(),
        }
    }
}

/// Advance the exposure stage for every threshold the reluctance score has
/// crossed. Returns the leak-event strings recorded for each new stage.
pub fn advance_stages(
    exposure: &mut OperatorExposure,
    reluctance_score: i32,
    stage_thresholds: &[i32; 3],
) -> Vec<String> {
    let mut events = Vec::new();
    while (exposure.stage as usize) < 3
        && reluctance_score >= stage_thresholds[exposure.stage as usize]
    {
        exposure.stage += 1;
        exposure.awareness = (exposure.awareness + 15).clamp(0, 100);
        let event = format!(
            "Conduct review opened: reluctance pattern crossed stage {} threshold",
            exposure.stage
        );
        exposure.leak_events.push(event.clone());
        events.push(event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_advance_once_per_threshold() {
        let mut exposure = OperatorExposure::new(OperatorId(1));
        let thresholds = [25, 55, 80];

        assert!(advance_stages(&mut exposure, 10, &thresholds).is_empty());
        assert_eq!(exposure.stage, 0);

        let events = advance_stages(&mut exposure, 60, &thresholds);
        assert_eq!(events.len(), 2);
        assert_eq!(exposure.stage, 2);

        // Same score again does not re-fire.
        assert!(advance_stages(&mut exposure, 60, &thresholds).is_empty());

        advance_stages(&mut exposure, 95, &thresholds);
        assert_eq!(exposure.stage, 3);
        advance_stages(&mut exposure, 100, &thresholds);
        assert_eq!(exposure.stage, 3);
    }
}
