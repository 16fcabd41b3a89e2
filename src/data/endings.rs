use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{load_json_catalog, ConfigError};

/// Every boundary of the ending decision table and the operator status
/// transitions. Defaults are provisional tuning values; all of them are
/// overridable from an external table without a code change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndingThresholds {
    pub schema_version: u32,
    pub open_defiance_refusals: u32,
    pub open_defiance_compliance_below: i32,
    pub quiet_saboteur_reluctance: i32,
    pub quiet_saboteur_flags_below: u32,
    pub model_citizen_compliance: i32,
    pub model_citizen_flags: u32,
    pub willing_instrument_compliance: i32,
    /// Compliance below this puts the operator under review.
    pub review_compliance_below: i32,
    /// Compliance below this suspends a reviewed operator.
    pub suspend_compliance_below: i32,
}

impl Default for EndingThresholds {
    fn default() -> Self {
        Self {
            schema_version: 1,
            open_defiance_refusals: 8,
            open_defiance_compliance_below: 25,
            quiet_saboteur_reluctance: 60,
            quiet_saboteur_flags_below: 12,
            model_citizen_compliance: 90,
            model_citizen_flags: 18,
            willing_instrument_compliance: 70,
            review_compliance_below: 40,
            suspend_compliance_below: 20,
        }
    }
}

pub fn load_ending_thresholds(path: impl AsRef<Path>) -> Result<EndingThresholds, ConfigError> {
    load_json_catalog(path)
}
