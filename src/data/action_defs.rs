use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{load_json_catalog, ConfigError};
use crate::simulation::action::{ActionType, TargetKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResolutionSpec {
    /// Always succeeds (legal/administrative actions).
    Deterministic,
    /// One random draw per invocation against `success_chance`.
    Gamble { success_chance: f32 },
}

/// Signed metric deltas and side-effect magnitudes for one action type.
/// `failure_*` fields apply only on a failed gamble, on top of the base
/// deltas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct EffectSpec {
    pub awareness: i32,
    pub anger: i32,
    pub trust: i32,
    pub compliance: i32,
    pub reluctance: i32,
    pub unrest: i32,
    pub arrests_on_success: u32,
    pub casualties_on_failure: u32,
    pub failure_awareness: i32,
    pub failure_anger: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub action: ActionType,
    pub target: TargetKind,
    /// 1..=10 severity used for narrative weighting and article triggers.
    pub severity: u8,
    /// Base probability that the public pushes back; feeds the feed systems.
    pub backlash: f32,
    pub resolution: ResolutionSpec,
    #[serde(default)]
    pub requires_inciting_agent: bool,
    pub effects: EffectSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefusalDef {
    pub compliance_penalty: i32,
    pub reluctance_increase: i32,
}

/// Action-type table plus the fixed decision parameters shared by both
/// pipelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCatalog {
    pub schema_version: u32,
    pub actions: Vec<ActionDef>,
    pub refusal: RefusalDef,
    pub hesitation_threshold_secs: u32,
    /// Reluctance scores at which the exposure stage advances to 1, 2, 3.
    pub exposure_stage_thresholds: [i32; 3],
}

pub fn load_action_catalog(path: impl AsRef<Path>) -> Result<ActionCatalog, ConfigError> {
    let catalog: ActionCatalog = load_json_catalog(path)?;
    catalog.validate()?;
    Ok(catalog)
}

impl ActionCatalog {
    pub fn def_for(&self, action: ActionType) -> Option<&ActionDef> {
        self.actions.iter().find(|def| def.action == action)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actions.is_empty() {
            return Err(ConfigError::Validation(
                "action catalog is empty".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for def in &self.actions {
            if !seen.insert(def.action) {
                return Err(ConfigError::Validation(format!(
                    "duplicate action definition for {:?}",
                    def.action
                )));
            }
            if !(1..=10).contains(&def.severity) {
                return Err(ConfigError::Validation(format!(
                    "action {:?} severity out of 1..=10",
                    def.action
                )));
            }
            if !(0.0..=1.0).contains(&def.backlash) {
                return Err(ConfigError::Validation(format!(
                    "action {:?} backlash out of range",
                    def.action
                )));
            }
            if let ResolutionSpec::Gamble { success_chance } = def.resolution {
                if !(0.0..1.0).contains(&success_chance) || success_chance == 0.0 {
                    return Err(ConfigError::Validation(format!(
                        "action {:?} gamble chance must be in (0, 1)",
                        def.action
                    )));
                }
            }
        }
        let [first, second, third] = self.exposure_stage_thresholds;
        if !(first < second && second < third) {
            return Err(ConfigError::Validation(
                "exposure stage thresholds must be strictly increasing".to_string(),
            ));
        }
        Ok(())
    }

    pub fn builtin() -> Self {
        fn def(
            action: ActionType,
            target: TargetKind,
            severity: u8,
            backlash: f32,
            resolution: ResolutionSpec,
            requires_inciting_agent: bool,
            effects: EffectSpec,
        ) -> ActionDef {
            ActionDef {
                action,
                target,
                severity,
                backlash,
                resolution,
                requires_inciting_agent,
                effects,
            }
        }

        let actions = vec![
            def(
                ActionType::Monitoring,
                TargetKind::Citizen,
                2,
                0.05,
                ResolutionSpec::Deterministic,
                false,
                EffectSpec {
                    awareness: 1,
                    compliance: 2,
                    trust: 0,
                    ..EffectSpec::default()
                },
            ),
            def(
                ActionType::Audit,
                TargetKind::Citizen,
                3,
                0.10,
                ResolutionSpec::Deterministic,
                false,
                EffectSpec {
                    awareness: 2,
                    anger: 1,
                    compliance: 3,
                    ..EffectSpec::default()
                },
            ),
            def(
                ActionType::TravelRestriction,
                TargetKind::Citizen,
                5,
                0.20,
                ResolutionSpec::Deterministic,
                false,
                EffectSpec {
                    awareness: 3,
                    anger: 2,
                    trust: -2,
                    compliance: 4,
                    unrest: 2,
                    ..EffectSpec::default()
                },
            ),
            def(
                ActionType::Detention,
                TargetKind::Citizen,
                8,
                0.35,
                ResolutionSpec::Deterministic,
                false,
                EffectSpec {
                    awareness: 5,
                    anger: 5,
                    trust: -4,
                    compliance: 5,
                    unrest: 4,
                    arrests_on_success: 1,
                    ..EffectSpec::default()
                },
            ),
            def(
                ActionType::LegalDispersal,
                TargetKind::Protest,
                4,
                0.15,
                ResolutionSpec::Deterministic,
                false,
                EffectSpec {
                    awareness: 2,
                    anger: 2,
                    compliance: 3,
                    unrest: -3,
                    ..EffectSpec::default()
                },
            ),
            def(
                ActionType::ForcedDispersal,
                TargetKind::Protest,
                7,
                0.45,
                ResolutionSpec::Gamble {
                    success_chance: 0.6,
                },
                false,
                EffectSpec {
                    awareness: 6,
                    anger: 6,
                    trust: -5,
                    compliance: 4,
                    unrest: 5,
                    arrests_on_success: 24,
                    casualties_on_failure: 7,
                    failure_awareness: 8,
                    failure_anger: 10,
                    ..EffectSpec::default()
                },
            ),
            def(
                ActionType::InciteCrackdown,
                TargetKind::Protest,
                9,
                0.55,
                ResolutionSpec::Gamble {
                    success_chance: 0.55,
                },
                true,
                EffectSpec {
                    awareness: 4,
                    anger: 5,
                    trust: -6,
                    compliance: 5,
                    reluctance: 2,
                    unrest: 6,
                    arrests_on_success: 40,
                    casualties_on_failure: 12,
                    failure_awareness: 12,
                    failure_anger: 14,
                },
            ),
            def(
                ActionType::PressInjunction,
                TargetKind::News,
                4,
                0.15,
                ResolutionSpec::Deterministic,
                false,
                EffectSpec {
                    awareness: -3,
                    trust: 1,
                    compliance: 3,
                    ..EffectSpec::default()
                },
            ),
            def(
                ActionType::DiscreditCampaign,
                TargetKind::News,
                6,
                0.30,
                ResolutionSpec::Gamble {
                    success_chance: 0.65,
                },
                false,
                EffectSpec {
                    awareness: -2,
                    anger: 1,
                    trust: -1,
                    compliance: 4,
                    failure_awareness: 9,
                    failure_anger: 6,
                    ..EffectSpec::default()
                },
            ),
        ];

        Self {
            schema_version: 1,
            actions,
            refusal: RefusalDef {
                compliance_penalty: 8,
                reluctance_increase: 6,
            },
            hesitation_threshold_secs: 30,
            exposure_stage_thresholds: [25, 55, 80],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_validates() {
        ActionCatalog::builtin().validate().unwrap();
    }

    #[test]
    fn every_action_type_is_defined() {
        let catalog = ActionCatalog::builtin();
        for action in [
            ActionType::Monitoring,
            ActionType::Audit,
            ActionType::TravelRestriction,
            ActionType::Detention,
            ActionType::LegalDispersal,
            ActionType::ForcedDispersal,
            ActionType::InciteCrackdown,
            ActionType::PressInjunction,
            ActionType::DiscreditCampaign,
        ] {
            assert!(catalog.def_for(action).is_some(), "{:?} missing", action);
        }
    }

    #[test]
    fn bad_gamble_chance_fails_validation() {
        let mut catalog = ActionCatalog::builtin();
        for def in &mut catalog.actions {
            if def.action == ActionType::ForcedDispersal {
                def.resolution = ResolutionSpec::Gamble { success_chance: 1.2 };
            }
        }
        assert!(matches!(
            catalog.validate(),
            Err(ConfigError::Validation(_))
        ));
    }
}
