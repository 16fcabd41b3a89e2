use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::action_defs::ActionCatalog;
use crate::data::{load_json_catalog, ConfigError};
use crate::simulation::action::ActionType;
use crate::simulation::outcome::DisruptionTag;
use crate::simulation::time::TimeSkipPeriod;

/// One narrative template, keyed by (action type, time-skip period).
/// Placeholders: {name}, {family_event}, {detention_condition},
/// {connections_lost}, {health_note}, {dependents_note}, {employment_note}.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTemplate {
    pub action: ActionType,
    pub period: TimeSkipPeriod,
    pub text: String,
    #[serde(default)]
    pub tags: Vec<DisruptionTag>,
}

/// Uniform-draw pools for the procedurally selected filler placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillerPools {
    pub family_events: Vec<String>,
    pub detention_conditions: Vec<String>,
    pub connections_lost: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeTemplateCatalog {
    pub schema_version: u32,
    pub templates: Vec<OutcomeTemplate>,
    pub pools: FillerPools,
}

pub fn load_outcome_templates(
    path: impl AsRef<Path>,
) -> Result<OutcomeTemplateCatalog, ConfigError> {
    load_json_catalog(path)
}

const ALL_PERIODS: [TimeSkipPeriod; 4] = [
    TimeSkipPeriod::Immediate,
    TimeSkipPeriod::OneMonth,
    TimeSkipPeriod::SixMonths,
    TimeSkipPeriod::OneYear,
];

impl OutcomeTemplateCatalog {
    pub fn template_for(
        &self,
        action: ActionType,
        period: TimeSkipPeriod,
    ) -> Option<&OutcomeTemplate> {
        self.templates
            .iter()
            .find(|t| t.action == action && t.period == period)
    }

    /// Requires exactly one template per (configured action, period) pair
    /// so outcome generation can never come up empty mid-campaign.
    pub fn validate(&self, actions: &ActionCatalog) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for template in &self.templates {
            if template.text.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "outcome template for {:?}/{:?} has empty text",
                    template.action, template.period
                )));
            }
            if !seen.insert((template.action, template.period)) {
                return Err(ConfigError::Validation(format!(
                    "duplicate outcome template for {:?}/{:?}",
                    template.action, template.period
                )));
            }
        }
        for def in &actions.actions {
            for period in ALL_PERIODS {
                if !seen.contains(&(def.action, period)) {
                    return Err(ConfigError::Validation(format!(
                        "missing outcome template for {:?}/{:?}",
                        def.action, period
                    )));
                }
            }
        }
        if self.pools.family_events.is_empty()
            || self.pools.detention_conditions.is_empty()
            || self.pools.connections_lost.is_empty()
        {
            return Err(ConfigError::Validation(
                "filler pools must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn builtin() -> Self {
        use ActionType::*;
        use DisruptionTag::*;
        use TimeSkipPeriod::*;

        fn t(
            action: ActionType,
            period: TimeSkipPeriod,
            text: &str,
            tags: &[DisruptionTag],
        ) -> OutcomeTemplate {
            OutcomeTemplate {
                action,
                period,
                text: text.to_string(),
                tags: tags.to_vec(),
            }
        }

        let templates = vec![
            // Monitoring
            t(Monitoring, Immediate,
              "{name}'s file is now under continuous watch. {name} has not noticed the extra attention yet.",
              &[Surveilled]),
            t(Monitoring, OneMonth,
              "{name} has started varying routes to work. Neighbors mention {name} seems distracted. {family_event}",
              &[Surveilled]),
            t(Monitoring, SixMonths,
              "{name} speaks carefully on the phone now, even about groceries. {dependents_note} {connections_lost} contacts have gone quiet.",
              &[Surveilled]),
            t(Monitoring, OneYear,
              "A year of observation has produced 214 pages on {name}. {employment_note} {health_note}",
              &[Surveilled]),
            // Audit
            t(Audit, Immediate,
              "{name}'s accounts were frozen pending review. The branch clerk apologized without meeting {name}'s eyes.",
              &[Surveilled]),
            t(Audit, OneMonth,
              "The audit of {name} found nothing actionable, but the employer was notified as procedure requires. {employment_note}",
              &[JobLost]),
            t(Audit, SixMonths,
              "{name} now pays for everything in cash. {family_event} {dependents_note}",
              &[Surveilled]),
            t(Audit, OneYear,
              "{name}'s credit standing never recovered from the audit flag. {employment_note} {connections_lost} former colleagues stopped calling.",
              &[JobLost]),
            // TravelRestriction
            t(TravelRestriction, Immediate,
              "{name} was turned back at the district checkpoint this morning. No reason was given, per policy.",
              &[Relocated]),
            t(TravelRestriction, OneMonth,
              "{name} missed a family funeral in the southern district. {family_event}",
              &[FamilySeparated]),
            t(TravelRestriction, SixMonths,
              "{name} stopped applying for travel permits after the fourth denial. {dependents_note} {health_note}",
              &[FamilySeparated]),
            t(TravelRestriction, OneYear,
              "{name}'s world has shrunk to eleven streets. {employment_note} {connections_lost} connections outside the district have lapsed.",
              &[Relocated, FamilySeparated]),
            // Detention
            t(Detention, Immediate,
              "{name} was taken at 04:10. Processing lists the hold as administrative. {detention_condition}",
              &[Detained]),
            t(Detention, OneMonth,
              "{name} remains in holding. {detention_condition} {dependents_note} {family_event}",
              &[Detained, FamilySeparated]),
            t(Detention, SixMonths,
              "{name} was released without charge after 170 days. The old employer has filled the position. {employment_note} {health_note}",
              &[Detained, JobLost]),
            t(Detention, OneYear,
              "{name} does not talk about the facility. {health_note} {connections_lost} friends no longer visit.",
              &[Detained, FamilySeparated]),
            // LegalDispersal
            t(LegalDispersal, Immediate,
              "The assembly at {name} dissolved when the order was read. Organizers photographed the officers, then left.",
              &[]),
            t(LegalDispersal, OneMonth,
              "The {name} organizers moved to private courtyards. Attendance halved, then stabilized.",
              &[Surveilled]),
            t(LegalDispersal, SixMonths,
              "The injunction around {name} still holds. The square stays empty except for pigeons and one patrol.",
              &[]),
            t(LegalDispersal, OneYear,
              "A year on, the {name} gatherings are a rumor. The legal files remain open in case they return.",
              &[]),
            // ForcedDispersal
            t(ForcedDispersal, Immediate,
              "Units cleared the {name} assembly in forty minutes. {connections_lost} organizers are unaccounted for.",
              &[Detained]),
            t(ForcedDispersal, OneMonth,
              "Footage from the {name} clearance still circulates despite removal orders. Several injured marchers became minor symbols.",
              &[Detained]),
            t(ForcedDispersal, SixMonths,
              "Families of those hurt at {name} petition the ministry weekly. The petitions are logged and shelved.",
              &[FamilySeparated]),
            t(ForcedDispersal, OneYear,
              "The {name} clearance has a memorial now, unofficial, repainted every time it is removed.",
              &[]),
            // InciteCrackdown
            t(InciteCrackdown, Immediate,
              "The agent inside {name} delivered the pretext on schedule. The response teams were already in position.",
              &[Detained]),
            t(InciteCrackdown, OneMonth,
              "Arrest lists from the {name} operation fed three new directives. {connections_lost} secondary contacts were detained.",
              &[Detained]),
            t(InciteCrackdown, SixMonths,
              "Rumors about who threw first at {name} have settled on the wrong man. He left the city.",
              &[Relocated]),
            t(InciteCrackdown, OneYear,
              "The {name} operation is taught internally as a model. Externally it does not exist.",
              &[]),
            // PressInjunction
            t(PressInjunction, Immediate,
              "The injunction landed before the {name} piece ran. The editor filed the draft in a drawer that is already watched.",
              &[]),
            t(PressInjunction, OneMonth,
              "{name} was quietly replaced by a wire-service summary. Two staff writers resigned without statements.",
              &[JobLost]),
            t(PressInjunction, SixMonths,
              "Copies of the suppressed {name} piece circulate hand to hand. Possession is a misdemeanor as of last month.",
              &[Surveilled]),
            t(PressInjunction, OneYear,
              "The {name} injunction expired unnoticed. Nobody republished. That was the point.",
              &[]),
            // DiscreditCampaign
            t(DiscreditCampaign, Immediate,
              "Coordinated complaints against {name} reached the licensing board by noon. The board opened a file.",
              &[]),
            t(DiscreditCampaign, OneMonth,
              "Advertisers withdrew from {name} citing audience concerns. The audience had not changed.",
              &[JobLost]),
            t(DiscreditCampaign, SixMonths,
              "{name} publishes corrections it does not owe, hoping to look careful. Circulation keeps sliding.",
              &[]),
            t(DiscreditCampaign, OneYear,
              "{name} survives as a newsletter run from a kitchen. {connections_lost} former staff now drive taxis or left the city.",
              &[JobLost, Relocated]),
        ];

        Self {
            schema_version: 1,
            templates,
            pools: FillerPools {
                family_events: vec![
                    "Her mother calls less often now.".to_string(),
                    "The children were moved to a state boarding school.".to_string(),
                    "A brother crossed the border and has not written.".to_string(),
                    "The spouse was questioned twice at work.".to_string(),
                    "Relatives have stopped attending family dinners.".to_string(),
                    "A cousin reported the family 'out of civic duty'.".to_string(),
                ],
                detention_conditions: vec![
                    "The cell holds nine; it was built for four.".to_string(),
                    "Lights stay on around the clock in the holding wing.".to_string(),
                    "Visits are permitted monthly, through glass.".to_string(),
                    "Mail arrives opened, when it arrives.".to_string(),
                    "Medical requests are answered within six weeks.".to_string(),
                ],
                connections_lost: vec![2, 3, 5, 8, 12],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_every_action_and_period() {
        let catalog = OutcomeTemplateCatalog::builtin();
        catalog.validate(&ActionCatalog::builtin()).unwrap();
    }

    #[test]
    fn missing_pair_fails_validation() {
        let mut catalog = OutcomeTemplateCatalog::builtin();
        catalog
            .templates
            .retain(|t| !(t.action == ActionType::Detention && t.period == TimeSkipPeriod::OneYear));
        assert!(matches!(
            catalog.validate(&ActionCatalog::builtin()),
            Err(ConfigError::Validation(_))
        ));
    }
}
