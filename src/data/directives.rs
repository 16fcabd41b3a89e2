use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{load_json_catalog, ConfigError};
use crate::simulation::subject::DomainKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveDef {
    pub week: u32,
    pub title: String,
    pub brief: String,
    pub required_domains: Vec<DomainKind>,
    pub quota: u32,
    pub severity: u8,
}

/// The ordered campaign of weekly directives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveCatalog {
    pub schema_version: u32,
    pub directives: Vec<DirectiveDef>,
}

pub fn load_directive_catalog(path: impl AsRef<Path>) -> Result<DirectiveCatalog, ConfigError> {
    let catalog: DirectiveCatalog = load_json_catalog(path)?;
    catalog.validate()?;
    Ok(catalog)
}

impl DirectiveCatalog {
    pub fn final_week(&self) -> u32 {
        self.directives.iter().map(|d| d.week).max().unwrap_or(0)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directives.is_empty() {
            return Err(ConfigError::Validation(
                "directive catalog is empty".to_string(),
            ));
        }
        let mut weeks = HashSet::new();
        for def in &self.directives {
            if def.week == 0 {
                return Err(ConfigError::Validation(
                    "directive weeks start at 1".to_string(),
                ));
            }
            if !weeks.insert(def.week) {
                return Err(ConfigError::Validation(format!(
                    "duplicate directive for week {}",
                    def.week
                )));
            }
            if def.quota == 0 {
                return Err(ConfigError::Validation(format!(
                    "directive '{}' has zero quota",
                    def.title
                )));
            }
            if !(1..=10).contains(&def.severity) {
                return Err(ConfigError::Validation(format!(
                    "directive '{}' severity out of 1..=10",
                    def.title
                )));
            }
        }
        // Weeks must form 1..=N with no gaps so progression can always find
        // the next directive until the campaign ends.
        for week in 1..=self.final_week() {
            if !weeks.contains(&week) {
                return Err(ConfigError::Validation(format!(
                    "directive campaign has a gap at week {}",
                    week
                )));
            }
        }
        Ok(())
    }

    pub fn builtin() -> Self {
        fn def(
            week: u32,
            title: &str,
            brief: &str,
            required_domains: &[DomainKind],
            quota: u32,
            severity: u8,
        ) -> DirectiveDef {
            DirectiveDef {
                week,
                title: title.to_string(),
                brief: brief.to_string(),
                required_domains: required_domains.to_vec(),
                quota,
                severity,
            }
        }

        Self {
            schema_version: 1,
            directives: vec![
                def(
                    1,
                    "Baseline Monitoring",
                    "Establish watch files on citizens with hostile sentiment profiles.",
                    &[DomainKind::Social],
                    3,
                    2,
                ),
                def(
                    2,
                    "Financial Irregularities",
                    "Flag undeclared income streams and debt-distress indicators.",
                    &[DomainKind::Finance],
                    3,
                    3,
                ),
                def(
                    3,
                    "Movement Patterns",
                    "Identify repeat night travel and border contact.",
                    &[DomainKind::Location, DomainKind::Judicial],
                    4,
                    5,
                ),
                def(
                    4,
                    "Network Mapping",
                    "Chart contact webs around previously flagged citizens.",
                    &[DomainKind::Social, DomainKind::Location],
                    4,
                    6,
                ),
                def(
                    5,
                    "Preemptive Detention",
                    "Remove escalation candidates before the anniversary march.",
                    &[DomainKind::Judicial, DomainKind::Health],
                    5,
                    8,
                ),
                def(
                    6,
                    "Total Compliance",
                    "Close every remaining elevated file by any available measure.",
                    &[
                        DomainKind::Health,
                        DomainKind::Finance,
                        DomainKind::Judicial,
                        DomainKind::Location,
                        DomainKind::Social,
                    ],
                    5,
                    10,
                ),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_campaign_validates() {
        let catalog = DirectiveCatalog::builtin();
        catalog.validate().unwrap();
        assert_eq!(catalog.final_week(), 6);
    }

    #[test]
    fn week_gap_fails_validation() {
        let mut catalog = DirectiveCatalog::builtin();
        catalog.directives.retain(|d| d.week != 3);
        assert!(matches!(
            catalog.validate(),
            Err(ConfigError::Validation(_))
        ));
    }
}
