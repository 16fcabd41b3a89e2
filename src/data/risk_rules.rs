use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::{load_json_catalog, ConfigError};
use crate::rules::correlation::{CorrelationRule, FactorPredicate};
use crate::rules::factors::FactorTrigger;
use crate::rules::risk::{RecommendedAction, RiskLevel, Urgency};
use crate::simulation::action::ActionType;
use crate::simulation::subject::DomainKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactorDef {
    pub id: String,
    pub weight: f32,
    #[serde(flatten)]
    pub trigger: FactorTrigger,
}

/// One step of the score -> level lookup. Bands are checked from the
/// highest `min_score` down; the first one at or below the score wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelBand {
    pub level: RiskLevel,
    pub min_score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationDef {
    pub level: RiskLevel,
    pub action: ActionType,
    pub urgency: Urgency,
}

/// Full risk-engine configuration: factor weights, level boundaries,
/// correlation rules and the level -> action map. The engine knows only the
/// lookup mechanics; every numeric boundary lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskRuleSet {
    pub schema_version: u32,
    pub factors: Vec<RiskFactorDef>,
    pub level_bands: Vec<LevelBand>,
    pub correlation_rules: Vec<CorrelationRule>,
    pub recommendations: Vec<RecommendationDef>,
}

pub fn load_risk_rules(path: impl AsRef<Path>) -> Result<RiskRuleSet, ConfigError> {
    let rules: RiskRuleSet = load_json_catalog(path)?;
    rules.validate()?;
    Ok(rules)
}

impl RiskRuleSet {
    pub fn level_for_score(&self, score: f32) -> RiskLevel {
        let mut best = RiskLevel::Low;
        let mut best_min = f32::MIN;
        for band in &self.level_bands {
            if score >= band.min_score && band.min_score >= best_min {
                best = band.level;
                best_min = band.min_score;
            }
        }
        best
    }

    pub fn recommendations_for(&self, level: RiskLevel) -> Vec<RecommendedAction> {
        self.recommendations
            .iter()
            .filter(|rec| rec.level == level)
            .map(|rec| RecommendedAction {
                action: rec.action,
                urgency: rec.urgency,
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.factors.is_empty() {
            return Err(ConfigError::Validation(
                "risk rule set has no factors".to_string(),
            ));
        }
        let mut ids = HashSet::new();
        for factor in &self.factors {
            if factor.id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "risk factor id cannot be empty".to_string(),
                ));
            }
            if !ids.insert(factor.id.clone()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate risk factor id {}",
                    factor.id
                )));
            }
            if factor.weight <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "risk factor {} has non-positive weight",
                    factor.id
                )));
            }
        }

        if self.level_bands.is_empty() {
            return Err(ConfigError::Validation(
                "risk rule set has no level bands".to_string(),
            ));
        }
        let mut last_min = f32::MIN;
        for band in &self.level_bands {
            if band.min_score < last_min {
                return Err(ConfigError::Validation(
                    "level bands must be ordered by ascending min_score".to_string(),
                ));
            }
            last_min = band.min_score;
        }
        if self.level_bands[0].min_score != 0.0 {
            return Err(ConfigError::Validation(
                "lowest level band must start at score 0".to_string(),
            ));
        }

        for rule in &self.correlation_rules {
            if rule.factor_ids.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "correlation rule {} lists no factors",
                    rule.id
                )));
            }
            for factor_id in &rule.factor_ids {
                if !ids.contains(factor_id) {
                    return Err(ConfigError::Validation(format!(
                        "correlation rule {} references unknown factor {}",
                        rule.id, factor_id
                    )));
                }
            }
            if !(0.0..=1.0).contains(&rule.confidence) {
                return Err(ConfigError::Validation(format!(
                    "correlation rule {} confidence out of range",
                    rule.id
                )));
            }
        }
        Ok(())
    }

    pub fn builtin() -> Self {
        fn factor(id: &str, weight: f32, trigger: FactorTrigger) -> RiskFactorDef {
            RiskFactorDef {
                id: id.to_string(),
                weight,
                trigger,
            }
        }

        let factors = vec![
            factor(
                "missed_payments",
                12.0,
                FactorTrigger::MissedPaymentsAtLeast { count: 2 },
            ),
            factor(
                "debt_ratio",
                10.0,
                FactorTrigger::DebtToIncomeAbove { ratio: 4.0 },
            ),
            factor(
                "irregular_deposits",
                8.0,
                FactorTrigger::IrregularDeposits { count: 2 },
            ),
            factor("chronic_condition", 4.0, FactorTrigger::ChronicCondition),
            factor(
                "medication_load",
                3.0,
                FactorTrigger::MedicationCountAtLeast { count: 3 },
            ),
            factor(
                "prior_arrests",
                15.0,
                FactorTrigger::PriorArrestsAtLeast { count: 1 },
            ),
            factor("open_case", 12.0, FactorTrigger::OpenJudicialCase),
            factor(
                "flagged_associates",
                10.0,
                FactorTrigger::FlaggedAssociatesAtLeast { count: 1 },
            ),
            factor(
                "night_travel",
                8.0,
                FactorTrigger::NightTravelAtLeast { count: 3 },
            ),
            factor(
                "border_crossings",
                9.0,
                FactorTrigger::BorderCrossingsAtLeast { count: 1 },
            ),
            factor(
                "keyword_watchlist",
                14.0,
                FactorTrigger::KeywordMatch {
                    keywords: vec![
                        "curfew".to_string(),
                        "border".to_string(),
                        "strike".to_string(),
                        "march".to_string(),
                        "papers".to_string(),
                    ],
                },
            ),
            factor(
                "negative_sentiment",
                7.0,
                FactorTrigger::NegativeSentimentBelow { threshold: -40 },
            ),
            factor(
                "flagged_contacts",
                9.0,
                FactorTrigger::FlaggedContactsAtLeast { count: 2 },
            ),
            factor(
                "unemployed_dependents",
                6.0,
                FactorTrigger::UnemployedWithDependents,
            ),
        ];

        let level_bands = vec![
            LevelBand {
                level: RiskLevel::Low,
                min_score: 0.0,
            },
            LevelBand {
                level: RiskLevel::Moderate,
                min_score: 25.0,
            },
            LevelBand {
                level: RiskLevel::Elevated,
                min_score: 45.0,
            },
            LevelBand {
                level: RiskLevel::High,
                min_score: 65.0,
            },
            LevelBand {
                level: RiskLevel::Severe,
                min_score: 85.0,
            },
        ];

        fn rule(
            id: &str,
            headline: &str,
            domains: &[DomainKind],
            predicate: FactorPredicate,
            factor_ids: &[&str],
            confidence: f32,
        ) -> CorrelationRule {
            CorrelationRule {
                id: id.to_string(),
                headline: headline.to_string(),
                required_domains: domains.to_vec(),
                predicate,
                factor_ids: factor_ids.iter().map(|s| s.to_string()).collect(),
                confidence,
            }
        }

        let correlation_rules = vec![
            rule(
                "financial_spiral",
                "Financial collapse pattern with hostile rhetoric",
                &[DomainKind::Finance, DomainKind::Social],
                FactorPredicate::AnyTwoOf,
                &["missed_payments", "irregular_deposits", "negative_sentiment"],
                0.7,
            ),
            rule(
                "organizer_pattern",
                "Movement pattern consistent with organizing activity",
                &[DomainKind::Location, DomainKind::Social],
                FactorPredicate::AllOf,
                &["night_travel", "flagged_contacts"],
                0.8,
            ),
            rule(
                "repeat_offender",
                "Prior judicial contact",
                &[DomainKind::Judicial],
                FactorPredicate::AnyOf,
                &["prior_arrests", "open_case"],
                0.9,
            ),
            rule(
                "flight_risk",
                "Exit preparation indicators",
                &[DomainKind::Location, DomainKind::Finance],
                FactorPredicate::AllOf,
                &["border_crossings", "irregular_deposits"],
                0.75,
            ),
        ];

        fn rec(level: RiskLevel, action: ActionType, urgency: Urgency) -> RecommendationDef {
            RecommendationDef {
                level,
                action,
                urgency,
            }
        }

        let recommendations = vec![
            rec(RiskLevel::Low, ActionType::Monitoring, Urgency::Routine),
            rec(RiskLevel::Moderate, ActionType::Monitoring, Urgency::Routine),
            rec(RiskLevel::Moderate, ActionType::Audit, Urgency::Routine),
            rec(RiskLevel::Elevated, ActionType::Audit, Urgency::Elevated),
            rec(
                RiskLevel::Elevated,
                ActionType::TravelRestriction,
                Urgency::Elevated,
            ),
            rec(
                RiskLevel::High,
                ActionType::TravelRestriction,
                Urgency::Immediate,
            ),
            rec(RiskLevel::High, ActionType::Detention, Urgency::Elevated),
            rec(RiskLevel::Severe, ActionType::Detention, Urgency::Immediate),
        ];

        Self {
            schema_version: 1,
            factors,
            level_bands,
            correlation_rules,
            recommendations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_rules_validate() {
        RiskRuleSet::builtin().validate().unwrap();
    }

    #[test]
    fn level_lookup_uses_highest_matching_band() {
        let rules = RiskRuleSet::builtin();
        assert_eq!(rules.level_for_score(0.0), RiskLevel::Low);
        assert_eq!(rules.level_for_score(24.9), RiskLevel::Low);
        assert_eq!(rules.level_for_score(25.0), RiskLevel::Moderate);
        assert_eq!(rules.level_for_score(70.0), RiskLevel::High);
        assert_eq!(rules.level_for_score(100.0), RiskLevel::Severe);
    }

    #[test]
    fn misordered_bands_fail_validation() {
        let mut rules = RiskRuleSet::builtin();
        rules.level_bands.swap(1, 3);
        assert!(matches!(
            rules.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn unknown_correlation_factor_fails_validation() {
        let mut rules = RiskRuleSet::builtin();
        rules.correlation_rules[0]
            .factor_ids
            .push("no_such_factor".to_string());
        assert!(matches!(rules.validate(), Err(ConfigError::Validation(_))));
    }
}
