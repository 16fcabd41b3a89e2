use serde::{Deserialize, Serialize};

use crate::simulation::subject::DomainKind;

/// How a correlation rule matches against the contributing factor set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorPredicate {
    AllOf,
    AnyOf,
    AnyTwoOf,
}

/// Cross-domain correlation rule, configured externally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationRule {
    pub id: String,
    pub headline: String,
    pub required_domains: Vec<DomainKind>,
    pub predicate: FactorPredicate,
    pub factor_ids: Vec<String>,
    /// Fixed confidence reported with every alert this rule fires.
    pub confidence: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationAlert {
    pub rule_id: String,
    pub headline: String,
    pub confidence: f32,
    pub domains: Vec<DomainKind>,
}

impl CorrelationRule {
    /// A rule fires when its required domains are all present AND its
    /// factor predicate holds over the already-computed contributing set.
    pub fn fires(&self, present_domains: &[DomainKind], contributing_ids: &[&str]) -> bool {
        let domains_ok = self
            .required_domains
            .iter()
            .all(|domain| present_domains.contains(domain));
        if !domains_ok {
            return false;
        }
        let hits = self
            .factor_ids
            .iter()
            .filter(|id| contributing_ids.contains(&id.as_str()))
            .count();
        match self.predicate {
            FactorPredicate::AllOf => hits == self.factor_ids.len() && !self.factor_ids.is_empty(),
            FactorPredicate::AnyOf => hits >= 1,
            FactorPredicate::AnyTwoOf => hits >= 2,
        }
    }
}

/// Evaluate every configured rule against one subject's factor set.
pub fn evaluate_correlations(
    rules: &[CorrelationRule],
    present_domains: &[DomainKind],
    contributing_ids: &[&str],
) -> Vec<CorrelationAlert> {
    rules
        .iter()
        .filter(|rule| rule.fires(present_domains, contributing_ids))
        .map(|rule| CorrelationAlert {
            rule_id: rule.id.clone(),
            headline: rule.headline.clone(),
            confidence: rule.confidence,
            domains: rule.required_domains.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(predicate: FactorPredicate) -> CorrelationRule {
        CorrelationRule {
            id: "r1".to_string(),
            headline: "pattern".to_string(),
            required_domains: vec![DomainKind::Finance, DomainKind::Social],
            predicate,
            factor_ids: vec![
                "missed_payments".to_string(),
                "irregular_deposits".to_string(),
                "negative_sentiment".to_string(),
            ],
            confidence: 0.7,
        }
    }

    const BOTH: [DomainKind; 2] = [DomainKind::Finance, DomainKind::Social];

    #[test]
    fn missing_domain_blocks_the_rule() {
        let rule = rule(FactorPredicate::AnyOf);
        assert!(!rule.fires(&[DomainKind::Finance], &["missed_payments"]));
        assert!(rule.fires(&BOTH, &["missed_payments"]));
    }

    #[test]
    fn any_two_of_needs_two_hits() {
        let rule = rule(FactorPredicate::AnyTwoOf);
        assert!(!rule.fires(&BOTH, &["missed_payments"]));
        assert!(rule.fires(&BOTH, &["missed_payments", "negative_sentiment"]));
    }

    #[test]
    fn all_of_needs_every_listed_factor() {
        let rule = rule(FactorPredicate::AllOf);
        assert!(!rule.fires(&BOTH, &["missed_payments", "negative_sentiment"]));
        assert!(rule.fires(
            &BOTH,
            &["missed_payments", "irregular_deposits", "negative_sentiment"]
        ));
    }
}
