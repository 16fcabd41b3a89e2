use serde::{Deserialize, Serialize};

/// Clamp helper shared by every continuous 0..=100 metric.
pub fn clamp_metric(value: i32) -> i32 {
    value.clamp(0, 100)
}

/// Singleton public-opinion counters. Tiers are never stored; they are
/// recomputed from the continuous score on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublicMetrics {
    pub awareness: i32,
    pub anger: i32,
    pub trust: i32,
}

impl Default for PublicMetrics {
    fn default() -> Self {
        Self {
            awareness: 20,
            anger: 10,
            trust: 70,
        }
    }
}

/// Singleton counters for the Operator's drift away from the program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ReluctanceMetrics {
    pub score: i32,
    pub refusals: u32,
    pub hesitations: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MetricTier {
    Dormant,
    Stirring,
    Agitated,
    Boiling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReluctanceStage {
    Compliant,
    Uneasy,
    Resistant,
    Defiant,
}

pub fn tier_for_score(score: i32) -> MetricTier {
    if score >= 80 {
        MetricTier::Boiling
    } else if score >= 55 {
        MetricTier::Agitated
    } else if score >= 30 {
        MetricTier::Stirring
    } else {
        MetricTier::Dormant
    }
}

pub fn stage_for_reluctance(score: i32) -> ReluctanceStage {
    if score >= 75 {
        ReluctanceStage::Defiant
    } else if score >= 50 {
        ReluctanceStage::Resistant
    } else if score >= 25 {
        ReluctanceStage::Uneasy
    } else {
        ReluctanceStage::Compliant
    }
}
