pub mod correlation;
pub mod factors;
pub mod risk;

pub use correlation::{CorrelationAlert, CorrelationRule, FactorPredicate};
pub use factors::{DomainView, FactorTrigger};
pub use risk::{
    assess, AssessError, ContributingFactor, RecommendedAction, RiskAssessment, RiskLevel, Urgency,
};
