use serde::{Deserialize, Serialize};

use crate::simulation::subject::DomainKind;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct DirectiveId(pub u32);

/// A weekly work assignment. Immutable once issued; progression is gated on
/// the flag quota of the directive currently held by the Operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    pub id: DirectiveId,
    pub week: u32,
    pub title: String,
    pub brief: String,
    pub required_domains: Vec<DomainKind>,
    pub quota: u32,
    /// 1..=10 content severity of what the directive asks for.
    pub severity: u8,
}
