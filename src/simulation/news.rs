use serde::{Deserialize, Serialize};

use crate::simulation::action::ActionId;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ChannelId(pub u32);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct ArticleId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditorialStance {
    State,
    Independent,
    Underground,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsChannel {
    pub id: ChannelId,
    pub name: String,
    pub stance: EditorialStance,
    /// 0..=100, eroded by discredit campaigns and drift.
    pub credibility: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub id: ArticleId,
    pub channel: ChannelId,
    pub headline: String,
    pub body: String,
    pub week: u32,
    pub triggering_action: Option<ActionId>,
    pub suppressed: bool,
}
