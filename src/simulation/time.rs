use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Discrete narrative offsets used to key generated outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeSkipPeriod {
    Immediate,
    OneMonth,
    SixMonths,
    OneYear,
}

impl TimeSkipPeriod {
    pub fn label(&self) -> &'static str {
        match self {
            TimeSkipPeriod::Immediate => "immediately",
            TimeSkipPeriod::OneMonth => "one month later",
            TimeSkipPeriod::SixMonths => "six months later",
            TimeSkipPeriod::OneYear => "one year later",
        }
    }
}

/// Fixed week-number to time-skip mapping for the six-week campaign.
pub fn period_for_week(week: u32) -> TimeSkipPeriod {
    match week {
        0 | 1 => TimeSkipPeriod::Immediate,
        2 => TimeSkipPeriod::OneMonth,
        3 | 4 => TimeSkipPeriod::SixMonths,
        _ => TimeSkipPeriod::OneYear,
    }
}

/// Global resource tracking elapsed controller ticks.
///
/// Narrative weeks live on the Operator; the tick only drives cache
/// freshness stamps and the polling cadence.
#[derive(Resource, Debug, Default, Clone, Serialize, Deserialize)]
pub struct SessionClock {
    pub tick: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn week_mapping_matches_campaign_table() {
        assert_eq!(period_for_week(1), TimeSkipPeriod::Immediate);
        assert_eq!(period_for_week(2), TimeSkipPeriod::OneMonth);
        assert_eq!(period_for_week(3), TimeSkipPeriod::SixMonths);
        assert_eq!(period_for_week(4), TimeSkipPeriod::SixMonths);
        assert_eq!(period_for_week(5), TimeSkipPeriod::OneYear);
        assert_eq!(period_for_week(9), TimeSkipPeriod::OneYear);
    }
}
