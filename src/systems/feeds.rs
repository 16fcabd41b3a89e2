use bevy_ecs::prelude::*;

use crate::data::SimulationConfig;
use crate::simulation::exposure::advance_stages;
use crate::simulation::metrics::{clamp_metric, tier_for_score, MetricTier};
use crate::simulation::news::{ArticleId, EditorialStance, NewsArticle};
use crate::simulation::protest::{Protest, ProtestId, ProtestPatch, ProtestStatus};
use crate::world::store::EntityStore;

/// System: grows, stalls, or dissolves protests from neighborhood unrest.
pub fn protest_evolution_system(mut store: ResMut<EntityStore>) {
    tick_protests(&mut store);
}

/// System: lets the uncontrolled press react to what the public can see.
pub fn news_churn_system(mut store: ResMut<EntityStore>) {
    tick_news(&mut store);
}

/// System: pulls the public metrics back toward their resting levels.
pub fn metric_drift_system(mut store: ResMut<EntityStore>, config: Res<SimulationConfig>) {
    drift_metrics(&mut store, &config);
}

/// System: advances operator exposure stages off the reluctance score.
pub fn exposure_watch_system(mut store: ResMut<EntityStore>, config: Res<SimulationConfig>) {
    watch_exposure(&mut store, &config);
}

pub fn tick_protests(store: &mut EntityStore) {
    let current_week = campaign_week(store);

    let snapshot: Vec<Protest> = store.protests_sorted().into_iter().cloned().collect();
    for protest in &snapshot {
        if !protest.status.is_live() {
            continue;
        }
        let unrest = store
            .neighborhood(protest.neighborhood)
            .map(|n| n.unrest)
            .unwrap_or(0);

        let patch = match protest.status {
            ProtestStatus::Forming => {
                let momentum = (protest.momentum + unrest / 8).clamp(0, 100);
                if momentum >= 50 {
                    ProtestPatch {
                        status: Some(ProtestStatus::Active),
                        momentum: Some(momentum),
                        size: Some(protest.size + protest.size / 4),
                        ..ProtestPatch::default()
                    }
                } else if momentum == 0 {
                    ProtestPatch {
                        status: Some(ProtestStatus::Dispersed),
                        momentum: Some(0),
                        ..ProtestPatch::default()
                    }
                } else {
                    ProtestPatch {
                        momentum: Some(momentum),
                        ..ProtestPatch::default()
                    }
                }
            }
            ProtestStatus::Active => {
                // Holding a crowd takes fuel: unrest below 45 bleeds momentum.
                let momentum = (protest.momentum + (unrest - 45) / 8 - 1).clamp(0, 100);
                if momentum == 0 {
                    ProtestPatch {
                        status: Some(ProtestStatus::Dispersed),
                        momentum: Some(0),
                        ..ProtestPatch::default()
                    }
                } else {
                    let size = if momentum >= 60 {
                        protest.size + protest.size / 20
                    } else {
                        protest.size
                    };
                    ProtestPatch {
                        momentum: Some(momentum),
                        size: Some(size),
                        ..ProtestPatch::default()
                    }
                }
            }
            ProtestStatus::Dispersed | ProtestStatus::Crushed => continue,
        };
        let _ = store.update_protest(protest.id, patch);
    }

    // Sustained unrest spawns a new assembly where none is already running.
    let candidates: Vec<(crate::simulation::neighborhood::NeighborhoodId, String, u32)> = store
        .neighborhoods_sorted()
        .into_iter()
        .filter(|n| n.unrest >= 70)
        .map(|n| (n.id, n.name.clone(), n.population))
        .collect();
    for (id, name, population) in candidates {
        let live = store.protests_in(id).iter().any(|p| p.status.is_live());
        if live {
            continue;
        }
        store.add_protest(Protest {
            id: ProtestId(0),
            neighborhood: id,
            cause: format!("night raids in {}", name),
            size: (population / 200).max(30),
            momentum: 30,
            status: ProtestStatus::Forming,
            has_inciting_agent: false,
            week_started: current_week,
            triggering_action: None,
        });
    }
}

pub fn tick_news(store: &mut EntityStore) {
    let week = campaign_week(store);
    let awareness = store.public_metrics.awareness;
    let anger = store.public_metrics.anger;

    // Once awareness crosses into Agitated the underground press finds print.
    if tier_for_score(awareness) >= MetricTier::Agitated {
        if let Some(channel) = store.channel_with_stance(EditorialStance::Underground) {
            let channel_id = channel.id;
            let already = store
                .articles_sorted()
                .iter()
                .any(|a| a.channel == channel_id && a.week == week);
            if !already {
                let _ = store.add_article(NewsArticle {
                    id: ArticleId(0),
                    channel: channel_id,
                    headline: format!("Week {}: the lists keep growing", week),
                    body: "Names disappear from rosters and nobody asks aloud anymore."
                        .to_string(),
                    week,
                    triggering_action: None,
                    suppressed: false,
                });
                store.public_metrics.awareness = clamp_metric(awareness + 1);
            }
        }
    }

    // An angry public stops believing the official broadcast.
    if tier_for_score(anger) >= MetricTier::Agitated {
        if let Some(channel) = store.channel_with_stance(EditorialStance::State) {
            let id = channel.id;
            let _ = store.adjust_channel_credibility(id, -1);
        }
    }
}

pub fn drift_metrics(store: &mut EntityStore, config: &SimulationConfig) {
    let week = campaign_week(store);

    // Fresh operations keep the public hot; quiet weeks fade from memory.
    let backlash_pressure: f32 = store
        .actions_sorted()
        .iter()
        .filter(|a| a.week == week)
        .filter_map(|a| config.actions.def_for(a.action))
        .map(|def| def.backlash)
        .sum();

    let metrics = &mut store.public_metrics;
    if backlash_pressure >= 0.5 {
        metrics.anger = clamp_metric(metrics.anger + 1);
    } else {
        metrics.awareness = clamp_metric(metrics.awareness + drift_step(metrics.awareness, 20));
        metrics.anger = clamp_metric(metrics.anger + drift_step(metrics.anger, 10));
    }
    if metrics.awareness >= 55 {
        metrics.trust = clamp_metric(metrics.trust - 1);
    } else {
        metrics.trust = clamp_metric(metrics.trust + drift_step(metrics.trust, 70));
    }
}

pub fn watch_exposure(store: &mut EntityStore, config: &SimulationConfig) {
    let reluctance = store.reluctance.score;
    let operators: Vec<_> = store.operators_sorted().iter().map(|o| o.id).collect();
    for operator in operators {
        if let Some(exposure) = store.exposure_mut(operator) {
            advance_stages(exposure, reluctance, &config.actions.exposure_stage_thresholds);
        }
    }
}

fn drift_step(value: i32, baseline: i32) -> i32 {
    (baseline - value).signum()
}

fn campaign_week(store: &EntityStore) -> u32 {
    store
        .operators_sorted()
        .first()
        .map(|o| o.week)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::neighborhood::{Neighborhood, NeighborhoodId};

    fn store_with_hood(unrest: i32) -> (EntityStore, NeighborhoodId) {
        let mut store = EntityStore::default();
        let hood = store.add_neighborhood(Neighborhood {
            id: NeighborhoodId(0),
            name: "Veldt Quarter".to_string(),
            population: 40_000,
            unrest,
        });
        (store, hood)
    }

    #[test]
    fn high_unrest_spawns_a_forming_protest() {
        let (mut store, hood) = store_with_hood(75);
        tick_protests(&mut store);
        let protests = store.protests_in(hood);
        assert_eq!(protests.len(), 1);
        assert_eq!(protests[0].status, ProtestStatus::Forming);

        // A live protest already covers the district, no second spawn.
        tick_protests(&mut store);
        assert_eq!(store.protests_in(hood).len(), 1);
    }

    #[test]
    fn forming_protest_activates_on_momentum() {
        let (mut store, hood) = store_with_hood(80);
        let id = store.add_protest(Protest {
            id: ProtestId(0),
            neighborhood: hood,
            cause: "rations".to_string(),
            size: 100,
            momentum: 45,
            status: ProtestStatus::Forming,
            has_inciting_agent: false,
            week_started: 1,
            triggering_action: None,
        });
        tick_protests(&mut store);
        let protest = store.protest(id).unwrap();
        assert_eq!(protest.status, ProtestStatus::Active);
        assert!(protest.size > 100);
    }

    #[test]
    fn starved_protest_dissolves() {
        let (mut store, hood) = store_with_hood(10);
        let id = store.add_protest(Protest {
            id: ProtestId(0),
            neighborhood: hood,
            cause: "rations".to_string(),
            size: 100,
            momentum: 3,
            status: ProtestStatus::Active,
            has_inciting_agent: false,
            week_started: 1,
            triggering_action: None,
        });
        tick_protests(&mut store);
        assert_eq!(store.protest(id).unwrap().status, ProtestStatus::Dispersed);
    }

    #[test]
    fn metrics_drift_back_toward_rest() {
        let config = SimulationConfig::builtin();
        let (mut store, _) = store_with_hood(0);
        store.public_metrics.awareness = 40;
        store.public_metrics.anger = 30;
        store.public_metrics.trust = 50;
        drift_metrics(&mut store, &config);
        assert_eq!(store.public_metrics.awareness, 39);
        assert_eq!(store.public_metrics.anger, 29);
        assert_eq!(store.public_metrics.trust, 51);
    }

    #[test]
    fn underground_press_reports_once_per_week() {
        use crate::simulation::news::{ChannelId, NewsChannel};
        let (mut store, _) = store_with_hood(0);
        store.add_channel(NewsChannel {
            id: ChannelId(0),
            name: "The Cellar Press".to_string(),
            stance: EditorialStance::Underground,
            credibility: 60,
        });
        store.public_metrics.awareness = 60;
        tick_news(&mut store);
        tick_news(&mut store);
        assert_eq!(store.articles_sorted().len(), 1);
    }
}
