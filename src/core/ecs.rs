use bevy_ecs::prelude::*;
use bevy_ecs::schedule::SystemSet;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::data::SimulationConfig;
use crate::simulation::time::SessionClock;
use crate::systems::feeds::{
    exposure_watch_system, metric_drift_system, news_churn_system, protest_evolution_system,
};
use crate::world::store::EntityStore;

/// Seeded randomness shared by gamble resolution and filler-pool draws.
/// Replaying a seed replays every draw in order.
#[derive(Resource)]
pub struct SessionRng(pub ChaCha8Rng);

impl SessionRng {
    pub fn from_seed_value(seed: u64) -> Self {
        Self(ChaCha8Rng::seed_from_u64(seed))
    }
}

/// Canonical ordering of one polled feed pass.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum FeedSet {
    Crowds,
    Press,
    Drift,
    Watch,
}

/// Build the session world with its baseline resources.
pub fn create_session_world(config: SimulationConfig, seed: u64) -> World {
    let mut world = World::new();
    world.insert_resource(EntityStore::default());
    world.insert_resource(SessionClock::default());
    world.insert_resource(SessionRng::from_seed_value(seed));
    world.insert_resource(config);
    world
}

/// Build the feed schedule in the canonical order.
pub fn create_feed_schedule() -> Schedule {
    let mut schedule = Schedule::default();

    schedule.configure_sets(
        (FeedSet::Crowds, FeedSet::Press, FeedSet::Drift, FeedSet::Watch).chain(),
    );

    schedule.add_systems((
        protest_evolution_system.in_set(FeedSet::Crowds),
        news_churn_system.in_set(FeedSet::Press),
        metric_drift_system.in_set(FeedSet::Drift),
        exposure_watch_system.in_set(FeedSet::Watch),
    ));

    schedule
}
