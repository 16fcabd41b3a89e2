use std::collections::HashSet;

use bevy_ecs::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

use crate::content::PopulationSource;
use crate::core::cache::{PollClock, RequestLedger, SubjectFileCache};
use crate::core::ecs::{create_feed_schedule, create_session_world, SessionRng};
use crate::core::serialization::{apply_session, extract_session, SessionSave};
use crate::data::{ConfigError, SimulationConfig};
use crate::rules::risk::{assess, AssessError, RiskAssessment, RiskLevel};
use crate::simulation::directive::{Directive, DirectiveId};
use crate::simulation::ending::{evaluate_ending, EndingReport, EndingStats};
use crate::simulation::exposure::OperatorExposure;
use crate::simulation::metrics::{
    stage_for_reluctance, tier_for_score, MetricTier, ReluctanceStage,
};
use crate::simulation::news::NewsArticle;
use crate::simulation::operator::{Operator, OperatorId, OperatorStatus};
use crate::simulation::outcome::{DisruptionTag, OutcomeRecord};
use crate::simulation::protest::Protest;
use crate::simulation::subject::{DomainRecord, Message, Subject, SubjectId};
use crate::simulation::time::{period_for_week, SessionClock, TimeSkipPeriod};
use crate::systems::flagging::{
    execute_flag, execute_no_action, ActionError, FlagReport, FlagRequest, RefusalReport,
    RefusalRequest,
};
use crate::systems::progression::{advance_directive, AdvanceReport, ProgressionError};
use crate::simulation::action::ActionRecord;
use crate::world::repository::{SnapshotError, SnapshotRepository};
use crate::world::store::{EntityStore, StoreError};

const SUBJECT_CACHE_CAPACITY: usize = 32;
const REQUEST_LEDGER_CAPACITY: usize = 256;
const DEFAULT_POLL_INTERVAL_TICKS: u64 = 8;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Action(#[from] ActionError),
    #[error(transparent)]
    Progression(#[from] ProgressionError),
    #[error(transparent)]
    Assess(#[from] AssessError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("session has no operator on file")]
    NoOperator,
}

/// Top-of-screen view of the session.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub week: u32,
    pub period: TimeSkipPeriod,
    pub operator: OperatorView,
    pub directive: Option<DirectiveView>,
    pub public_metrics: PublicMetricsView,
    pub reluctance: ReluctanceView,
    pub subjects: Vec<SubjectSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OperatorView {
    pub codename: String,
    pub status: OperatorStatus,
    pub compliance: i32,
    pub total_flags_submitted: u32,
    pub hesitation_incidents: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveView {
    pub id: DirectiveId,
    pub week: u32,
    pub title: String,
    pub brief: String,
    pub quota: u32,
    pub submitted: u32,
    pub severity: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublicMetricsView {
    pub awareness: i32,
    pub awareness_tier: MetricTier,
    pub anger: i32,
    pub anger_tier: MetricTier,
    pub trust: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReluctanceView {
    pub score: i32,
    pub stage: ReluctanceStage,
    pub refusals: u32,
    pub hesitations: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExposureView {
    pub stage: u8,
    pub awareness: i32,
    pub leak_events: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubjectSummary {
    pub id: SubjectId,
    pub name: String,
    pub occupation: String,
    pub risk: Option<(f32, RiskLevel)>,
}

/// Fully assembled case file for one subject; the unit the LRU cache holds.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectFile {
    pub subject: Subject,
    pub records: Vec<DomainRecord>,
    pub messages: Vec<Message>,
    pub assessment: RiskAssessment,
    pub prior_actions: Vec<ActionRecord>,
    pub outcomes: Vec<OutcomeRecord>,
}

/// Owns the world, the feed schedule, and the durable snapshot boundary.
/// Every public mutating call autosaves on success; a failed autosave is
/// logged and recorded on `last_save_ok`, never propagated.
pub struct SessionController {
    world: World,
    feed_schedule: Schedule,
    repository: Box<dyn SnapshotRepository>,
    population: Box<dyn PopulationSource>,
    file_cache: SubjectFileCache<SubjectFile>,
    flag_ledger: RequestLedger<Result<FlagReport, ActionError>>,
    refusal_ledger: RequestLedger<Result<RefusalReport, ActionError>>,
    poll_clock: PollClock,
    operator: OperatorId,
    seed: u64,
    last_save_ok: bool,
}

impl SessionController {
    /// Start a fresh session. Configuration is validated as a unit first;
    /// the engine never runs on partial rule data.
    pub fn new_session(
        config: SimulationConfig,
        seed: u64,
        codename: &str,
        repository: Box<dyn SnapshotRepository>,
        population: Box<dyn PopulationSource>,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let mut world = create_session_world(config, seed);
        let operator = bootstrap(&mut world, population.as_ref(), codename)?;
        info!(seed, codename, "session started");

        let mut controller = Self {
            world,
            feed_schedule: create_feed_schedule(),
            repository,
            population,
            file_cache: SubjectFileCache::new(SUBJECT_CACHE_CAPACITY),
            flag_ledger: RequestLedger::new(REQUEST_LEDGER_CAPACITY),
            refusal_ledger: RequestLedger::new(REQUEST_LEDGER_CAPACITY),
            poll_clock: PollClock::new(DEFAULT_POLL_INTERVAL_TICKS),
            operator,
            seed,
            last_save_ok: true,
        };
        controller.autosave();
        Ok(controller)
    }

    /// Resume from the repository's snapshot when one is readable, otherwise
    /// start fresh. A version-mismatched or absent snapshot is "no data".
    pub fn resume_or_new(
        config: SimulationConfig,
        seed: u64,
        codename: &str,
        mut repository: Box<dyn SnapshotRepository>,
        population: Box<dyn PopulationSource>,
    ) -> Result<Self, SessionError> {
        let snapshot = repository.load()?;
        let Some(save) = snapshot else {
            return Self::new_session(config, seed, codename, repository, population);
        };

        config.validate()?;
        let saved_seed = save.seed;
        let (store, clock) = apply_session(&save);
        let operator = store
            .operators_sorted()
            .first()
            .map(|o| o.id)
            .ok_or(SessionError::NoOperator)?;

        let mut world = create_session_world(config, saved_seed);
        world.insert_resource(store);
        world.insert_resource(clock);
        info!(seed = saved_seed, "session resumed from snapshot");

        Ok(Self {
            world,
            feed_schedule: create_feed_schedule(),
            repository,
            population,
            file_cache: SubjectFileCache::new(SUBJECT_CACHE_CAPACITY),
            flag_ledger: RequestLedger::new(REQUEST_LEDGER_CAPACITY),
            refusal_ledger: RequestLedger::new(REQUEST_LEDGER_CAPACITY),
            poll_clock: PollClock::new(DEFAULT_POLL_INTERVAL_TICKS),
            operator,
            seed: saved_seed,
            last_save_ok: true,
        })
    }

    pub fn operator_id(&self) -> OperatorId {
        self.operator
    }

    pub fn last_save_ok(&self) -> bool {
        self.last_save_ok
    }

    pub fn dashboard(&self) -> Result<Dashboard, SessionError> {
        let store = self.store();
        let operator = self.current_operator()?;

        let directive = operator
            .current_directive
            .and_then(|id| store.directive(id))
            .map(|directive| DirectiveView {
                id: directive.id,
                week: directive.week,
                title: directive.title.clone(),
                brief: directive.brief.clone(),
                quota: directive.quota,
                submitted: store
                    .actions_for_operator(operator.id)
                    .iter()
                    .filter(|a| a.directive == directive.id)
                    .count() as u32,
                severity: directive.severity,
            });

        let subjects = store
            .subjects_sorted()
            .into_iter()
            .map(|subject| SubjectSummary {
                id: subject.id,
                name: subject.name.clone(),
                occupation: subject.occupation.clone(),
                risk: store
                    .fresh_risk(subject.id)
                    .map(|score| (score, self.config().risk.level_for_score(score))),
            })
            .collect();

        Ok(Dashboard {
            week: operator.week,
            period: operator.period,
            operator: OperatorView {
                codename: operator.codename.clone(),
                status: operator.status,
                compliance: operator.compliance,
                total_flags_submitted: operator.total_flags_submitted,
                hesitation_incidents: operator.hesitation_incidents,
            },
            directive,
            public_metrics: self.public_metrics(),
            reluctance: self.reluctance(),
            subjects,
        })
    }

    /// Assemble (or serve from cache) the full case file for a subject.
    /// The risk score is computed through the normal engine and written back
    /// to the store's advisory cache.
    pub fn subject_file(&mut self, id: SubjectId) -> Result<SubjectFile, SessionError> {
        let stamp = self.store().touched_stamp(id);
        if let Some(file) = self.file_cache.get(id, stamp) {
            return Ok(file);
        }

        let assessment = assess(self.store(), &self.config().risk, id)?;
        let score = assessment.score;
        self.world
            .resource_mut::<EntityStore>()
            .cache_risk(id, score)?;

        let store = self.store();
        let subject = store
            .subject(id)
            .cloned()
            .ok_or(AssessError::UnknownSubject(id))?;
        let prior_actions: Vec<ActionRecord> = store
            .actions_for_subject(id)
            .into_iter()
            .cloned()
            .collect();
        let outcomes = prior_actions
            .iter()
            .flat_map(|action| store.outcomes_for_action(action.id))
            .cloned()
            .collect();
        let file = SubjectFile {
            records: store.records_for(id).into_iter().cloned().collect(),
            messages: store.messages_for(id).into_iter().cloned().collect(),
            subject,
            assessment,
            prior_actions,
            outcomes,
        };

        let stamp = self.store().touched_stamp(id);
        self.file_cache.insert(id, stamp, file.clone());
        Ok(file)
    }

    /// Submit a flag decision. `request_id` de-duplicates client retries: a
    /// replayed id returns the recorded result without executing again.
    pub fn submit_flag(
        &mut self,
        request_id: u64,
        request: FlagRequest,
    ) -> Result<FlagReport, SessionError> {
        if let Some(result) = self.flag_ledger.replay(request_id) {
            return result.map_err(SessionError::from);
        }

        let result = self.world.resource_scope(|world, mut store: Mut<EntityStore>| {
            world.resource_scope(|world, mut rng: Mut<SessionRng>| {
                let config = world.resource::<SimulationConfig>();
                execute_flag(&mut store, config, &mut rng.0, &request)
            })
        });
        self.flag_ledger.record(request_id, result.clone());
        if result.is_ok() {
            self.autosave();
        }
        result.map_err(SessionError::from)
    }

    /// Submit a refuse-to-flag decision; same de-duplication contract as
    /// `submit_flag`.
    pub fn submit_no_action(
        &mut self,
        request_id: u64,
        request: RefusalRequest,
    ) -> Result<RefusalReport, SessionError> {
        if let Some(result) = self.refusal_ledger.replay(request_id) {
            return result.map_err(SessionError::from);
        }

        let result = self.world.resource_scope(|world, mut store: Mut<EntityStore>| {
            world.resource_scope(|world, mut rng: Mut<SessionRng>| {
                let config = world.resource::<SimulationConfig>();
                execute_no_action(&mut store, config, &mut rng.0, &request)
            })
        });
        self.refusal_ledger.record(request_id, result.clone());
        if result.is_ok() {
            self.autosave();
        }
        result.map_err(SessionError::from)
    }

    /// Close the current directive and advance the campaign one week.
    pub fn advance_directive(&mut self) -> Result<AdvanceReport, SessionError> {
        let operator = self.operator;
        let result = self.world.resource_scope(|world, mut store: Mut<EntityStore>| {
            world.resource_scope(|world, mut rng: Mut<SessionRng>| {
                let config = world.resource::<SimulationConfig>();
                advance_directive(&mut store, config, &mut rng.0, operator)
            })
        });
        if result.is_ok() {
            self.autosave();
        }
        result.map_err(SessionError::from)
    }

    pub fn public_metrics(&self) -> PublicMetricsView {
        let metrics = &self.store().public_metrics;
        PublicMetricsView {
            awareness: metrics.awareness,
            awareness_tier: tier_for_score(metrics.awareness),
            anger: metrics.anger,
            anger_tier: tier_for_score(metrics.anger),
            trust: metrics.trust,
        }
    }

    pub fn reluctance(&self) -> ReluctanceView {
        let reluctance = &self.store().reluctance;
        ReluctanceView {
            score: reluctance.score,
            stage: stage_for_reluctance(reluctance.score),
            refusals: reluctance.refusals,
            hesitations: reluctance.hesitations,
        }
    }

    pub fn exposure(&self) -> Option<ExposureView> {
        self.store()
            .exposure(self.operator)
            .map(|exposure: &OperatorExposure| ExposureView {
                stage: exposure.stage,
                awareness: exposure.awareness,
                leak_events: exposure.leak_events.clone(),
            })
    }

    /// The n most recent unsuppressed articles, newest first.
    pub fn recent_news(&self, n: usize) -> Vec<NewsArticle> {
        let mut articles: Vec<NewsArticle> = self
            .store()
            .articles_sorted()
            .into_iter()
            .filter(|a| !a.suppressed)
            .cloned()
            .collect();
        articles.reverse();
        articles.truncate(n);
        articles
    }

    pub fn active_protests(&self) -> Vec<Protest> {
        self.store()
            .protests_sorted()
            .into_iter()
            .filter(|p| p.status.is_live())
            .cloned()
            .collect()
    }

    /// The terminal report, available once the operator can no longer act
    /// or the campaign has run out of directives.
    pub fn ending(&self) -> Result<Option<EndingReport>, SessionError> {
        let operator = self.current_operator()?;
        if operator.status.can_act() && operator.current_directive.is_some() {
            return Ok(None);
        }
        let stats = gather_ending_stats(self.store(), operator);
        Ok(Some(evaluate_ending(
            operator,
            stats,
            &self.config().endings,
        )))
    }

    /// Feed elapsed ticks in; run the feed schedule once per due interval.
    /// Returns the number of passes run.
    pub fn poll(&mut self, elapsed_ticks: u64) -> u64 {
        self.world.resource_mut::<SessionClock>().tick += elapsed_ticks;
        let due = self.poll_clock.advance(elapsed_ticks);
        for _ in 0..due {
            self.feed_schedule.run(&mut self.world);
        }
        if due > 0 {
            self.autosave();
        }
        due
    }

    pub fn pause_polling(&mut self) {
        self.poll_clock.pause();
    }

    pub fn resume_polling(&mut self) {
        self.poll_clock.resume();
    }

    /// Stop polling and attempt a final save. Persistence failures are
    /// logged, never propagated; memory stays authoritative to the end.
    pub fn shutdown(&mut self) {
        self.poll_clock.pause();
        self.autosave();
        info!("session shut down");
    }

    /// Explicit save; unlike autosave, failures propagate to the caller.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let save = self.snapshot();
        self.repository.save(&save)?;
        self.last_save_ok = true;
        Ok(())
    }

    /// Drop the durable snapshot and rebuild the session from the population
    /// source, same configuration and seed.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        let codename = self
            .current_operator()
            .map(|o| o.codename.clone())
            .unwrap_or_else(|_| "D-7".to_string());
        self.repository.clear()?;
        self.world.resource_mut::<EntityStore>().clear();
        *self.world.resource_mut::<SessionClock>() = SessionClock::default();
        *self.world.resource_mut::<SessionRng>() = SessionRng::from_seed_value(self.seed);
        self.operator = bootstrap(&mut self.world, self.population.as_ref(), &codename)?;
        self.file_cache.clear();
        self.flag_ledger.clear();
        self.refusal_ledger.clear();
        self.autosave();
        Ok(())
    }

    fn store(&self) -> &EntityStore {
        self.world.resource::<EntityStore>()
    }

    fn config(&self) -> &SimulationConfig {
        self.world.resource::<SimulationConfig>()
    }

    fn current_operator(&self) -> Result<&Operator, SessionError> {
        self.store()
            .operator(self.operator)
            .ok_or(SessionError::NoOperator)
    }

    fn snapshot(&self) -> SessionSave {
        extract_session(
            self.store(),
            self.world.resource::<SessionClock>(),
            self.seed,
        )
    }

    fn autosave(&mut self) {
        let save = self.snapshot();
        match self.repository.save(&save) {
            Ok(()) => self.last_save_ok = true,
            Err(err) => {
                self.last_save_ok = false;
                warn!(error = %err, "autosave failed; in-memory state stays authoritative");
            }
        }
    }
}

/// Fill an empty world with the population, the configured directive
/// campaign, and the session's operator.
fn bootstrap(
    world: &mut World,
    population: &dyn PopulationSource,
    codename: &str,
) -> Result<OperatorId, SessionError> {
    let directives: Vec<Directive> = world
        .resource::<SimulationConfig>()
        .directives
        .directives
        .iter()
        .map(|def| Directive {
            id: DirectiveId(0),
            week: def.week,
            title: def.title.clone(),
            brief: def.brief.clone(),
            required_domains: def.required_domains.clone(),
            quota: def.quota,
            severity: def.severity,
        })
        .collect();

    let mut store = world.resource_mut::<EntityStore>();
    population.populate(&mut store)?;
    for directive in directives {
        store.add_directive(directive);
    }
    let first = store.directive_for_week(1).map(|d| d.id);
    let operator = store.add_operator(Operator {
        id: OperatorId(0),
        codename: codename.to_string(),
        current_directive: first,
        total_flags_submitted: 0,
        reviews_completed: 0,
        compliance: 50,
        hesitation_incidents: 0,
        status: OperatorStatus::Active,
        week: 1,
        period: period_for_week(1),
    });
    store.insert_exposure(OperatorExposure::new(operator));
    Ok(operator)
}

fn gather_ending_stats(store: &EntityStore, operator: &Operator) -> EndingStats {
    let mut detentions = 0u32;
    let mut jobs_lost = 0u32;
    let mut disrupted: HashSet<SubjectId> = HashSet::new();

    for action in store.actions_for_operator(operator.id) {
        let outcomes = store.outcomes_for_action(action.id);
        if outcomes.is_empty() {
            continue;
        }
        if let Some(subject) = action.subject {
            disrupted.insert(subject);
        }
        for outcome in outcomes {
            if outcome.tags.contains(&DisruptionTag::Detained) {
                detentions += 1;
            }
            if outcome.tags.contains(&DisruptionTag::JobLost) {
                jobs_lost += 1;
            }
        }
    }

    EndingStats {
        lives_disrupted: disrupted.len() as u32,
        detentions,
        jobs_lost,
        refusals: store.reluctance.refusals,
        flags_submitted: operator.total_flags_submitted,
        final_compliance: operator.compliance,
        final_reluctance: store.reluctance.score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::content::BuiltinRoster;
    use crate::simulation::action::{ActionTarget, ActionType};

    /// Shared-slot repository so two controllers can hand a snapshot off in
    /// tests without touching the filesystem.
    #[derive(Clone, Default)]
    struct MemoryRepo {
        slot: Arc<Mutex<Option<SessionSave>>>,
    }

    impl SnapshotRepository for MemoryRepo {
        fn load(&mut self) -> Result<Option<SessionSave>, SnapshotError> {
            Ok(self.slot.lock().unwrap().clone())
        }

        fn save(&mut self, save: &SessionSave) -> Result<(), SnapshotError> {
            *self.slot.lock().unwrap() = Some(save.clone());
            Ok(())
        }

        fn clear(&mut self) -> Result<(), SnapshotError> {
            *self.slot.lock().unwrap() = None;
            Ok(())
        }
    }

    fn controller() -> SessionController {
        SessionController::new_session(
            SimulationConfig::builtin(),
            7,
            "D-7",
            Box::new(MemoryRepo::default()),
            Box::new(BuiltinRoster),
        )
        .unwrap()
    }

    fn monitoring_request(controller: &SessionController, subject: SubjectId) -> FlagRequest {
        FlagRequest {
            operator: controller.operator_id(),
            target: ActionTarget::Citizen(subject),
            action: ActionType::Monitoring,
            justification: "hostile sentiment profile".to_string(),
            decision_seconds: 5,
        }
    }

    #[test]
    fn bootstrap_surfaces_week_one_directive() {
        let controller = controller();
        let dashboard = controller.dashboard().unwrap();
        assert_eq!(dashboard.week, 1);
        let directive = dashboard.directive.unwrap();
        assert_eq!(directive.week, 1);
        assert_eq!(directive.submitted, 0);
        assert_eq!(dashboard.subjects.len(), 8);
    }

    #[test]
    fn replayed_request_id_executes_once() {
        let mut controller = controller();
        let subject = controller.dashboard().unwrap().subjects[0].id;
        let request = monitoring_request(&controller, subject);

        let first = controller.submit_flag(42, request.clone()).unwrap();
        let second = controller.submit_flag(42, request).unwrap();
        assert_eq!(first, second);
        assert_eq!(controller.store().action_count(), 1);
    }

    #[test]
    fn subject_file_caches_until_the_subject_is_touched() {
        let mut controller = controller();
        let subject = controller.dashboard().unwrap().subjects[0].id;

        let first = controller.subject_file(subject).unwrap();
        let again = controller.subject_file(subject).unwrap();
        assert_eq!(first, again);
        // The advisory risk cache is fresh after assembly.
        assert!(controller.store().fresh_risk(subject).is_some());

        controller
            .submit_flag(1, monitoring_request(&controller, subject))
            .unwrap();
        let after = controller.subject_file(subject).unwrap();
        assert_eq!(after.prior_actions.len(), 1);
    }

    #[test]
    fn resume_restores_the_saved_session() {
        let repo = MemoryRepo::default();
        let mut first = SessionController::new_session(
            SimulationConfig::builtin(),
            7,
            "D-7",
            Box::new(repo.clone()),
            Box::new(BuiltinRoster),
        )
        .unwrap();
        let subject = first.dashboard().unwrap().subjects[0].id;
        first
            .submit_flag(1, monitoring_request(&first, subject))
            .unwrap();
        let saved_dashboard = first.dashboard().unwrap();

        let resumed = SessionController::resume_or_new(
            SimulationConfig::builtin(),
            999,
            "ignored",
            Box::new(repo),
            Box::new(BuiltinRoster),
        )
        .unwrap();
        assert_eq!(resumed.dashboard().unwrap(), saved_dashboard);
        assert_eq!(resumed.seed, 7);
    }

    #[test]
    fn polling_runs_feeds_only_when_due_and_unpaused() {
        let mut controller = controller();
        assert_eq!(controller.poll(DEFAULT_POLL_INTERVAL_TICKS - 1), 0);
        assert_eq!(controller.poll(1), 1);

        controller.pause_polling();
        assert_eq!(controller.poll(DEFAULT_POLL_INTERVAL_TICKS * 3), 0);
        controller.resume_polling();
        assert_eq!(controller.poll(DEFAULT_POLL_INTERVAL_TICKS), 1);
    }

    #[test]
    fn reset_drops_state_and_rebuilds_the_roster() {
        let mut controller = controller();
        let subject = controller.dashboard().unwrap().subjects[0].id;
        controller
            .submit_flag(1, monitoring_request(&controller, subject))
            .unwrap();
        assert_eq!(controller.store().action_count(), 1);

        controller.reset().unwrap();
        assert_eq!(controller.store().action_count(), 0);
        let dashboard = controller.dashboard().unwrap();
        assert_eq!(dashboard.week, 1);
        assert_eq!(dashboard.subjects.len(), 8);
    }

    #[test]
    fn no_ending_while_the_campaign_is_live() {
        let controller = controller();
        assert!(controller.ending().unwrap().is_none());
    }
}
