use std::collections::HashMap;

use bevy_ecs::prelude::*;
use thiserror::Error;

use crate::simulation::action::{ActionId, ActionRecord, RefusalId, RefusalRecord};
use crate::simulation::directive::{Directive, DirectiveId};
use crate::simulation::exposure::OperatorExposure;
use crate::simulation::metrics::{PublicMetrics, ReluctanceMetrics};
use crate::simulation::neighborhood::{Neighborhood, NeighborhoodId};
use crate::simulation::news::{ArticleId, ChannelId, NewsArticle, NewsChannel};
use crate::simulation::operator::{Operator, OperatorId, OperatorPatch};
use crate::simulation::outcome::{OutcomeId, OutcomeRecord};
use crate::simulation::protest::{Protest, ProtestId, ProtestPatch};
use crate::simulation::subject::{
    DomainKind, DomainRecord, Message, MessageId, RecordId, Subject, SubjectId, SubjectPatch,
};
use crate::simulation::time::TimeSkipPeriod;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: u32 },
    #[error("subject {} already has a {} record", .subject.0, .kind.label())]
    DuplicateDomainRecord { subject: SubjectId, kind: DomainKind },
    #[error("outcome for action {} at {:?} already exists", .action.0, .period)]
    DuplicateOutcome { action: ActionId, period: TimeSkipPeriod },
}

/// Single source of truth for every simulation entity.
///
/// One primary table per kind plus secondary indexes that are maintained
/// incrementally and never persisted; `apply_session` rebuilds them by
/// re-inserting through the normal paths.
#[derive(Resource, Debug, Default, Clone, PartialEq)]
pub struct EntityStore {
    subjects: HashMap<SubjectId, Subject>,
    records: HashMap<RecordId, DomainRecord>,
    messages: HashMap<MessageId, Message>,
    operators: HashMap<OperatorId, Operator>,
    directives: HashMap<DirectiveId, Directive>,
    actions: HashMap<ActionId, ActionRecord>,
    refusals: HashMap<RefusalId, RefusalRecord>,
    outcomes: HashMap<OutcomeId, OutcomeRecord>,
    channels: HashMap<ChannelId, NewsChannel>,
    articles: HashMap<ArticleId, NewsArticle>,
    protests: HashMap<ProtestId, Protest>,
    neighborhoods: HashMap<NeighborhoodId, Neighborhood>,
    exposures: HashMap<OperatorId, OperatorExposure>,
    pub public_metrics: PublicMetrics,
    pub reluctance: ReluctanceMetrics,

    name_index: HashMap<String, SubjectId>,
    records_by_subject: HashMap<SubjectId, HashMap<DomainKind, RecordId>>,
    messages_by_subject: HashMap<SubjectId, Vec<MessageId>>,
    actions_by_subject: HashMap<SubjectId, Vec<ActionId>>,
    actions_by_operator: HashMap<OperatorId, Vec<ActionId>>,
    refusals_by_operator: HashMap<OperatorId, Vec<RefusalId>>,
    outcome_index: HashMap<(ActionId, TimeSkipPeriod), OutcomeId>,
    outcomes_by_action: HashMap<ActionId, Vec<OutcomeId>>,
    protests_by_neighborhood: HashMap<NeighborhoodId, Vec<ProtestId>>,

    next_subject: u32,
    next_record: u32,
    next_message: u32,
    next_operator: u32,
    next_directive: u32,
    next_action: u32,
    next_refusal: u32,
    next_outcome: u32,
    next_channel: u32,
    next_article: u32,
    next_protest: u32,
    next_neighborhood: u32,

    mutation_stamp: u64,
    touched: HashMap<SubjectId, u64>,
}

impl EntityStore {
    /// Monotonic stamp bumped on every mutating call.
    pub fn stamp(&self) -> u64 {
        self.mutation_stamp
    }

    /// Stamp of the last write that affected this subject's file.
    pub fn touched_stamp(&self, subject: SubjectId) -> u64 {
        self.touched.get(&subject).copied().unwrap_or(0)
    }

    fn bump(&mut self) -> u64 {
        self.mutation_stamp += 1;
        self.mutation_stamp
    }

    fn touch(&mut self, subject: SubjectId) {
        let stamp = self.bump();
        self.touched.insert(subject, stamp);
    }

    /// Empty every table and index and reset all counters.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    // ----- subjects -----

    pub fn add_subject(&mut self, mut subject: Subject) -> SubjectId {
        self.next_subject += 1;
        subject.id = SubjectId(self.next_subject);
        let id = subject.id;
        self.insert_subject(subject);
        id
    }

    /// Insert preserving the given id; used by snapshot restore.
    pub fn insert_subject(&mut self, subject: Subject) {
        self.next_subject = self.next_subject.max(subject.id.0);
        self.name_index
            .insert(subject.name.to_lowercase(), subject.id);
        self.touch(subject.id);
        self.subjects.insert(subject.id, subject);
    }

    pub fn subject(&self, id: SubjectId) -> Option<&Subject> {
        self.subjects.get(&id)
    }

    pub fn subject_by_name(&self, name: &str) -> Option<&Subject> {
        self.name_index
            .get(&name.to_lowercase())
            .and_then(|id| self.subjects.get(id))
    }

    pub fn subjects_sorted(&self) -> Vec<&Subject> {
        let mut all: Vec<&Subject> = self.subjects.values().collect();
        all.sort_by_key(|s| s.id);
        all
    }

    pub fn update_subject(&mut self, id: SubjectId, patch: SubjectPatch) -> Result<(), StoreError> {
        let subject = self.subjects.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "subject",
            id: id.0,
        })?;
        if let Some(name) = patch.name {
            self.name_index.remove(&subject.name.to_lowercase());
            self.name_index.insert(name.to_lowercase(), id);
            subject.name = name;
        }
        if let Some(age) = patch.age {
            subject.age = age;
        }
        if let Some(street) = patch.street {
            subject.street = street;
        }
        if let Some(neighborhood) = patch.neighborhood {
            subject.neighborhood = neighborhood;
        }
        if let Some(occupation) = patch.occupation {
            subject.occupation = occupation;
        }
        self.touch(id);
        Ok(())
    }

    /// Record the advisory risk cache for a subject.
    pub fn cache_risk(&mut self, id: SubjectId, score: f32) -> Result<(), StoreError> {
        let stamp = self.touched_stamp(id);
        let subject = self.subjects.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "subject",
            id: id.0,
        })?;
        subject.risk_score = Some(score);
        subject.risk_computed_at = Some(stamp);
        // Deliberately no touch: caching a score must not invalidate the
        // cache it just filled.
        Ok(())
    }

    /// The cached score, only if no write to this subject postdates it.
    pub fn fresh_risk(&self, id: SubjectId) -> Option<f32> {
        let subject = self.subjects.get(&id)?;
        let computed_at = subject.risk_computed_at?;
        if computed_at >= self.touched_stamp(id) {
            subject.risk_score
        } else {
            None
        }
    }

    /// Delete a subject, cascade its domain records and messages, and
    /// unlink (never delete) its actions.
    pub fn delete_subject(&mut self, id: SubjectId) -> Result<(), StoreError> {
        let subject = self.subjects.remove(&id).ok_or(StoreError::NotFound {
            kind: "subject",
            id: id.0,
        })?;
        self.name_index.remove(&subject.name.to_lowercase());

        if let Some(by_kind) = self.records_by_subject.remove(&id) {
            for record_id in by_kind.values() {
                self.records.remove(record_id);
            }
        }
        if let Some(message_ids) = self.messages_by_subject.remove(&id) {
            for message_id in message_ids {
                self.messages.remove(&message_id);
            }
        }
        if let Some(action_ids) = self.actions_by_subject.remove(&id) {
            for action_id in action_ids {
                if let Some(action) = self.actions.get_mut(&action_id) {
                    action.subject = None;
                }
            }
        }
        self.touched.remove(&id);
        self.bump();
        Ok(())
    }

    // ----- domain records -----

    pub fn add_record(
        &mut self,
        subject: SubjectId,
        data: crate::simulation::subject::DomainData,
    ) -> Result<RecordId, StoreError> {
        if !self.subjects.contains_key(&subject) {
            return Err(StoreError::NotFound {
                kind: "subject",
                id: subject.0,
            });
        }
        let kind = data.kind();
        let by_kind = self.records_by_subject.entry(subject).or_default();
        if by_kind.contains_key(&kind) {
            return Err(StoreError::DuplicateDomainRecord { subject, kind });
        }
        self.next_record += 1;
        let id = RecordId(self.next_record);
        by_kind.insert(kind, id);
        self.records.insert(id, DomainRecord { id, subject, data });
        self.touch(subject);
        Ok(id)
    }

    pub fn insert_record(&mut self, record: DomainRecord) {
        self.next_record = self.next_record.max(record.id.0);
        self.records_by_subject
            .entry(record.subject)
            .or_default()
            .insert(record.data.kind(), record.id);
        self.touch(record.subject);
        self.records.insert(record.id, record);
    }

    pub fn record(&self, id: RecordId) -> Option<&DomainRecord> {
        self.records.get(&id)
    }

    pub fn record_for(&self, subject: SubjectId, kind: DomainKind) -> Option<&DomainRecord> {
        self.records_by_subject
            .get(&subject)?
            .get(&kind)
            .and_then(|id| self.records.get(id))
    }

    pub fn records_for(&self, subject: SubjectId) -> Vec<&DomainRecord> {
        let mut records: Vec<&DomainRecord> = self
            .records_by_subject
            .get(&subject)
            .map(|by_kind| {
                by_kind
                    .values()
                    .filter_map(|id| self.records.get(id))
                    .collect()
            })
            .unwrap_or_default();
        records.sort_by_key(|r| r.id);
        records
    }

    pub fn present_domains(&self, subject: SubjectId) -> Vec<DomainKind> {
        DomainKind::ALL
            .iter()
            .copied()
            .filter(|kind| {
                self.records_by_subject
                    .get(&subject)
                    .is_some_and(|by_kind| by_kind.contains_key(kind))
            })
            .collect()
    }

    /// Replace the payload of an existing record of the same kind.
    pub fn update_record(
        &mut self,
        id: RecordId,
        data: crate::simulation::subject::DomainData,
    ) -> Result<(), StoreError> {
        let record = self.records.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "record",
            id: id.0,
        })?;
        if record.data.kind() != data.kind() {
            return Err(StoreError::DuplicateDomainRecord {
                subject: record.subject,
                kind: data.kind(),
            });
        }
        record.data = data;
        let subject = record.subject;
        self.touch(subject);
        Ok(())
    }

    // ----- messages -----

    pub fn add_message(&mut self, mut message: Message) -> Result<MessageId, StoreError> {
        if !self.subjects.contains_key(&message.subject) {
            return Err(StoreError::NotFound {
                kind: "subject",
                id: message.subject.0,
            });
        }
        self.next_message += 1;
        message.id = MessageId(self.next_message);
        let id = message.id;
        self.insert_message(message);
        Ok(id)
    }

    pub fn insert_message(&mut self, message: Message) {
        self.next_message = self.next_message.max(message.id.0);
        self.messages_by_subject
            .entry(message.subject)
            .or_default()
            .push(message.id);
        self.touch(message.subject);
        self.messages.insert(message.id, message);
    }

    pub fn messages_for(&self, subject: SubjectId) -> Vec<&Message> {
        let mut messages: Vec<&Message> = self
            .messages_by_subject
            .get(&subject)
            .map(|ids| ids.iter().filter_map(|id| self.messages.get(id)).collect())
            .unwrap_or_default();
        messages.sort_by_key(|m| m.id);
        messages
    }

    // ----- operators -----

    pub fn add_operator(&mut self, mut operator: Operator) -> OperatorId {
        self.next_operator += 1;
        operator.id = OperatorId(self.next_operator);
        let id = operator.id;
        self.insert_operator(operator);
        id
    }

    pub fn insert_operator(&mut self, operator: Operator) {
        self.next_operator = self.next_operator.max(operator.id.0);
        self.bump();
        self.operators.insert(operator.id, operator);
    }

    pub fn operator(&self, id: OperatorId) -> Option<&Operator> {
        self.operators.get(&id)
    }

    pub fn operators_sorted(&self) -> Vec<&Operator> {
        let mut all: Vec<&Operator> = self.operators.values().collect();
        all.sort_by_key(|o| o.id);
        all
    }

    pub fn update_operator(
        &mut self,
        id: OperatorId,
        patch: OperatorPatch,
    ) -> Result<(), StoreError> {
        let operator = self.operators.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "operator",
            id: id.0,
        })?;
        if let Some(directive) = patch.current_directive {
            operator.current_directive = directive;
        }
        if let Some(flags) = patch.total_flags_submitted {
            operator.total_flags_submitted = flags;
        }
        if let Some(reviews) = patch.reviews_completed {
            operator.reviews_completed = reviews;
        }
        if let Some(compliance) = patch.compliance {
            operator.compliance = compliance.clamp(0, 100);
        }
        if let Some(hesitations) = patch.hesitation_incidents {
            operator.hesitation_incidents = hesitations;
        }
        if let Some(status) = patch.status {
            operator.status = status;
        }
        if let Some(week) = patch.week {
            operator.week = week;
        }
        if let Some(period) = patch.period {
            operator.period = period;
        }
        self.bump();
        Ok(())
    }

    // ----- directives -----

    pub fn add_directive(&mut self, mut directive: Directive) -> DirectiveId {
        self.next_directive += 1;
        directive.id = DirectiveId(self.next_directive);
        let id = directive.id;
        self.insert_directive(directive);
        id
    }

    pub fn insert_directive(&mut self, directive: Directive) {
        self.next_directive = self.next_directive.max(directive.id.0);
        self.bump();
        self.directives.insert(directive.id, directive);
    }

    pub fn directive(&self, id: DirectiveId) -> Option<&Directive> {
        self.directives.get(&id)
    }

    pub fn directive_for_week(&self, week: u32) -> Option<&Directive> {
        self.directives.values().find(|d| d.week == week)
    }

    pub fn directives_sorted(&self) -> Vec<&Directive> {
        let mut all: Vec<&Directive> = self.directives.values().collect();
        all.sort_by_key(|d| d.week);
        all
    }

    // ----- actions -----

    pub fn add_action(&mut self, mut action: ActionRecord) -> Result<ActionId, StoreError> {
        if !self.operators.contains_key(&action.operator) {
            return Err(StoreError::NotFound {
                kind: "operator",
                id: action.operator.0,
            });
        }
        if let Some(subject) = action.subject {
            if !self.subjects.contains_key(&subject) {
                return Err(StoreError::NotFound {
                    kind: "subject",
                    id: subject.0,
                });
            }
        }
        self.next_action += 1;
        action.id = ActionId(self.next_action);
        let id = action.id;
        self.insert_action(action);
        Ok(id)
    }

    pub fn insert_action(&mut self, action: ActionRecord) {
        self.next_action = self.next_action.max(action.id.0);
        if let Some(subject) = action.subject {
            self.actions_by_subject
                .entry(subject)
                .or_default()
                .push(action.id);
            self.touch(subject);
        } else {
            self.bump();
        }
        self.actions_by_operator
            .entry(action.operator)
            .or_default()
            .push(action.id);
        self.actions.insert(action.id, action);
    }

    pub fn action(&self, id: ActionId) -> Option<&ActionRecord> {
        self.actions.get(&id)
    }

    pub fn actions_for_operator(&self, operator: OperatorId) -> Vec<&ActionRecord> {
        let mut actions: Vec<&ActionRecord> = self
            .actions_by_operator
            .get(&operator)
            .map(|ids| ids.iter().filter_map(|id| self.actions.get(id)).collect())
            .unwrap_or_default();
        actions.sort_by_key(|a| a.id);
        actions
    }

    pub fn actions_for_subject(&self, subject: SubjectId) -> Vec<&ActionRecord> {
        let mut actions: Vec<&ActionRecord> = self
            .actions_by_subject
            .get(&subject)
            .map(|ids| ids.iter().filter_map(|id| self.actions.get(id)).collect())
            .unwrap_or_default();
        actions.sort_by_key(|a| a.id);
        actions
    }

    pub fn actions_sorted(&self) -> Vec<&ActionRecord> {
        let mut all: Vec<&ActionRecord> = self.actions.values().collect();
        all.sort_by_key(|a| a.id);
        all
    }

    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    // ----- refusals -----

    pub fn add_refusal(&mut self, mut refusal: RefusalRecord) -> Result<RefusalId, StoreError> {
        if !self.operators.contains_key(&refusal.operator) {
            return Err(StoreError::NotFound {
                kind: "operator",
                id: refusal.operator.0,
            });
        }
        self.next_refusal += 1;
        refusal.id = RefusalId(self.next_refusal);
        let id = refusal.id;
        self.insert_refusal(refusal);
        Ok(id)
    }

    pub fn insert_refusal(&mut self, refusal: RefusalRecord) {
        self.next_refusal = self.next_refusal.max(refusal.id.0);
        self.refusals_by_operator
            .entry(refusal.operator)
            .or_default()
            .push(refusal.id);
        self.bump();
        self.refusals.insert(refusal.id, refusal);
    }

    pub fn refusals_for_operator(&self, operator: OperatorId) -> Vec<&RefusalRecord> {
        let mut refusals: Vec<&RefusalRecord> = self
            .refusals_by_operator
            .get(&operator)
            .map(|ids| ids.iter().filter_map(|id| self.refusals.get(id)).collect())
            .unwrap_or_default();
        refusals.sort_by_key(|r| r.id);
        refusals
    }

    pub fn refusals_sorted(&self) -> Vec<&RefusalRecord> {
        let mut all: Vec<&RefusalRecord> = self.refusals.values().collect();
        all.sort_by_key(|r| r.id);
        all
    }

    // ----- outcomes -----

    pub fn add_outcome(&mut self, mut outcome: OutcomeRecord) -> Result<OutcomeId, StoreError> {
        let key = (outcome.action, outcome.period);
        if self.outcome_index.contains_key(&key) {
            return Err(StoreError::DuplicateOutcome {
                action: outcome.action,
                period: outcome.period,
            });
        }
        if !self.actions.contains_key(&outcome.action) {
            return Err(StoreError::NotFound {
                kind: "action",
                id: outcome.action.0,
            });
        }
        self.next_outcome += 1;
        outcome.id = OutcomeId(self.next_outcome);
        let id = outcome.id;
        self.insert_outcome(outcome);
        Ok(id)
    }

    pub fn insert_outcome(&mut self, outcome: OutcomeRecord) {
        self.next_outcome = self.next_outcome.max(outcome.id.0);
        self.outcome_index
            .insert((outcome.action, outcome.period), outcome.id);
        self.outcomes_by_action
            .entry(outcome.action)
            .or_default()
            .push(outcome.id);
        if let Some(subject) = self
            .actions
            .get(&outcome.action)
            .and_then(|action| action.subject)
        {
            self.touch(subject);
        } else {
            self.bump();
        }
        self.outcomes.insert(outcome.id, outcome);
    }

    pub fn outcome(&self, id: OutcomeId) -> Option<&OutcomeRecord> {
        self.outcomes.get(&id)
    }

    pub fn outcome_for(&self, action: ActionId, period: TimeSkipPeriod) -> Option<&OutcomeRecord> {
        self.outcome_index
            .get(&(action, period))
            .and_then(|id| self.outcomes.get(id))
    }

    pub fn outcomes_for_action(&self, action: ActionId) -> Vec<&OutcomeRecord> {
        let mut outcomes: Vec<&OutcomeRecord> = self
            .outcomes_by_action
            .get(&action)
            .map(|ids| ids.iter().filter_map(|id| self.outcomes.get(id)).collect())
            .unwrap_or_default();
        outcomes.sort_by_key(|o| o.id);
        outcomes
    }

    pub fn outcomes_sorted(&self) -> Vec<&OutcomeRecord> {
        let mut all: Vec<&OutcomeRecord> = self.outcomes.values().collect();
        all.sort_by_key(|o| o.id);
        all
    }

    // ----- news -----

    pub fn add_channel(&mut self, mut channel: NewsChannel) -> ChannelId {
        self.next_channel += 1;
        channel.id = ChannelId(self.next_channel);
        let id = channel.id;
        self.insert_channel(channel);
        id
    }

    pub fn insert_channel(&mut self, channel: NewsChannel) {
        self.next_channel = self.next_channel.max(channel.id.0);
        self.bump();
        self.channels.insert(channel.id, channel);
    }

    pub fn channel(&self, id: ChannelId) -> Option<&NewsChannel> {
        self.channels.get(&id)
    }

    pub fn channels_sorted(&self) -> Vec<&NewsChannel> {
        let mut all: Vec<&NewsChannel> = self.channels.values().collect();
        all.sort_by_key(|c| c.id);
        all
    }

    pub fn channel_with_stance(
        &self,
        stance: crate::simulation::news::EditorialStance,
    ) -> Option<&NewsChannel> {
        self.channels_sorted()
            .into_iter()
            .find(|c| c.stance == stance)
    }

    pub fn adjust_channel_credibility(
        &mut self,
        id: ChannelId,
        delta: i32,
    ) -> Result<(), StoreError> {
        let channel = self.channels.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "channel",
            id: id.0,
        })?;
        channel.credibility = (channel.credibility + delta).clamp(0, 100);
        self.bump();
        Ok(())
    }

    pub fn add_article(&mut self, mut article: NewsArticle) -> Result<ArticleId, StoreError> {
        if !self.channels.contains_key(&article.channel) {
            return Err(StoreError::NotFound {
                kind: "channel",
                id: article.channel.0,
            });
        }
        self.next_article += 1;
        article.id = ArticleId(self.next_article);
        let id = article.id;
        self.insert_article(article);
        Ok(id)
    }

    pub fn insert_article(&mut self, article: NewsArticle) {
        self.next_article = self.next_article.max(article.id.0);
        self.bump();
        self.articles.insert(article.id, article);
    }

    pub fn article(&self, id: ArticleId) -> Option<&NewsArticle> {
        self.articles.get(&id)
    }

    pub fn articles_sorted(&self) -> Vec<&NewsArticle> {
        let mut all: Vec<&NewsArticle> = self.articles.values().collect();
        all.sort_by_key(|a| a.id);
        all
    }

    pub fn suppress_article(&mut self, id: ArticleId) -> Result<(), StoreError> {
        let article = self.articles.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "article",
            id: id.0,
        })?;
        article.suppressed = true;
        self.bump();
        Ok(())
    }

    // ----- protests -----

    pub fn add_protest(&mut self, mut protest: Protest) -> ProtestId {
        self.next_protest += 1;
        protest.id = ProtestId(self.next_protest);
        let id = protest.id;
        self.insert_protest(protest);
        id
    }

    pub fn insert_protest(&mut self, protest: Protest) {
        self.next_protest = self.next_protest.max(protest.id.0);
        self.protests_by_neighborhood
            .entry(protest.neighborhood)
            .or_default()
            .push(protest.id);
        self.bump();
        self.protests.insert(protest.id, protest);
    }

    pub fn protest(&self, id: ProtestId) -> Option<&Protest> {
        self.protests.get(&id)
    }

    pub fn protests_sorted(&self) -> Vec<&Protest> {
        let mut all: Vec<&Protest> = self.protests.values().collect();
        all.sort_by_key(|p| p.id);
        all
    }

    pub fn protests_in(&self, neighborhood: NeighborhoodId) -> Vec<&Protest> {
        let mut protests: Vec<&Protest> = self
            .protests_by_neighborhood
            .get(&neighborhood)
            .map(|ids| ids.iter().filter_map(|id| self.protests.get(id)).collect())
            .unwrap_or_default();
        protests.sort_by_key(|p| p.id);
        protests
    }

    pub fn update_protest(&mut self, id: ProtestId, patch: ProtestPatch) -> Result<(), StoreError> {
        let protest = self.protests.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "protest",
            id: id.0,
        })?;
        if let Some(size) = patch.size {
            protest.size = size;
        }
        if let Some(momentum) = patch.momentum {
            protest.momentum = momentum.clamp(0, 100);
        }
        if let Some(status) = patch.status {
            protest.status = status;
        }
        if let Some(agent) = patch.has_inciting_agent {
            protest.has_inciting_agent = agent;
        }
        self.bump();
        Ok(())
    }

    pub fn link_protest_action(
        &mut self,
        id: ProtestId,
        action: ActionId,
    ) -> Result<(), StoreError> {
        let protest = self.protests.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "protest",
            id: id.0,
        })?;
        protest.triggering_action = Some(action);
        self.bump();
        Ok(())
    }

    // ----- neighborhoods -----

    pub fn add_neighborhood(&mut self, mut neighborhood: Neighborhood) -> NeighborhoodId {
        self.next_neighborhood += 1;
        neighborhood.id = NeighborhoodId(self.next_neighborhood);
        let id = neighborhood.id;
        self.insert_neighborhood(neighborhood);
        id
    }

    pub fn insert_neighborhood(&mut self, neighborhood: Neighborhood) {
        self.next_neighborhood = self.next_neighborhood.max(neighborhood.id.0);
        self.bump();
        self.neighborhoods.insert(neighborhood.id, neighborhood);
    }

    pub fn neighborhood(&self, id: NeighborhoodId) -> Option<&Neighborhood> {
        self.neighborhoods.get(&id)
    }

    pub fn neighborhoods_sorted(&self) -> Vec<&Neighborhood> {
        let mut all: Vec<&Neighborhood> = self.neighborhoods.values().collect();
        all.sort_by_key(|n| n.id);
        all
    }

    pub fn adjust_unrest(&mut self, id: NeighborhoodId, delta: i32) -> Result<(), StoreError> {
        let neighborhood = self.neighborhoods.get_mut(&id).ok_or(StoreError::NotFound {
            kind: "neighborhood",
            id: id.0,
        })?;
        neighborhood.unrest = (neighborhood.unrest + delta).clamp(0, 100);
        self.bump();
        Ok(())
    }

    // ----- exposure -----

    pub fn insert_exposure(&mut self, exposure: OperatorExposure) {
        self.bump();
        self.exposures.insert(exposure.operator, exposure);
    }

    pub fn exposure(&self, operator: OperatorId) -> Option<&OperatorExposure> {
        self.exposures.get(&operator)
    }

    pub fn exposure_mut(&mut self, operator: OperatorId) -> Option<&mut OperatorExposure> {
        self.mutation_stamp += 1;
        self.exposures.get_mut(&operator)
    }

    pub fn exposures_sorted(&self) -> Vec<&OperatorExposure> {
        let mut all: Vec<&OperatorExposure> = self.exposures.values().collect();
        all.sort_by_key(|e| e.operator);
        all
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::action::{ActionResolution, ActionType, TargetKind};
    use crate::simulation::operator::OperatorStatus;
    use crate::simulation::subject::{DomainData, FinanceRecord, EmploymentStatus};
    use crate::simulation::time::TimeSkipPeriod;

    fn sample_subject(name: &str) -> Subject {
        Subject {
            id: SubjectId(0),
            name: name.to_string(),
            age: 34,
            street: "12 Karl-Liebknecht-Str".to_string(),
            neighborhood: NeighborhoodId(1),
            occupation: "teacher".to_string(),
            risk_score: None,
            risk_computed_at: None,
        }
    }

    fn sample_operator() -> Operator {
        Operator {
            id: OperatorId(0),
            codename: "K-41".to_string(),
            current_directive: None,
            total_flags_submitted: 0,
            reviews_completed: 0,
            compliance: 100,
            hesitation_incidents: 0,
            status: OperatorStatus::Active,
            week: 1,
            period: TimeSkipPeriod::Immediate,
        }
    }

    fn finance_data() -> DomainData {
        DomainData::Finance(FinanceRecord {
            employment: EmploymentStatus::Employed,
            monthly_income: 2_400,
            debt: 9_000,
            missed_payments: 2,
            irregular_deposits: 0,
        })
    }

    fn sample_action(operator: OperatorId, subject: SubjectId, label: &str) -> ActionRecord {
        ActionRecord {
            id: ActionId(0),
            operator,
            subject: Some(subject),
            target_kind: TargetKind::Citizen,
            target_label: label.to_string(),
            directive: DirectiveId(1),
            action: ActionType::Monitoring,
            justification: "matches directive profile".to_string(),
            decision_seconds: 5,
            hesitation: false,
            resolution: ActionResolution::Deterministic,
            week: 1,
        }
    }

    #[test]
    fn duplicate_domain_record_is_rejected() {
        let mut store = EntityStore::default();
        let subject = store.add_subject(sample_subject("Mara Vossen"));
        store.add_record(subject, finance_data()).unwrap();
        let err = store.add_record(subject, finance_data()).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateDomainRecord { .. }));
    }

    #[test]
    fn cascade_delete_unlinks_actions_and_drops_records() {
        let mut store = EntityStore::default();
        let subject = store.add_subject(sample_subject("Mara Vossen"));
        let record = store.add_record(subject, finance_data()).unwrap();
        store
            .add_message(Message {
                id: MessageId(0),
                subject,
                week: 1,
                text: "call me when you land".to_string(),
                intercepted: true,
            })
            .unwrap();
        let operator = store.add_operator(sample_operator());
        let action = store
            .add_action(sample_action(operator, subject, "Mara Vossen"))
            .unwrap();

        store.delete_subject(subject).unwrap();

        assert!(store.subject(subject).is_none());
        assert!(store.subject_by_name("Mara Vossen").is_none());
        assert!(store.record(record).is_none());
        assert!(store.messages_for(subject).is_empty());
        let kept = store.action(action).expect("action survives cascade");
        assert_eq!(kept.subject, None);
        assert_eq!(kept.target_label, "Mara Vossen");
    }

    #[test]
    fn patch_merge_preserves_unset_fields() {
        let mut store = EntityStore::default();
        let id = store.add_subject(sample_subject("Mara Vossen"));
        store
            .update_subject(
                id,
                SubjectPatch {
                    occupation: Some("archivist".to_string()),
                    ..SubjectPatch::default()
                },
            )
            .unwrap();
        let subject = store.subject(id).unwrap();
        assert_eq!(subject.occupation, "archivist");
        assert_eq!(subject.name, "Mara Vossen");
        assert_eq!(subject.age, 34);
        assert!(store.subject_by_name("mara vossen").is_some());
    }

    #[test]
    fn risk_cache_goes_stale_on_write() {
        let mut store = EntityStore::default();
        let id = store.add_subject(sample_subject("Mara Vossen"));
        store.cache_risk(id, 42.0).unwrap();
        assert_eq!(store.fresh_risk(id), Some(42.0));

        store.add_record(id, finance_data()).unwrap();
        assert_eq!(store.fresh_risk(id), None);
    }

    #[test]
    fn duplicate_outcome_key_is_rejected() {
        let mut store = EntityStore::default();
        let subject = store.add_subject(sample_subject("Mara Vossen"));
        let operator = store.add_operator(sample_operator());
        let action = store
            .add_action(sample_action(operator, subject, "Mara Vossen"))
            .unwrap();
        let outcome = OutcomeRecord {
            id: OutcomeId(0),
            action,
            period: TimeSkipPeriod::OneMonth,
            narrative: "Mara's accounts were frozen.".to_string(),
            tags: vec![],
            generated_week: 2,
        };
        store.add_outcome(outcome.clone()).unwrap();
        let err = store.add_outcome(outcome).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateOutcome { .. }));
    }
}
