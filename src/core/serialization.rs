use serde::{Deserialize, Serialize};

use crate::simulation::action::{ActionRecord, RefusalRecord};
use crate::simulation::directive::Directive;
use crate::simulation::exposure::OperatorExposure;
use crate::simulation::metrics::{PublicMetrics, ReluctanceMetrics};
use crate::simulation::neighborhood::Neighborhood;
use crate::simulation::news::{NewsArticle, NewsChannel};
use crate::simulation::operator::Operator;
use crate::simulation::outcome::OutcomeRecord;
use crate::simulation::protest::Protest;
use crate::simulation::subject::{DomainRecord, Message, Subject};
use crate::simulation::time::SessionClock;
use crate::world::store::EntityStore;

/// Bump whenever the save layout changes. Loads with any other version are
/// treated as "no usable snapshot", never migrated.
pub const SAVE_FORMAT_VERSION: u32 = 1;

/// Full durable snapshot: every table as an id-ordered list plus scalar
/// singleton state. Secondary indexes are deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSave {
    #[serde(default = "default_save_version")]
    pub version: u32,
    pub seed: u64,
    pub clock: SessionClock,
    pub subjects: Vec<Subject>,
    pub records: Vec<DomainRecord>,
    pub messages: Vec<Message>,
    pub operators: Vec<Operator>,
    pub directives: Vec<Directive>,
    pub actions: Vec<ActionRecord>,
    pub refusals: Vec<RefusalRecord>,
    pub outcomes: Vec<OutcomeRecord>,
    pub channels: Vec<NewsChannel>,
    pub articles: Vec<NewsArticle>,
    pub protests: Vec<Protest>,
    pub neighborhoods: Vec<Neighborhood>,
    pub exposures: Vec<OperatorExposure>,
    pub public_metrics: PublicMetrics,
    pub reluctance: ReluctanceMetrics,
}

fn default_save_version() -> u32 {
    SAVE_FORMAT_VERSION
}

/// Extract an id-ordered snapshot of the store.
pub fn extract_session(store: &EntityStore, clock: &SessionClock, seed: u64) -> SessionSave {
    SessionSave {
        version: SAVE_FORMAT_VERSION,
        seed,
        clock: clock.clone(),
        subjects: store.subjects_sorted().into_iter().cloned().collect(),
        records: {
            let mut records: Vec<DomainRecord> = store
                .subjects_sorted()
                .iter()
                .flat_map(|s| store.records_for(s.id))
                .cloned()
                .collect();
            records.sort_by_key(|r| r.id);
            records
        },
        messages: {
            let mut messages: Vec<Message> = store
                .subjects_sorted()
                .iter()
                .flat_map(|s| store.messages_for(s.id))
                .cloned()
                .collect();
            messages.sort_by_key(|m| m.id);
            messages
        },
        operators: store.operators_sorted().into_iter().cloned().collect(),
        directives: store.directives_sorted().into_iter().cloned().collect(),
        actions: store.actions_sorted().into_iter().cloned().collect(),
        refusals: store.refusals_sorted().into_iter().cloned().collect(),
        outcomes: store.outcomes_sorted().into_iter().cloned().collect(),
        channels: store.channels_sorted().into_iter().cloned().collect(),
        articles: store.articles_sorted().into_iter().cloned().collect(),
        protests: store.protests_sorted().into_iter().cloned().collect(),
        neighborhoods: store.neighborhoods_sorted().into_iter().cloned().collect(),
        exposures: store.exposures_sorted().into_iter().cloned().collect(),
        public_metrics: store.public_metrics.clone(),
        reluctance: store.reluctance.clone(),
    }
}

/// Rebuild a store from a snapshot. Every entity goes back in through the
/// normal insert paths so all secondary indexes are reconstructed from the
/// primary tables alone.
pub fn apply_session(save: &SessionSave) -> (EntityStore, SessionClock) {
    let mut store = EntityStore::default();

    for neighborhood in &save.neighborhoods {
        store.insert_neighborhood(neighborhood.clone());
    }
    for channel in &save.channels {
        store.insert_channel(channel.clone());
    }
    for subject in &save.subjects {
        store.insert_subject(subject.clone());
    }
    for record in &save.records {
        store.insert_record(record.clone());
    }
    for message in &save.messages {
        store.insert_message(message.clone());
    }
    for directive in &save.directives {
        store.insert_directive(directive.clone());
    }
    for operator in &save.operators {
        store.insert_operator(operator.clone());
    }
    for action in &save.actions {
        store.insert_action(action.clone());
    }
    for refusal in &save.refusals {
        store.insert_refusal(refusal.clone());
    }
    for outcome in &save.outcomes {
        store.insert_outcome(outcome.clone());
    }
    for article in &save.articles {
        store.insert_article(article.clone());
    }
    for protest in &save.protests {
        store.insert_protest(protest.clone());
    }
    for exposure in &save.exposures {
        store.insert_exposure(exposure.clone());
    }
    store.public_metrics = save.public_metrics.clone();
    store.reluctance = save.reluctance.clone();

    (store, save.clock.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::action::{ActionId, ActionResolution, ActionType, TargetKind};
    use crate::simulation::directive::DirectiveId;
    use crate::simulation::neighborhood::NeighborhoodId;
    use crate::simulation::news::{ArticleId, ChannelId, EditorialStance};
    use crate::simulation::operator::{OperatorId, OperatorStatus};
    use crate::simulation::outcome::{DisruptionTag, OutcomeId};
    use crate::simulation::subject::{
        DomainData, DomainKind, EmploymentStatus, FinanceRecord, MessageId, SocialRecord,
        SubjectId,
    };
    use crate::simulation::time::TimeSkipPeriod;

    fn populated_store() -> EntityStore {
        let mut store = EntityStore::default();
        let district = store.add_neighborhood(Neighborhood {
            id: NeighborhoodId(0),
            name: "Hafenviertel".to_string(),
            population: 41_000,
            unrest: 15,
        });
        let channel = store.add_channel(NewsChannel {
            id: ChannelId(0),
            name: "State Broadcast One".to_string(),
            stance: EditorialStance::State,
            credibility: 60,
        });
        let subject = store.add_subject(Subject {
            id: SubjectId(0),
            name: "Mara Vossen".to_string(),
            age: 34,
            street: "12 Karl-Liebknecht-Str".to_string(),
            neighborhood: district,
            occupation: "teacher".to_string(),
            risk_score: None,
            risk_computed_at: None,
        });
        store
            .add_record(
                subject,
                DomainData::Finance(FinanceRecord {
                    employment: EmploymentStatus::Employed,
                    monthly_income: 2_400,
                    debt: 11_000,
                    missed_payments: 3,
                    irregular_deposits: 1,
                }),
            )
            .unwrap();
        store
            .add_record(
                subject,
                DomainData::Social(SocialRecord {
                    post_excerpts: vec!["they cannot watch all of us".to_string()],
                    sentiment: -55,
                    dependents_mentioned: 2,
                    network_size: 120,
                    flagged_contacts: 3,
                }),
            )
            .unwrap();
        store
            .add_message(Message {
                id: MessageId(0),
                subject,
                week: 1,
                text: "meet at the usual place".to_string(),
                intercepted: true,
            })
            .unwrap();
        let directive = store.add_directive(Directive {
            id: DirectiveId(0),
            week: 1,
            title: "Baseline Monitoring".to_string(),
            brief: "Establish watch files.".to_string(),
            required_domains: vec![DomainKind::Social],
            quota: 3,
            severity: 2,
        });
        let operator = store.add_operator(Operator {
            id: OperatorId(0),
            codename: "K-41".to_string(),
            current_directive: Some(directive),
            total_flags_submitted: 1,
            reviews_completed: 0,
            compliance: 95,
            hesitation_incidents: 0,
            status: OperatorStatus::Active,
            week: 1,
            period: TimeSkipPeriod::Immediate,
        });
        let action = store
            .add_action(ActionRecord {
                id: ActionId(0),
                operator,
                subject: Some(subject),
                target_kind: TargetKind::Citizen,
                target_label: "Mara Vossen".to_string(),
                directive,
                action: ActionType::Monitoring,
                justification: "sentiment profile".to_string(),
                decision_seconds: 6,
                hesitation: false,
                resolution: ActionResolution::Deterministic,
                week: 1,
            })
            .unwrap();
        store
            .add_outcome(OutcomeRecord {
                id: OutcomeId(0),
                action,
                period: TimeSkipPeriod::OneMonth,
                narrative: "Mara noticed the van outside her school.".to_string(),
                tags: vec![DisruptionTag::Surveilled],
                generated_week: 2,
            })
            .unwrap();
        store
            .add_article(NewsArticle {
                id: ArticleId(0),
                channel,
                headline: "Order Restored Downtown".to_string(),
                body: "Officials praised the operation.".to_string(),
                week: 1,
                triggering_action: Some(action),
                suppressed: false,
            })
            .unwrap();
        store.add_protest(Protest {
            id: crate::simulation::protest::ProtestId(0),
            neighborhood: district,
            cause: "curfew".to_string(),
            size: 300,
            momentum: 40,
            status: crate::simulation::protest::ProtestStatus::Forming,
            has_inciting_agent: false,
            week_started: 1,
            triggering_action: None,
        });
        store.insert_exposure(OperatorExposure::new(operator));
        store.public_metrics.awareness = 33;
        store.reluctance.score = 12;
        store
    }

    #[test]
    fn save_then_load_preserves_every_lookup() {
        let store = populated_store();
        let clock = SessionClock { tick: 77 };
        let save = extract_session(&store, &clock, 9);
        let (restored, restored_clock) = apply_session(&save);

        assert_eq!(restored_clock.tick, 77);

        let subject = store.subjects_sorted()[0].id;
        assert_eq!(restored.subject(subject), store.subject(subject));
        assert_eq!(
            restored.subject_by_name("mara vossen").map(|s| s.id),
            store.subject_by_name("mara vossen").map(|s| s.id)
        );
        assert_eq!(
            restored.record_for(subject, DomainKind::Finance),
            store.record_for(subject, DomainKind::Finance)
        );
        assert_eq!(restored.present_domains(subject), store.present_domains(subject));
        assert_eq!(restored.messages_for(subject), store.messages_for(subject));

        let operator = store.operators_sorted()[0].id;
        assert_eq!(restored.operator(operator), store.operator(operator));
        assert_eq!(
            restored.actions_for_operator(operator),
            store.actions_for_operator(operator)
        );
        let action = store.actions_for_operator(operator)[0].id;
        assert_eq!(
            restored.outcome_for(action, TimeSkipPeriod::OneMonth),
            store.outcome_for(action, TimeSkipPeriod::OneMonth)
        );
        assert_eq!(restored.articles_sorted(), store.articles_sorted());
        assert_eq!(restored.protests_sorted(), store.protests_sorted());
        assert_eq!(restored.public_metrics, store.public_metrics);
        assert_eq!(restored.reluctance, store.reluctance);
    }

    #[test]
    fn restored_ids_do_not_collide_with_new_inserts() {
        let store = populated_store();
        let save = extract_session(&store, &SessionClock::default(), 0);
        let (mut restored, _) = apply_session(&save);

        let existing_max = store.subjects_sorted().last().unwrap().id;
        let fresh = restored.add_subject(Subject {
            id: SubjectId(0),
            name: "Ilya Brandt".to_string(),
            age: 41,
            street: "3 Ringstrasse".to_string(),
            neighborhood: store.neighborhoods_sorted()[0].id,
            occupation: "mechanic".to_string(),
            risk_score: None,
            risk_computed_at: None,
        });
        assert!(fresh > existing_max);
    }
}
