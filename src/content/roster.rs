use crate::simulation::neighborhood::{Neighborhood, NeighborhoodId};
use crate::simulation::news::{ChannelId, EditorialStance, NewsChannel};
use crate::simulation::protest::{Protest, ProtestId, ProtestStatus};
use crate::simulation::subject::{
    DomainData, EmploymentStatus, FinanceRecord, HealthRecord, JudicialRecord, LocationRecord,
    Message, MessageId, SocialRecord, Subject, SubjectId,
};
use crate::world::store::{EntityStore, StoreError};

/// Ids handed back from population ingest so the caller can address what was
/// created without re-querying by name.
#[derive(Debug, Clone, Default)]
pub struct BootstrapSummary {
    pub neighborhoods: Vec<NeighborhoodId>,
    pub channels: Vec<ChannelId>,
    pub subjects: Vec<SubjectId>,
    pub protests: Vec<ProtestId>,
}

/// Ingest interface for citizen data. Full population generation lives
/// outside this crate; implementations only need to fill an empty store.
pub trait PopulationSource {
    fn populate(&self, store: &mut EntityStore) -> Result<BootstrapSummary, StoreError>;
}

/// Small fixed roster used by the demo binary and the integration tests.
/// Deterministic: no rng, identical ids on every run against a fresh store.
pub struct BuiltinRoster;

impl PopulationSource for BuiltinRoster {
    fn populate(&self, store: &mut EntityStore) -> Result<BootstrapSummary, StoreError> {
        let mut summary = BootstrapSummary::default();

        let veldt = store.add_neighborhood(Neighborhood {
            id: NeighborhoodId(0),
            name: "Veldt Quarter".to_string(),
            population: 41_000,
            unrest: 25,
        });
        let harbor = store.add_neighborhood(Neighborhood {
            id: NeighborhoodId(0),
            name: "Harbor Rows".to_string(),
            population: 58_000,
            unrest: 40,
        });
        let terraces = store.add_neighborhood(Neighborhood {
            id: NeighborhoodId(0),
            name: "Ministry Terraces".to_string(),
            population: 23_000,
            unrest: 10,
        });
        summary.neighborhoods = vec![veldt, harbor, terraces];

        for (name, stance, credibility) in [
            ("State Broadcast One", EditorialStance::State, 35),
            ("The Harbor Ledger", EditorialStance::Independent, 70),
            ("The Cellar Press", EditorialStance::Underground, 60),
        ] {
            summary.channels.push(store.add_channel(NewsChannel {
                id: ChannelId(0),
                name: name.to_string(),
                stance,
                credibility,
            }));
        }

        let subject = |store: &mut EntityStore,
                           name: &str,
                           age: u32,
                           street: &str,
                           neighborhood: NeighborhoodId,
                           occupation: &str|
         -> SubjectId {
            store.add_subject(Subject {
                id: SubjectId(0),
                name: name.to_string(),
                age,
                street: street.to_string(),
                neighborhood,
                occupation: occupation.to_string(),
                risk_score: None,
                risk_computed_at: None,
            })
        };

        // Mara Vossen: debt spiral plus hostile posts, the week-one exemplar.
        let mara = subject(store, "Mara Vossen", 34, "Kanaalstraat 12", veldt, "archivist");
        store.add_record(
            mara,
            DomainData::Finance(FinanceRecord {
                employment: EmploymentStatus::Employed,
                monthly_income: 1_900,
                debt: 11_400,
                missed_payments: 4,
                irregular_deposits: 0,
            }),
        )?;
        store.add_record(
            mara,
            DomainData::Social(SocialRecord {
                post_excerpts: vec![
                    "They raised the quota again. How long do we keep pretending?".to_string(),
                    "Saw the vans on Kanaalstraat at dawn. Third time this month.".to_string(),
                ],
                sentiment: -45,
                dependents_mentioned: 2,
                network_size: 140,
                flagged_contacts: 1,
            }),
        )?;
        store.add_record(
            mara,
            DomainData::Health(HealthRecord {
                conditions: vec!["asthma".to_string()],
                chronic: true,
                medications: 2,
                last_visit_week: 0,
            }),
        )?;
        store.add_message(Message {
            id: MessageId(0),
            subject: mara,
            week: 1,
            text: "Don't talk about the march on the phone. Meet at the usual place."
                .to_string(),
            intercepted: true,
        })?;

        // Ilya Brandt: organizer profile, judicial history, night movement.
        let ilya = subject(store, "Ilya Brandt", 41, "Dokweg 7", harbor, "dock foreman");
        store.add_record(
            ilya,
            DomainData::Judicial(JudicialRecord {
                prior_arrests: 2,
                open_case: true,
                associates_flagged: 4,
            }),
        )?;
        store.add_record(
            ilya,
            DomainData::Location(LocationRecord {
                home_neighborhood: harbor,
                frequent_venues: vec!["union hall".to_string(), "pier 9 canteen".to_string()],
                night_travel_events: 6,
                border_crossings: 0,
            }),
        )?;
        store.add_record(
            ilya,
            DomainData::Social(SocialRecord {
                post_excerpts: vec!["The harbor feeds this city. Remember that.".to_string()],
                sentiment: -30,
                dependents_mentioned: 0,
                network_size: 420,
                flagged_contacts: 5,
            }),
        )?;
        store.add_message(Message {
            id: MessageId(0),
            subject: ilya,
            week: 1,
            text: "Shift change at six. Bring the lists.".to_string(),
            intercepted: true,
        })?;

        // Sana Okafor: unemployed, dependents, informal income.
        let sana = subject(store, "Sana Okafor", 29, "Weverstraat 3", veldt, "seamstress");
        store.add_record(
            sana,
            DomainData::Finance(FinanceRecord {
                employment: EmploymentStatus::Unemployed,
                monthly_income: 0,
                debt: 2_100,
                missed_payments: 2,
                irregular_deposits: 3,
            }),
        )?;
        store.add_record(
            sana,
            DomainData::Social(SocialRecord {
                post_excerpts: vec!["Selling the sewing machine. Children need shoes.".to_string()],
                sentiment: -10,
                dependents_mentioned: 3,
                network_size: 60,
                flagged_contacts: 0,
            }),
        )?;

        // Teodor Malek: border contact, medication load.
        let teodor = subject(store, "Teodor Malek", 57, "Grenslaan 88", harbor, "courier");
        store.add_record(
            teodor,
            DomainData::Location(LocationRecord {
                home_neighborhood: harbor,
                frequent_venues: vec!["eastern terminal".to_string()],
                night_travel_events: 2,
                border_crossings: 3,
            }),
        )?;
        store.add_record(
            teodor,
            DomainData::Health(HealthRecord {
                conditions: vec!["hypertension".to_string(), "arrhythmia".to_string()],
                chronic: true,
                medications: 4,
                last_visit_week: 1,
            }),
        )?;

        // Petra Lindh: clean ministry-district file, the control case.
        let petra = subject(store, "Petra Lindh", 45, "Ministerieplein 2", terraces, "clerk");
        store.add_record(
            petra,
            DomainData::Finance(FinanceRecord {
                employment: EmploymentStatus::Employed,
                monthly_income: 3_200,
                debt: 0,
                missed_payments: 0,
                irregular_deposits: 0,
            }),
        )?;
        store.add_record(
            petra,
            DomainData::Social(SocialRecord {
                post_excerpts: vec!["Lovely parade this morning.".to_string()],
                sentiment: 40,
                dependents_mentioned: 1,
                network_size: 85,
                flagged_contacts: 0,
            }),
        )?;

        // Viktor Reza: informal economy, repeat arrests.
        let viktor = subject(store, "Viktor Reza", 23, "Achterhaven 19", harbor, "day laborer");
        store.add_record(
            viktor,
            DomainData::Finance(FinanceRecord {
                employment: EmploymentStatus::Informal,
                monthly_income: 700,
                debt: 900,
                missed_payments: 1,
                irregular_deposits: 5,
            }),
        )?;
        store.add_record(
            viktor,
            DomainData::Judicial(JudicialRecord {
                prior_arrests: 3,
                open_case: false,
                associates_flagged: 2,
            }),
        )?;

        // Alma Stroud: journalist adjacent, large network.
        let alma = subject(store, "Alma Stroud", 38, "Drukkerijgang 5", veldt, "typesetter");
        store.add_record(
            alma,
            DomainData::Social(SocialRecord {
                post_excerpts: vec![
                    "Print is not dead while one press still turns.".to_string(),
                    "Ask who benefits from the curfew.".to_string(),
                ],
                sentiment: -55,
                dependents_mentioned: 0,
                network_size: 510,
                flagged_contacts: 7,
            }),
        )?;
        store.add_record(
            alma,
            DomainData::Location(LocationRecord {
                home_neighborhood: veldt,
                frequent_venues: vec!["the cellar press".to_string()],
                night_travel_events: 4,
                border_crossings: 0,
            }),
        )?;

        // Henrik Voss: quiet file, one old arrest.
        let henrik = subject(store, "Henrik Voss", 61, "Tuinpad 31", terraces, "retired teacher");
        store.add_record(
            henrik,
            DomainData::Judicial(JudicialRecord {
                prior_arrests: 1,
                open_case: false,
                associates_flagged: 0,
            }),
        )?;
        store.add_record(
            henrik,
            DomainData::Health(HealthRecord {
                conditions: vec!["diabetes".to_string()],
                chronic: true,
                medications: 3,
                last_visit_week: 1,
            }),
        )?;

        summary.subjects = vec![mara, ilya, sana, teodor, petra, viktor, alma, henrik];

        summary.protests.push(store.add_protest(Protest {
            id: ProtestId(0),
            neighborhood: harbor,
            cause: "dock pay arrears".to_string(),
            size: 180,
            momentum: 35,
            status: ProtestStatus::Forming,
            has_inciting_agent: false,
            week_started: 1,
            triggering_action: None,
        }));

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_is_deterministic_across_runs() {
        let mut a = EntityStore::default();
        let mut b = EntityStore::default();
        BuiltinRoster.populate(&mut a).unwrap();
        BuiltinRoster.populate(&mut b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn roster_files_are_addressable_by_name() {
        let mut store = EntityStore::default();
        let summary = BuiltinRoster.populate(&mut store).unwrap();
        assert_eq!(summary.subjects.len(), 8);
        let mara = store.subject_by_name("mara vossen").unwrap();
        assert_eq!(store.records_for(mara.id).len(), 3);
        assert_eq!(store.messages_for(mara.id).len(), 1);
    }
}
