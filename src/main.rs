use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::error;
use tracing_subscriber::EnvFilter;

use surveillance_state::content::BuiltinRoster;
use surveillance_state::core::controller::SessionController;
use surveillance_state::data::SimulationConfig;
use surveillance_state::simulation::action::{ActionTarget, ActionType};
use surveillance_state::systems::flagging::FlagRequest;
use surveillance_state::world::SnapshotDb;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let (db_path, seed) = parse_args(env::args().collect());
    match run(db_path, seed) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "session failed");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> (PathBuf, u64) {
    let db_path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./session.db"));
    let seed = args
        .get(2)
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(1984);
    (db_path, seed)
}

/// Scripted week-one walkthrough against the built-in roster; a stand-in
/// client for the presentation layer this crate does not ship.
fn run(db_path: PathBuf, seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let repository = SnapshotDb::open(&db_path)?;
    let mut session = SessionController::resume_or_new(
        SimulationConfig::builtin(),
        seed,
        "D-7",
        Box::new(repository),
        Box::new(BuiltinRoster),
    )?;

    let dashboard = session.dashboard()?;
    println!("week {} :: operator {}", dashboard.week, dashboard.operator.codename);
    if let Some(directive) = &dashboard.directive {
        println!(
            "directive: {} ({} of {} flags)",
            directive.title, directive.submitted, directive.quota
        );
    }

    // Work the current directive to quota with monitoring flags, then file
    // one refusal so every pipeline is exercised.
    let mut request_id = 1u64;
    if let Some(directive) = dashboard.directive {
        let mut submitted = directive.submitted;
        for summary in &dashboard.subjects {
            if submitted >= directive.quota {
                break;
            }
            let file = session.subject_file(summary.id)?;
            println!(
                "  file {} :: risk {:.1} ({:?}), {} factors",
                file.subject.name,
                file.assessment.score,
                file.assessment.level,
                file.assessment.contributing_factors.len()
            );
            let report = session.submit_flag(
                request_id,
                FlagRequest {
                    operator: session.operator_id(),
                    target: ActionTarget::Citizen(summary.id),
                    action: ActionType::Monitoring,
                    justification: "directive sweep".to_string(),
                    decision_seconds: 8,
                },
            )?;
            request_id += 1;
            submitted += 1;
            println!("  flagged {} ({:?})", summary.name, report.resolution);
        }

        let advance = session.advance_directive()?;
        println!(
            "advanced to week {} ({:?}), {} new outcomes",
            advance.week,
            advance.period,
            advance.new_outcomes.len()
        );
    }

    session.poll(16);
    for article in session.recent_news(3) {
        println!("news: {}", article.headline);
    }
    for protest in session.active_protests() {
        println!("protest: {} ({:?})", protest.cause, protest.status);
    }

    let metrics = session.public_metrics();
    println!(
        "public: awareness {} ({:?}), anger {} ({:?}), trust {}",
        metrics.awareness, metrics.awareness_tier, metrics.anger, metrics.anger_tier, metrics.trust
    );

    if let Some(report) = session.ending()? {
        println!("ending: {:?} ({:?})", report.category, report.stats);
    }

    session.shutdown();
    Ok(())
}
