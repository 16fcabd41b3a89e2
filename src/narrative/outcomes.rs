use rand::Rng;

use crate::data::outcome_templates::FillerPools;
use crate::rules::factors::DomainView;
use crate::simulation::subject::{EmploymentStatus, SubjectId};
use crate::world::store::EntityStore;

/// Resolved substitution set for one outcome. Filler values are drawn once
/// when the context is built; instantiation itself is pure.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeContext {
    pub name: String,
    pub family_event: String,
    pub detention_condition: String,
    pub connections_lost: String,
    pub health_note: String,
    pub dependents_note: String,
    pub employment_note: String,
}

/// Build the substitution set for a target: uniform draws from the filler
/// pools plus personalization read from the subject's domain records (none
/// for protest/news targets).
pub fn build_context<R: Rng>(
    store: &EntityStore,
    subject: Option<SubjectId>,
    target_label: &str,
    pools: &FillerPools,
    rng: &mut R,
) -> OutcomeContext {
    let family_event = pools.family_events[rng.gen_range(0..pools.family_events.len())].clone();
    let detention_condition =
        pools.detention_conditions[rng.gen_range(0..pools.detention_conditions.len())].clone();
    let connections_lost =
        pools.connections_lost[rng.gen_range(0..pools.connections_lost.len())].to_string();

    let mut health_note = String::new();
    let mut dependents_note = String::new();
    let mut employment_note = String::new();
    if let Some(subject) = subject {
        let view = DomainView::collect(store, subject);
        if let Some(health) = view.health {
            if health.chronic {
                health_note =
                    "A chronic condition has gone months without regular care.".to_string();
            }
        }
        if let Some(social) = view.social {
            if social.dependents_mentioned > 0 {
                dependents_note = format!(
                    "{} dependents now live with relatives.",
                    social.dependents_mentioned
                );
            }
        }
        if let Some(finance) = view.finance {
            employment_note = match finance.employment {
                EmploymentStatus::Employed => {
                    "The employer ended the contract under quiet pressure.".to_string()
                }
                EmploymentStatus::Unemployed => {
                    "Work was already scarce; now it is gone entirely.".to_string()
                }
                EmploymentStatus::Informal => {
                    "The informal day-work dried up once word spread.".to_string()
                }
            };
        }
    }

    OutcomeContext {
        name: target_label.to_string(),
        family_event,
        detention_condition,
        connections_lost,
        health_note,
        dependents_note,
        employment_note,
    }
}

/// Substitute every named placeholder, then scrub any leftover `{token}` to
/// empty. Order independent and idempotent: re-applying the set to the
/// result is a no-op, and unmatched tokens never survive as literals.
pub fn instantiate(template: &str, context: &OutcomeContext) -> String {
    let pairs: [(&str, &str); 7] = [
        ("{name}", &context.name),
        ("{family_event}", &context.family_event),
        ("{detention_condition}", &context.detention_condition),
        ("{connections_lost}", &context.connections_lost),
        ("{health_note}", &context.health_note),
        ("{dependents_note}", &context.dependents_note),
        ("{employment_note}", &context.employment_note),
    ];
    let mut text = template.to_string();
    for (token, value) in pairs {
        text = text.replace(token, value);
    }
    tidy(&scrub_tokens(&text))
}

/// Remove any remaining `{identifier}` placeholder.
fn scrub_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end)
                if after[..end]
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_') =>
            {
                rest = &after[end + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// Collapse the whitespace gaps left behind by empty substitutions.
fn tidy(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for c in text.chars() {
        if c == ' ' {
            if !last_space {
                out.push(c);
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> OutcomeContext {
        OutcomeContext {
            name: "Mara Vossen".to_string(),
            family_event: "Her mother calls less often now.".to_string(),
            detention_condition: "Visits are monthly, through glass.".to_string(),
            connections_lost: "5".to_string(),
            health_note: String::new(),
            dependents_note: "2 dependents now live with relatives.".to_string(),
            employment_note: String::new(),
        }
    }

    #[test]
    fn placeholders_are_substituted() {
        let text = instantiate("{name} was taken. {detention_condition}", &context());
        assert_eq!(text, "Mara Vossen was taken. Visits are monthly, through glass.");
    }

    #[test]
    fn unmatched_tokens_are_scrubbed_not_left_literal() {
        let text = instantiate("{name} lost {unknown_token} everything. {health_note}", &context());
        assert_eq!(text, "Mara Vossen lost everything.");
        assert!(!text.contains('{'));
    }

    #[test]
    fn instantiation_is_idempotent() {
        let once = instantiate("{name}: {family_event} {connections_lost} gone.", &context());
        let twice = instantiate(&once, &context());
        assert_eq!(once, twice);
    }

    #[test]
    fn non_token_braces_survive() {
        let text = instantiate("literal {not a token} stays", &context());
        assert_eq!(text, "literal {not a token} stays");
    }
}
