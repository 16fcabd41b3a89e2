pub mod action_defs;
pub mod directives;
pub mod endings;
pub mod outcome_templates;
pub mod risk_rules;

use std::fs;
use std::path::Path;

use bevy_ecs::prelude::*;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use action_defs::ActionCatalog;
pub use directives::DirectiveCatalog;
pub use endings::EndingThresholds;
pub use outcome_templates::OutcomeTemplateCatalog;
pub use risk_rules::RiskRuleSet;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{0}")]
    Validation(String),
}

pub(crate) fn load_json_catalog<T: DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<T, ConfigError> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Every rule table the engine consumes, validated as a unit at startup.
/// Partial or malformed tables are fatal; the engine never runs on a
/// half-loaded configuration.
#[derive(Resource, Debug, Clone)]
pub struct SimulationConfig {
    pub risk: RiskRuleSet,
    pub actions: ActionCatalog,
    pub directives: DirectiveCatalog,
    pub templates: OutcomeTemplateCatalog,
    pub endings: EndingThresholds,
}

impl SimulationConfig {
    /// The compiled-in rule tables used when no external override is given.
    pub fn builtin() -> Self {
        Self {
            risk: RiskRuleSet::builtin(),
            actions: ActionCatalog::builtin(),
            directives: DirectiveCatalog::builtin(),
            templates: OutcomeTemplateCatalog::builtin(),
            endings: EndingThresholds::default(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.risk.validate()?;
        self.actions.validate()?;
        self.directives.validate()?;
        self.templates.validate(&self.actions)?;
        Ok(())
    }
}
