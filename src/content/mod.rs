pub mod roster;

pub use roster::{BootstrapSummary, BuiltinRoster, PopulationSource};
