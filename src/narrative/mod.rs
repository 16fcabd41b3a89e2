pub mod outcomes;

pub use outcomes::{build_context, instantiate, OutcomeContext};
