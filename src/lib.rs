// Re-export core modules for use by the binary or other consumers
pub mod content;
pub mod core;
pub mod data;
pub mod narrative;
pub mod rules;
pub mod simulation;
pub mod systems;
pub mod world;

// Expose the session controller and the types needed to drive it
pub use crate::core::controller::{Dashboard, SessionController, SessionError, SubjectFile};
pub use crate::core::serialization::SessionSave;
pub use crate::systems::flagging::{FlagReport, FlagRequest, RefusalReport, RefusalRequest};
