pub mod feeds;
pub mod flagging;
pub mod progression;
pub mod termination;

pub use flagging::{
    execute_flag, execute_no_action, ActionError, FlagReport, FlagRequest, RefusalReport,
    RefusalRequest,
};
pub use progression::{advance_directive, AdvanceReport, ProgressionError};
pub use termination::{check_termination, TerminationDecision};
