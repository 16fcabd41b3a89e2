pub mod cache;
pub mod controller;
pub mod ecs;
pub mod serialization;

pub use cache::{PollClock, RequestLedger, SubjectFileCache};
pub use controller::{
    Dashboard, DirectiveView, ExposureView, OperatorView, PublicMetricsView, ReluctanceView,
    SessionController, SessionError, SubjectFile, SubjectSummary,
};
pub use ecs::{create_feed_schedule, create_session_world, FeedSet, SessionRng};
pub use serialization::{apply_session, extract_session, SessionSave, SAVE_FORMAT_VERSION};
