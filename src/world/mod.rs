pub mod repository;
pub mod sqlite;
pub mod store;

pub use repository::{SnapshotError, SnapshotRepository};
pub use sqlite::SnapshotDb;
pub use store::{EntityStore, StoreError};
