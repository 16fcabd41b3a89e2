use thiserror::Error;

use crate::core::serialization::SessionSave;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("snapshot payload corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Durable snapshot boundary. The in-memory store is always authoritative;
/// a failed save is logged by the controller and never unwinds past it.
pub trait SnapshotRepository {
    /// `Ok(None)` means no usable snapshot (absent or version mismatch).
    fn load(&mut self) -> Result<Option<SessionSave>, SnapshotError>;
    fn save(&mut self, save: &SessionSave) -> Result<(), SnapshotError>;
    fn clear(&mut self) -> Result<(), SnapshotError>;
}
