#[derive(Debug, Clone, Hash, Eq, PartialEq, uniffi::Error, thiserror::Error)]
pub enum DatabaseError {
    #[error("failed to open database: {0}")]
    DatabaseAccess(String),

    #[error("failed to open table: {0}")]
    TableAccess(String),

    #[error("failed to read: {0}")]
    Read(String),

    #[error("failed to save: {0}")]
    Save(String),

    #[error("unable to serialize or deserialize: {0}")]
    Serialization(String),
}
