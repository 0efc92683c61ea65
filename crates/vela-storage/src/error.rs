use thiserror::Error;

/// Errors that can occur in substrate operations.
///
/// Any of these is fatal to the operation in progress; the caller is
/// expected to surface it and reopen the engine.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupted record in map '{map}': {detail}")]
    Corrupted { map: String, detail: String },

    #[error("Map name too long: {0} bytes")]
    MapNameTooLong(usize),

    #[error("IO error: {0}")]
    Io(String),
}

impl From<rocksdb::Error> for StorageError {
    fn from(e: rocksdb::Error) -> Self {
        StorageError::Database(e.to_string())
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e.to_string())
    }
}
