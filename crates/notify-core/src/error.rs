//! Collaborator error types. Both are logged where they occur and never
//! returned from [`Aggregator`](crate::Aggregator) operations.

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] notify_db::DbError),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Encode(String),

    #[error("sink unavailable: {0}")]
    Unavailable(String),
}
