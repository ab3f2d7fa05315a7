#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("a record with this key already exists")]
    Conflict,
}

pub type StoreResult<T> = Result<T, StoreError>;
