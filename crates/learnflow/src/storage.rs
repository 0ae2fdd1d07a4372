/// Error enumeration for repository failures. Domain rules never surface through
/// this type; it covers storage faults only, so callers can treat `Unavailable` as
/// retryable and everything else as a contract violation.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
