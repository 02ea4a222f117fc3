use super::domain::ApplicationRecord;

/// Storage abstraction so the intake service can be exercised in isolation.
///
/// Implementations must reject a second record with the same email on `insert`; that
/// constraint is what guards against two concurrent submissions slipping past
/// `exists_by_email`.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError>;
    fn count(&self) -> Result<u64, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("an application with this email already exists")]
    Conflict,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Keyed blob storage for profile photos. Returns the stored path.
pub trait AssetStore: Send + Sync {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, AssetStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AssetStoreError {
    #[error("asset store rejected '{key}': {reason}")]
    Rejected { key: String, reason: String },
    #[error("asset store i/o failure: {0}")]
    Io(#[from] std::io::Error),
}
