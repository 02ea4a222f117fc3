use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use waitlist::workflows::waitlist::{
    ApplicationRecord, ApplicationRepository, AssetStore, AssetStoreError, RepositoryError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Process-local application table with a unique constraint on email.
#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<Vec<ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.iter().any(|existing| existing.email() == record.email()) {
            return Err(RepositoryError::Conflict);
        }
        guard.push(record.clone());
        Ok(record)
    }

    fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.iter().any(|record| record.email() == email))
    }

    fn count(&self) -> Result<u64, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.len() as u64)
    }
}

/// Writes profile photos under a local directory, created on first use.
#[derive(Debug, Clone)]
pub(crate) struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub(crate) fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetStore for LocalAssetStore {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, AssetStoreError> {
        let mut components = Path::new(key).components();
        let single_file = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single_file {
            return Err(AssetStoreError::Rejected {
                key: key.to_string(),
                reason: "key must be a plain file name".to_string(),
            });
        }

        fs::create_dir_all(&self.root)?;
        let path = self.root.join(key);
        fs::write(&path, bytes)?;
        Ok(path.display().to_string())
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
