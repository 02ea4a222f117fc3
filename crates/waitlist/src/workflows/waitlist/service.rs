use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tracing::{error, info, warn};

use super::domain::{ApplicationRecord, PhotoAttachment, WaitlistPosition};
use super::payload::IntakePayload;
use super::repository::{ApplicationRepository, AssetStore, AssetStoreError, RepositoryError};
use super::screening::{IntakeGuard, ValidationError};
use super::steps::photo_media_type;
use crate::config::{IntakeConfig, DEFAULT_BASE_OFFSET, DEFAULT_MAX_PHOTO_BYTES};

/// Dials for the intake pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitlistPolicy {
    pub base_offset: u64,
    pub max_photo_bytes: usize,
}

impl Default for WaitlistPolicy {
    fn default() -> Self {
        Self {
            base_offset: DEFAULT_BASE_OFFSET,
            max_photo_bytes: DEFAULT_MAX_PHOTO_BYTES,
        }
    }
}

impl From<&IntakeConfig> for WaitlistPolicy {
    fn from(config: &IntakeConfig) -> Self {
        Self {
            base_offset: config.base_offset,
            max_photo_bytes: config.max_photo_bytes,
        }
    }
}

/// Outcome of an accepted submission.
#[derive(Debug, Clone)]
pub struct WaitlistReceipt {
    pub record: ApplicationRecord,
    pub position: WaitlistPosition,
}

/// Stateless intake pipeline: screen, store the photo, dedupe, persist, position.
pub struct WaitlistIntakeService<R, S> {
    guard: Arc<IntakeGuard>,
    repository: Arc<R>,
    assets: Arc<S>,
    policy: WaitlistPolicy,
}

impl<R, S> WaitlistIntakeService<R, S>
where
    R: ApplicationRepository + 'static,
    S: AssetStore + 'static,
{
    pub fn new(repository: Arc<R>, assets: Arc<S>, policy: WaitlistPolicy) -> Self {
        let guard = Arc::new(IntakeGuard::new(policy.max_photo_bytes));
        Self {
            guard,
            repository,
            assets,
            policy,
        }
    }

    pub fn policy(&self) -> WaitlistPolicy {
        self.policy
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn handle(&self, payload: IntakePayload) -> Result<WaitlistReceipt, IntakeError> {
        self.handle_at(payload, Local::now())
    }

    /// Run the pipeline as of `now`. Any failing stage short-circuits the rest.
    pub fn handle_at(
        &self,
        payload: IntakePayload,
        now: DateTime<Local>,
    ) -> Result<WaitlistReceipt, IntakeError> {
        let screened = self
            .guard
            .screen(payload, now.date_naive())
            .inspect_err(|err| warn!(error = %err, "submission failed validation"))?;
        let applicant = screened.applicant;
        info!(email = %applicant.email, "screened waitlist application");

        let photo_path = match screened.photo {
            Some(photo) => Some(self.store_photo(&applicant.email, photo, now)?),
            None => None,
        };

        let exists = self
            .repository
            .exists_by_email(&applicant.email)
            .map_err(|err| persistence_failure(err, photo_path.as_deref()))?;
        if exists {
            warn!(email = %applicant.email, "duplicate application rejected");
            note_orphan(photo_path.as_deref());
            return Err(IntakeError::Conflict);
        }

        let record = ApplicationRecord {
            applicant,
            profile_photo_url: photo_path.clone(),
            created_at: now.with_timezone(&Utc),
        };

        let record = match self.repository.insert(record) {
            Ok(record) => record,
            Err(RepositoryError::Conflict) => {
                // Lost a race against a concurrent submission with the same email.
                warn!("duplicate application rejected by storage constraint");
                note_orphan(photo_path.as_deref());
                return Err(IntakeError::Conflict);
            }
            Err(err) => return Err(persistence_failure(err, photo_path.as_deref())),
        };

        let position = match self.repository.count() {
            Ok(count) => WaitlistPosition::after_insert(self.policy.base_offset, count),
            Err(err) => {
                warn!(error = %err, "record count unavailable; reporting base offset");
                WaitlistPosition(self.policy.base_offset)
            }
        };

        info!(email = %record.email(), %position, "application accepted");
        Ok(WaitlistReceipt { record, position })
    }

    fn store_photo(
        &self,
        email: &str,
        photo: PhotoAttachment,
        now: DateTime<Local>,
    ) -> Result<String, IntakeError> {
        let key = photo_key(email, &photo, now);
        self.assets.put(&key, photo.bytes).map_err(|err| {
            error!(%key, error = %err, "profile photo upload failed");
            IntakeError::Storage(err)
        })
    }
}

/// `<email>-<unix millis>.<ext>`; the extension comes from the file name, else the media type.
/// Path separators become `_` so the key is always a single file name.
pub fn photo_key(email: &str, photo: &PhotoAttachment, now: DateTime<Local>) -> String {
    let extension = photo.extension().or_else(|| {
        photo_media_type(photo).and_then(|media| {
            if media.subtype() == mime::JPEG {
                Some("jpg".to_string())
            } else if media.subtype() == mime::PNG {
                Some("png".to_string())
            } else {
                None
            }
        })
    });

    let key = match extension {
        Some(ext) => format!("{email}-{}.{ext}", now.timestamp_millis()),
        None => format!("{email}-{}", now.timestamp_millis()),
    };
    key.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

fn note_orphan(photo_path: Option<&str>) {
    if let Some(path) = photo_path {
        warn!(%path, "stored profile photo has no matching application");
    }
}

fn persistence_failure(err: RepositoryError, photo_path: Option<&str>) -> IntakeError {
    error!(error = %err, "application persistence failed");
    note_orphan(photo_path);
    IntakeError::Persistence(err)
}

/// Error raised by the intake pipeline.
#[derive(Debug, thiserror::Error)]
pub enum IntakeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("An application with this email already exists")]
    Conflict,
    #[error("Failed to upload profile photo")]
    Storage(#[source] AssetStoreError),
    #[error("Failed to submit application")]
    Persistence(#[source] RepositoryError),
    #[error("Internal server error")]
    Unknown(String),
}
