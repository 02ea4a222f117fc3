use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::response::Response;
use chrono::{DateTime, Local, NaiveDate, TimeZone};
use serde_json::Value;

use crate::workflows::waitlist::domain::{ApplicationDraft, ApplicationRecord, Interest, PhotoAttachment};
use crate::workflows::waitlist::payload::IntakePayload;
use crate::workflows::waitlist::repository::{
    ApplicationRepository, AssetStore, AssetStoreError, RepositoryError,
};
use crate::workflows::waitlist::service::{WaitlistIntakeService, WaitlistPolicy};
use crate::workflows::waitlist::submission::{
    SubmissionTransport, TransportError, TransportResponse,
};

pub(super) fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
}

pub(super) fn now() -> DateTime<Local> {
    Local
        .with_ymd_and_hms(2026, 10, 18, 12, 0, 0)
        .single()
        .expect("unambiguous local time")
}

pub(super) fn png_photo() -> PhotoAttachment {
    PhotoAttachment::new("me.png", "image/png", vec![0x89, b'P', b'N', b'G'])
}

pub(super) fn ada_payload() -> IntakePayload {
    IntakePayload {
        first_name: Some("Ada".to_string()),
        last_name: Some("Lovelace".to_string()),
        email: Some("Ada@Example.com".to_string()),
        date_of_birth: Some("1990-12-10".to_string()),
        country: Some("United States".to_string()),
        state: Some("CA".to_string()),
        city: Some("Palo Alto".to_string()),
        zip_code: Some("94301".to_string()),
        reasons: Some(vec!["Networking".to_string()]),
        sms_updates: Some(false),
        ..IntakePayload::default()
    }
}

pub(super) fn payload_for(email: &str) -> IntakePayload {
    IntakePayload {
        email: Some(email.to_string()),
        ..ada_payload()
    }
}

pub(super) fn ada_draft() -> ApplicationDraft {
    let mut draft = ApplicationDraft {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        date_of_birth: "1990-12-10".to_string(),
        country: "United States".to_string(),
        state: "CA".to_string(),
        city: "Palo Alto".to_string(),
        postal_code: "94301".to_string(),
        ..ApplicationDraft::default()
    };
    draft.interests.insert(Interest::Networking);
    draft
}

pub(super) type MemoryService = WaitlistIntakeService<MemoryRepository, MemoryAssets>;

pub(super) fn build_service() -> (MemoryService, Arc<MemoryRepository>, Arc<MemoryAssets>) {
    let repository = Arc::new(MemoryRepository::default());
    let assets = Arc::new(MemoryAssets::default());
    let service = WaitlistIntakeService::new(
        repository.clone(),
        assets.clone(),
        WaitlistPolicy::default(),
    );
    (service, repository, assets)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<Vec<ApplicationRecord>>>,
}

impl MemoryRepository {
    pub(super) fn records(&self) -> Vec<ApplicationRecord> {
        self.records.lock().expect("repository mutex poisoned").clone()
    }
}

impl ApplicationRepository for MemoryRepository {
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

/// Never sees the duplicate up front, so only the insert constraint catches it.
pub(super) struct RacyRepository {
    pub(super) inner: MemoryRepository,
}

impl ApplicationRepository for RacyRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn exists_by_email(&self, _email: &str) -> Result<bool, RepositoryError> {
        Ok(false)
    }

    fn count(&self) -> Result<u64, RepositoryError> {
        self.inner.count()
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn exists_by_email(&self, _email: &str) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count(&self) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Accepts inserts but cannot report a count afterwards.
#[derive(Default)]
pub(super) struct CountlessRepository {
    pub(super) inner: MemoryRepository,
}

impl ApplicationRepository for CountlessRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        self.inner.insert(record)
    }

    fn exists_by_email(&self, email: &str) -> Result<bool, RepositoryError> {
        self.inner.exists_by_email(email)
    }

    fn count(&self) -> Result<u64, RepositoryError> {
        Err(RepositoryError::Unavailable("count timed out".to_string()))
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryAssets {
    objects: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
}

impl MemoryAssets {
    pub(super) fn keys(&self) -> Vec<String> {
        self.objects()
            .into_iter()
            .map(|(key, _)| key)
            .collect()
    }

    pub(super) fn objects(&self) -> Vec<(String, Vec<u8>)> {
        self.objects.lock().expect("asset mutex poisoned").clone()
    }
}

impl AssetStore for MemoryAssets {
    fn put(&self, key: &str, bytes: Vec<u8>) -> Result<String, AssetStoreError> {
        // Keys land on disk in production; anything but a plain file name is refused.
        if key.contains(['/', '\\']) {
            return Err(AssetStoreError::Rejected {
                key: key.to_string(),
                reason: "key is not a plain file name".to_string(),
            });
        }
        self.objects
            .lock()
            .expect("asset mutex poisoned")
            .push((key.to_string(), bytes));
        Ok(format!("profile-photos/{key}"))
    }
}

pub(super) struct FailingAssets;

impl AssetStore for FailingAssets {
    fn put(&self, key: &str, _bytes: Vec<u8>) -> Result<String, AssetStoreError> {
        Err(AssetStoreError::Rejected {
            key: key.to_string(),
            reason: "bucket missing".to_string(),
        })
    }
}

/// Scripted transport that records every payload it is handed.
pub(super) struct ScriptedTransport {
    response: Result<TransportResponse, fn() -> TransportError>,
    sent: Mutex<Vec<IntakePayload>>,
}

impl ScriptedTransport {
    pub(super) fn answering(status: u16, body: Value) -> Self {
        Self {
            response: Ok(TransportResponse { status, body }),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn failing(error: fn() -> TransportError) -> Self {
        Self {
            response: Err(error),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn sent(&self) -> Vec<IntakePayload> {
        self.sent.lock().expect("transport mutex poisoned").clone()
    }
}

#[async_trait]
impl SubmissionTransport for ScriptedTransport {
    async fn send(&self, payload: IntakePayload) -> Result<TransportResponse, TransportError> {
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push(payload);
        match &self.response {
            Ok(response) => Ok(response.clone()),
            Err(error) => Err(error()),
        }
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
