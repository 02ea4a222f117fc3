use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::domain::{ApplicationDraft, WaitlistPosition};
use super::payload::IntakePayload;
use super::steps::{FieldErrors, WizardSchema};
use super::wizard::Wizard;

/// Single message shown for any submission fault; the user can simply retry.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "There was an error submitting your application. Please try again.";

/// Raw answer from the intake endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Value,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("request failed: {0}")]
    Request(String),
}

/// Outbound seam for delivering a payload to the intake endpoint.
#[async_trait]
pub trait SubmissionTransport: Send + Sync {
    async fn send(&self, payload: IntakePayload) -> Result<TransportResponse, TransportError>;
}

/// Lifecycle of the session's one submission slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionState {
    Idle,
    Pending,
    Accepted(WaitlistPosition),
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("a submission is already in flight")]
    InFlight,
    #[error("application has {} invalid field(s)", .0.len())]
    Invalid(FieldErrors),
    #[error("intake endpoint answered {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SubmissionError {
    /// Text for the applicant. Faults collapse into one generic retry message.
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::InFlight => "Your application is being submitted.".to_string(),
            SubmissionError::Invalid(errors) => errors
                .values()
                .cloned()
                .collect::<Vec<_>>()
                .join("\n"),
            SubmissionError::Rejected { .. } | SubmissionError::Transport(_) => {
                GENERIC_FAILURE_MESSAGE.to_string()
            }
        }
    }
}

/// Validates, serializes and delivers a draft, allowing one outstanding request at a time.
pub struct SubmissionClient<T> {
    transport: T,
    schema: Arc<WizardSchema>,
    state: Mutex<SubmissionState>,
}

impl<T> SubmissionClient<T>
where
    T: SubmissionTransport,
{
    pub fn new(transport: T) -> Self {
        Self::with_schema(transport, Arc::new(WizardSchema::standard()))
    }

    pub fn with_schema(transport: T, schema: Arc<WizardSchema>) -> Self {
        Self {
            transport,
            schema,
            state: Mutex::new(SubmissionState::Idle),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn state(&self) -> SubmissionState {
        lock_state(&self.state).clone()
    }

    pub fn in_flight(&self) -> bool {
        self.state() == SubmissionState::Pending
    }

    pub async fn submit_wizard(&self, wizard: &Wizard) -> Result<WaitlistPosition, SubmissionError> {
        self.submit(wizard.draft(), wizard.today()).await
    }

    pub async fn submit(
        &self,
        draft: &ApplicationDraft,
        today: NaiveDate,
    ) -> Result<WaitlistPosition, SubmissionError> {
        let pending = self.begin(draft, today)?;
        let payload = IntakePayload::from_draft(draft);

        let outcome = match self.transport.send(payload).await {
            Ok(response) => read_response(response),
            Err(err) => Err(SubmissionError::Transport(err)),
        };

        match &outcome {
            Ok(position) => {
                info!(%position, "application accepted");
                pending.settle(SubmissionState::Accepted(*position));
            }
            Err(err) => {
                warn!(error = %err, "application submission failed");
                pending.settle(SubmissionState::Failed);
            }
        }
        outcome
    }

    fn begin(
        &self,
        draft: &ApplicationDraft,
        today: NaiveDate,
    ) -> Result<PendingSlot<'_>, SubmissionError> {
        let mut state = lock_state(&self.state);
        if *state == SubmissionState::Pending {
            debug!("ignoring re-entrant submit while a request is pending");
            return Err(SubmissionError::InFlight);
        }

        let errors = self.schema.validate_draft(draft, today);
        if !errors.is_empty() {
            return Err(SubmissionError::Invalid(errors));
        }

        *state = SubmissionState::Pending;
        Ok(PendingSlot {
            state: &self.state,
            settled: false,
        })
    }
}

fn read_response(response: TransportResponse) -> Result<WaitlistPosition, SubmissionError> {
    if !response.is_success() {
        let detail = response
            .body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string);
        return Err(SubmissionError::Rejected {
            status: response.status,
            detail,
        });
    }

    response
        .body
        .get("waitlistCount")
        .and_then(Value::as_u64)
        .map(WaitlistPosition)
        .ok_or_else(|| SubmissionError::Rejected {
            status: response.status,
            detail: Some("response carried no waitlistCount".to_string()),
        })
}

/// The slot holds plain data, so a panic elsewhere never leaves it half-written.
fn lock_state(state: &Mutex<SubmissionState>) -> MutexGuard<'_, SubmissionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Holds the pending slot; a dropped (cancelled) submission frees it for retry.
struct PendingSlot<'a> {
    state: &'a Mutex<SubmissionState>,
    settled: bool,
}

impl PendingSlot<'_> {
    fn settle(mut self, next: SubmissionState) {
        self.write(next);
        self.settled = true;
    }

    fn write(&self, next: SubmissionState) {
        *lock_state(self.state) = next;
    }
}

impl Drop for PendingSlot<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.write(SubmissionState::Failed);
        }
    }
}
