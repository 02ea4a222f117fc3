//! Waitlist application intake.
//!
//! The client half walks an applicant through a step-gated wizard and submits the finished
//! draft; the server half re-screens the payload, stores the optional profile photo,
//! enforces one application per email and reports the applicant's waitlist position.

pub mod domain;
pub mod payload;
pub mod repository;
pub mod router;
pub(crate) mod screening;
pub mod service;
pub mod steps;
pub mod submission;
pub mod transport;
pub mod validation;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicantDetails, ApplicationDraft, ApplicationRecord, Field, Interest, PhotoAttachment,
    ScreenedApplication, WaitlistPosition, SUPPORTED_COUNTRIES, UNITED_STATES,
};
pub use payload::{IntakePayload, PayloadError};
pub use repository::{ApplicationRepository, AssetStore, AssetStoreError, RepositoryError};
pub use router::{intake_router, IntakeForm};
pub use screening::{IntakeGuard, ValidationError};
pub use service::{photo_key, IntakeError, WaitlistIntakeService, WaitlistPolicy, WaitlistReceipt};
pub use steps::{FieldErrors, StepDescriptor, StepId, WizardSchema};
pub use submission::{
    SubmissionClient, SubmissionError, SubmissionState, SubmissionTransport, TransportError,
    TransportResponse, GENERIC_FAILURE_MESSAGE,
};
pub use transport::HttpTransport;
pub use wizard::{FieldValue, Wizard, WizardAction};
