use crate::infra::parse_date;
use chrono::{Local, NaiveDate};
use clap::Args;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use waitlist::config::AppConfig;
use waitlist::error::AppError;
use waitlist::telemetry;
use waitlist::workflows::waitlist::{
    Field, FieldErrors, FieldValue, HttpTransport, IntakePayload, Interest, PhotoAttachment,
    SubmissionClient, SubmissionError, Wizard, WizardAction, WizardSchema,
};

#[derive(Args, Debug)]
pub(crate) struct ApplyArgs {
    /// JSON draft using the submission field names (firstName, email, reasons, ...)
    #[arg(long)]
    pub(crate) draft: PathBuf,
    /// Optional JPEG or PNG profile photo
    #[arg(long)]
    pub(crate) photo: Option<PathBuf>,
    /// Override the configured intake endpoint
    #[arg(long)]
    pub(crate) endpoint: Option<String>,
    /// Evaluate date-of-birth rules as of this date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) async fn run_apply(args: ApplyArgs) -> Result<(), AppError> {
    let ApplyArgs {
        draft,
        photo,
        endpoint,
        today,
    } = args;

    let mut config = AppConfig::load()?;
    if let Some(endpoint) = endpoint {
        config.client.endpoint = endpoint;
    }
    telemetry::init(&config.telemetry)?;

    let payload: IntakePayload = serde_json::from_str(&fs::read_to_string(&draft)?)?;
    let photo = photo.as_deref().map(load_photo).transpose()?;
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let wizard = match walk_wizard(payload, photo, today) {
        Ok(wizard) => wizard,
        Err(errors) => {
            print_field_errors(&errors);
            return Err(SubmissionError::Invalid(errors).into());
        }
    };

    let transport = HttpTransport::from_config(&config.client)?;
    info!(endpoint = transport.endpoint(), "submitting application");
    let client = SubmissionClient::new(transport);

    match client.submit_wizard(&wizard).await {
        Ok(position) => {
            println!("Application submitted successfully.");
            println!("You're #{position} on the waitlist.");
            Ok(())
        }
        Err(err) => {
            if let SubmissionError::Invalid(errors) = &err {
                print_field_errors(errors);
            } else {
                println!("{}", err.user_message());
            }
            Err(err.into())
        }
    }
}

fn load_photo(path: &Path) -> Result<PhotoAttachment, AppError> {
    let bytes = fs::read(path)?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let content_type = mime_guess::from_path(path).first_or_octet_stream();
    Ok(PhotoAttachment::new(
        file_name,
        content_type.essence_str(),
        bytes,
    ))
}

/// Feed the draft into a fresh wizard and advance through every step, stopping at the first
/// step that refuses to advance.
fn walk_wizard(
    payload: IntakePayload,
    photo: Option<PhotoAttachment>,
    today: NaiveDate,
) -> Result<Wizard, FieldErrors> {
    let actions = draft_actions(&payload, photo)?;
    let mut wizard = actions.into_iter().fold(
        Wizard::on(Arc::new(WizardSchema::standard()), today),
        |wizard, action| wizard.apply(action),
    );

    while !wizard.is_last_step() {
        let next = wizard.advance();
        if next.step_index() == wizard.step_index() {
            return Err(next.errors().clone());
        }
        wizard = next;
    }
    Ok(wizard)
}

fn draft_actions(
    payload: &IntakePayload,
    photo: Option<PhotoAttachment>,
) -> Result<Vec<WizardAction>, FieldErrors> {
    let mut actions: Vec<WizardAction> = payload
        .text_fields()
        .into_iter()
        .map(|(field, value)| WizardAction::UpdateField(field, FieldValue::from(value)))
        .collect();

    for reason in payload.reasons.iter().flatten() {
        let Some(interest) = Interest::from_label(reason) else {
            let mut errors = FieldErrors::new();
            errors.insert(Field::Interests, format!("Unknown reason: {reason}"));
            return Err(errors);
        };
        actions.push(WizardAction::ToggleInterest(interest));
    }

    if let Some(opted_in) = payload.sms_updates {
        actions.push(WizardAction::UpdateField(Field::SmsOptIn, opted_in.into()));
    }
    if photo.is_some() {
        actions.push(WizardAction::UpdateField(
            Field::ProfilePhoto,
            FieldValue::Photo(photo),
        ));
    }
    Ok(actions)
}

fn print_field_errors(errors: &FieldErrors) {
    println!("Application is incomplete:");
    for (field, message) in errors {
        println!("  - {}: {message}", field.label());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
    }

    fn ada() -> IntakePayload {
        serde_json::from_value(json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "dateOfBirth": "1990-12-10",
            "country": "United States",
            "state": "CA",
            "city": "Palo Alto",
            "zipCode": "94301",
            "reasons": ["Networking", "Creative"],
            "instagram": "adal"
        }))
        .expect("draft parses")
    }

    #[test]
    fn complete_draft_reaches_the_review_step() {
        let wizard = walk_wizard(ada(), None, today()).expect("draft is complete");

        assert!(wizard.is_last_step());
        assert_eq!(wizard.draft().instagram, "@adal");
        assert_eq!(wizard.draft().interests.len(), 2);
        assert!(wizard.submission_errors().is_empty());
    }

    #[test]
    fn incomplete_draft_reports_the_blocking_step() {
        let mut payload = ada();
        payload.state = None;

        let errors = walk_wizard(payload, None, today()).expect_err("state missing");
        assert_eq!(
            errors.get(&Field::State).map(String::as_str),
            Some("State is required")
        );
    }

    #[test]
    fn unknown_reason_is_reported() {
        let mut payload = ada();
        payload.reasons = Some(vec!["Golf".to_string()]);

        let errors = draft_actions(&payload, None).expect_err("unknown reason");
        assert_eq!(
            errors.get(&Field::Interests).map(String::as_str),
            Some("Unknown reason: Golf")
        );
    }

    #[test]
    fn photo_is_attached_to_the_draft() {
        let photo = PhotoAttachment::new("me.png", "image/png", vec![1, 2]);
        let wizard = walk_wizard(ada(), Some(photo), today()).expect("draft is complete");

        assert_eq!(
            wizard.draft().profile_photo.as_ref().map(|photo| photo.file_name.as_str()),
            Some("me.png")
        );
    }
}
