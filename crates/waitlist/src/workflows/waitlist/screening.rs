use std::collections::BTreeSet;

use chrono::NaiveDate;

use super::domain::{
    is_supported_country, ApplicantDetails, Field, Interest, ScreenedApplication, UNITED_STATES,
};
use super::payload::IntakePayload;
use super::steps::is_supported_photo;
use super::validation::{normalize_instagram, parse_date, valid_date_of_birth_on, valid_email};
use crate::config::DEFAULT_MAX_PHOTO_BYTES;

/// Client-caused rejections raised while screening a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("All required fields must be completed")]
    MissingFields { fields: Vec<Field> },
    #[error("Invalid email format")]
    InvalidEmail,
    #[error("Invalid date of birth")]
    InvalidDateOfBirth,
    #[error("Unsupported country or region: {0}")]
    UnsupportedCountry(String),
    #[error("Unknown reason: {0}")]
    UnknownReason(String),
    #[error("Profile photo must be a JPEG or PNG image")]
    UnsupportedPhoto,
    #[error("Profile photo exceeds the {limit} byte limit")]
    PhotoTooLarge { limit: usize },
}

/// Re-validates untrusted payloads and produces normalized applicant details.
#[derive(Debug, Clone)]
pub struct IntakeGuard {
    max_photo_bytes: usize,
}

impl Default for IntakeGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PHOTO_BYTES)
    }
}

struct RequiredFields {
    first_name: String,
    last_name: String,
    email: String,
    date_of_birth: String,
    country: String,
    city: String,
    zip_code: String,
}

impl IntakeGuard {
    pub fn new(max_photo_bytes: usize) -> Self {
        Self { max_photo_bytes }
    }

    pub fn max_photo_bytes(&self) -> usize {
        self.max_photo_bytes
    }

    /// Structural checks first, then per-field rules; the first failure wins.
    pub fn screen(
        &self,
        payload: IntakePayload,
        today: NaiveDate,
    ) -> Result<ScreenedApplication, ValidationError> {
        let IntakePayload {
            first_name,
            last_name,
            email,
            date_of_birth,
            country,
            state,
            city,
            zip_code,
            reasons,
            about,
            instagram,
            linkedin,
            sms_updates,
            phone_number,
            profile_photo,
        } = payload;

        let sms_updates = sms_updates.unwrap_or(false);
        let state = present(state);
        let phone_number = present(phone_number);
        let reasons = reasons
            .map(present_all)
            .filter(|reasons| !reasons.is_empty());

        let mut missing = Vec::new();
        let mut take = |field: Field, value: Option<String>| {
            let value = present(value);
            if value.is_none() {
                missing.push(field);
            }
            value.unwrap_or_default()
        };

        let required = RequiredFields {
            first_name: take(Field::FirstName, first_name),
            last_name: take(Field::LastName, last_name),
            email: take(Field::Email, email),
            date_of_birth: take(Field::DateOfBirth, date_of_birth),
            country: take(Field::Country, country),
            city: take(Field::City, city),
            zip_code: take(Field::PostalCode, zip_code),
        };
        let reasons = reasons.unwrap_or_else(|| {
            missing.push(Field::Interests);
            Vec::new()
        });

        if required.country == UNITED_STATES && state.is_none() {
            missing.push(Field::State);
        }
        if sms_updates && phone_number.is_none() {
            missing.push(Field::PhoneNumber);
        }
        if !missing.is_empty() {
            return Err(ValidationError::MissingFields { fields: missing });
        }

        if !valid_email(&required.email) {
            return Err(ValidationError::InvalidEmail);
        }

        let date_of_birth = parse_date(&required.date_of_birth)
            .filter(|_| valid_date_of_birth_on(&required.date_of_birth, today))
            .ok_or(ValidationError::InvalidDateOfBirth)?;

        if !is_supported_country(&required.country) {
            return Err(ValidationError::UnsupportedCountry(required.country));
        }

        let mut interests = BTreeSet::new();
        for reason in &reasons {
            let interest = Interest::from_label(reason)
                .ok_or_else(|| ValidationError::UnknownReason(reason.clone()))?;
            interests.insert(interest);
        }

        let photo = profile_photo.filter(|photo| !photo.is_empty());
        if let Some(photo) = &photo {
            if photo.bytes.len() > self.max_photo_bytes {
                return Err(ValidationError::PhotoTooLarge {
                    limit: self.max_photo_bytes,
                });
            }
            if !is_supported_photo(photo) {
                return Err(ValidationError::UnsupportedPhoto);
            }
        }

        let state = if required.country == UNITED_STATES {
            state
        } else {
            None
        };

        let applicant = ApplicantDetails {
            first_name: required.first_name,
            last_name: required.last_name,
            email: required.email.to_lowercase(),
            date_of_birth,
            country: required.country,
            state,
            city: required.city,
            zip_code: required.zip_code,
            interests: interests.into_iter().collect(),
            about: present(about),
            instagram: present(instagram).map(|handle| normalize_instagram(&handle)),
            linkedin: present(linkedin),
            sms_updates,
            phone_number,
        };

        Ok(ScreenedApplication { applicant, photo })
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn present_all(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .filter_map(|value| present(Some(value)))
        .collect()
}
