use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use super::domain::{ApplicationDraft, Field, PhotoAttachment};

/// Wire shape of a submission, shared by the client and the intake endpoint.
///
/// Every field is optional on the wire so the server can report missing values itself.
/// The photo never travels as JSON; it rides as a multipart file part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntakePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_reasons",
        skip_serializing_if = "Option::is_none"
    )]
    pub reasons: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub sms_updates: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(skip)]
    pub profile_photo: Option<PhotoAttachment>,
}

/// Problems turning a request body into an [`IntakePayload`].
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("reasons must be a JSON-encoded list of strings")]
    MalformedReasons(#[source] serde_json::Error),
    #[error("malformed JSON body: {0}")]
    Json(String),
    #[error("malformed multipart body: {0}")]
    Multipart(String),
}

const TEXT_FIELDS: [Field; 12] = [
    Field::FirstName,
    Field::LastName,
    Field::Email,
    Field::DateOfBirth,
    Field::Country,
    Field::State,
    Field::City,
    Field::PostalCode,
    Field::About,
    Field::Instagram,
    Field::OtherHandle,
    Field::PhoneNumber,
];

impl IntakePayload {
    /// Serialize a draft for transport. Empty optional text is left off the wire.
    pub fn from_draft(draft: &ApplicationDraft) -> Self {
        let mut payload = IntakePayload {
            reasons: Some(
                draft
                    .interests
                    .iter()
                    .map(|interest| interest.label().to_string())
                    .collect(),
            ),
            sms_updates: Some(draft.sms_opt_in),
            profile_photo: draft
                .profile_photo
                .clone()
                .filter(|photo| !photo.is_empty()),
            ..IntakePayload::default()
        };

        for field in TEXT_FIELDS {
            let value = draft.text(field).unwrap_or_default();
            if let Some(slot) = payload.text_slot(field) {
                if !value.is_empty() {
                    *slot = Some(value.to_string());
                }
            }
        }

        payload
    }

    fn text_slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        let slot = match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Email => &mut self.email,
            Field::DateOfBirth => &mut self.date_of_birth,
            Field::Country => &mut self.country,
            Field::State => &mut self.state,
            Field::City => &mut self.city,
            Field::PostalCode => &mut self.zip_code,
            Field::About => &mut self.about,
            Field::Instagram => &mut self.instagram,
            Field::OtherHandle => &mut self.linkedin,
            Field::PhoneNumber => &mut self.phone_number,
            Field::Interests | Field::ProfilePhoto | Field::SmsOptIn => return None,
        };
        Some(slot)
    }

    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Email => &self.email,
            Field::DateOfBirth => &self.date_of_birth,
            Field::Country => &self.country,
            Field::State => &self.state,
            Field::City => &self.city,
            Field::PostalCode => &self.zip_code,
            Field::About => &self.about,
            Field::Instagram => &self.instagram,
            Field::OtherHandle => &self.linkedin,
            Field::PhoneNumber => &self.phone_number,
            Field::Interests | Field::ProfilePhoto | Field::SmsOptIn => return None,
        };
        value.as_deref()
    }

    /// Present free-text fields in form order.
    pub fn text_fields(&self) -> Vec<(Field, &str)> {
        TEXT_FIELDS
            .into_iter()
            .filter_map(|field| self.text(field).map(|value| (field, value)))
            .collect()
    }

    /// Scalar multipart parts: text as-is, reasons JSON-encoded, opt-in as `"true"`/`"false"`.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields: Vec<(&'static str, String)> = self
            .text_fields()
            .into_iter()
            .map(|(field, value)| (field.wire_name(), value.to_string()))
            .collect();

        if let Some(reasons) = &self.reasons {
            let encoded = serde_json::Value::from(reasons.clone()).to_string();
            fields.push((Field::Interests.wire_name(), encoded));
        }
        if let Some(sms_updates) = self.sms_updates {
            fields.push((Field::SmsOptIn.wire_name(), sms_updates.to_string()));
        }

        fields
    }

    /// Apply one multipart text part. Unknown names are ignored.
    pub fn set_form_field(&mut self, name: &str, value: String) -> Result<(), PayloadError> {
        if name == Field::Interests.wire_name() {
            self.reasons = Some(parse_reasons(&value)?);
            return Ok(());
        }
        if name == Field::SmsOptIn.wire_name() {
            self.sms_updates = Some(value.trim() == "true");
            return Ok(());
        }

        if let Some(field) = TEXT_FIELDS.into_iter().find(|field| field.wire_name() == name) {
            if let Some(slot) = self.text_slot(field) {
                *slot = Some(value);
            }
        }
        Ok(())
    }
}

/// Decode the JSON-encoded `reasons` list. Blank input means no reasons.
pub fn parse_reasons(raw: &str) -> Result<Vec<String>, PayloadError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).map_err(PayloadError::MalformedReasons)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReasonsField {
    List(Vec<String>),
    Encoded(String),
}

fn deserialize_reasons<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<ReasonsField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(ReasonsField::List(reasons)) => Ok(Some(reasons)),
        Some(ReasonsField::Encoded(raw)) => parse_reasons(&raw).map(Some).map_err(de::Error::custom),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagField {
    Bool(bool),
    Text(String),
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<FlagField>::deserialize(deserializer)?.map(|flag| match flag {
        FlagField::Bool(value) => value,
        FlagField::Text(raw) => raw.trim() == "true",
    }))
}
