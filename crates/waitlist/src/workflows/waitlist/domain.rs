use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Country whose applicants must also provide a state.
pub const UNITED_STATES: &str = "United States";

/// Countries offered by the location step.
pub const SUPPORTED_COUNTRIES: &[&str] = &[
    "United States",
    "Canada",
    "United Kingdom",
    "Australia",
    "Germany",
    "France",
    "Spain",
    "Italy",
    "Netherlands",
    "Sweden",
    "Norway",
    "Denmark",
    "Finland",
    "Switzerland",
    "Austria",
    "Belgium",
    "Ireland",
    "Portugal",
    "Greece",
    "Poland",
    "Czech Republic",
    "Hungary",
    "Romania",
    "Bulgaria",
    "Croatia",
    "Slovenia",
    "Slovakia",
    "Estonia",
    "Latvia",
    "Lithuania",
    "Japan",
    "South Korea",
    "Singapore",
    "Hong Kong",
    "New Zealand",
    "Brazil",
    "Mexico",
    "Argentina",
    "Chile",
    "Colombia",
    "Peru",
    "Uruguay",
    "Costa Rica",
    "Panama",
    "India",
    "China",
    "Thailand",
    "Malaysia",
    "Philippines",
    "Indonesia",
    "Vietnam",
    "Taiwan",
    "Israel",
    "United Arab Emirates",
    "Saudi Arabia",
    "South Africa",
    "Nigeria",
    "Kenya",
    "Egypt",
    "Morocco",
    "Tunisia",
    "Turkey",
    "Russia",
    "Ukraine",
    "Belarus",
    "Kazakhstan",
    "Uzbekistan",
    "Azerbaijan",
    "Georgia",
    "Armenia",
];

pub fn is_supported_country(name: &str) -> bool {
    SUPPORTED_COUNTRIES.contains(&name)
}

/// Closed vocabulary of reasons an applicant can give for joining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Interest {
    Blitzes,
    Networking,
    #[serde(rename = "Health & Wellness")]
    HealthAndWellness,
    Creative,
}

impl Interest {
    pub const ALL: [Interest; 4] = [
        Interest::Blitzes,
        Interest::Networking,
        Interest::HealthAndWellness,
        Interest::Creative,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Interest::Blitzes => "Blitzes",
            Interest::Networking => "Networking",
            Interest::HealthAndWellness => "Health & Wellness",
            Interest::Creative => "Creative",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|interest| interest.label() == label.trim())
    }
}

impl fmt::Display for Interest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Every field the wizard collects, addressed by its wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    DateOfBirth,
    Country,
    State,
    City,
    PostalCode,
    Interests,
    About,
    ProfilePhoto,
    Instagram,
    OtherHandle,
    SmsOptIn,
    PhoneNumber,
}

impl Field {
    pub const fn wire_name(self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Email => "email",
            Field::DateOfBirth => "dateOfBirth",
            Field::Country => "country",
            Field::State => "state",
            Field::City => "city",
            Field::PostalCode => "zipCode",
            Field::Interests => "reasons",
            Field::About => "about",
            Field::ProfilePhoto => "profilePhoto",
            Field::Instagram => "instagram",
            Field::OtherHandle => "linkedin",
            Field::SmsOptIn => "smsUpdates",
            Field::PhoneNumber => "phoneNumber",
        }
    }

    /// Human label used in "... is required" messages.
    pub const fn label(self) -> &'static str {
        match self {
            Field::FirstName => "First name",
            Field::LastName => "Last name",
            Field::Email => "Email",
            Field::DateOfBirth => "Date of birth",
            Field::Country => "Country",
            Field::State => "State",
            Field::City => "City",
            Field::PostalCode => "ZIP/Postal code",
            Field::Interests => "Reasons",
            Field::About => "About",
            Field::ProfilePhoto => "Profile photo",
            Field::Instagram => "Instagram",
            Field::OtherHandle => "Other handle",
            Field::SmsOptIn => "Text message updates",
            Field::PhoneNumber => "Phone number",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Optional profile photo as picked by the applicant.
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoAttachment {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoAttachment {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Extension after the last `.` of the original file name, lower-cased.
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.file_name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl fmt::Debug for PhotoAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhotoAttachment")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// In-progress application owned by a single wizard session.
///
/// Values are kept as typed-in text; validation happens per step and again at submit time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: String,
    pub country: String,
    pub state: String,
    pub city: String,
    pub postal_code: String,
    pub interests: BTreeSet<Interest>,
    pub about: String,
    pub profile_photo: Option<PhotoAttachment>,
    pub instagram: String,
    pub other_handle: String,
    pub sms_opt_in: bool,
    pub phone_number: String,
}

impl ApplicationDraft {
    /// Text value of a free-text field; `None` for interests, photo and the opt-in flag.
    pub fn text(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Email => &self.email,
            Field::DateOfBirth => &self.date_of_birth,
            Field::Country => &self.country,
            Field::State => &self.state,
            Field::City => &self.city,
            Field::PostalCode => &self.postal_code,
            Field::About => &self.about,
            Field::Instagram => &self.instagram,
            Field::OtherHandle => &self.other_handle,
            Field::PhoneNumber => &self.phone_number,
            Field::Interests | Field::ProfilePhoto | Field::SmsOptIn => return None,
        };
        Some(value.as_str())
    }

    pub(crate) fn text_mut(&mut self, field: Field) -> Option<&mut String> {
        let value = match field {
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Email => &mut self.email,
            Field::DateOfBirth => &mut self.date_of_birth,
            Field::Country => &mut self.country,
            Field::State => &mut self.state,
            Field::City => &mut self.city,
            Field::PostalCode => &mut self.postal_code,
            Field::About => &mut self.about,
            Field::Instagram => &mut self.instagram,
            Field::OtherHandle => &mut self.other_handle,
            Field::PhoneNumber => &mut self.phone_number,
            Field::Interests | Field::ProfilePhoto | Field::SmsOptIn => return None,
        };
        Some(value)
    }

    /// Whether a field carries a value; the opt-in flag counts as filled when set.
    pub fn is_filled(&self, field: Field) -> bool {
        match field {
            Field::Interests => !self.interests.is_empty(),
            Field::ProfilePhoto => self
                .profile_photo
                .as_ref()
                .is_some_and(|photo| !photo.is_empty()),
            Field::SmsOptIn => self.sms_opt_in,
            other => self
                .text(other)
                .is_some_and(|value| !value.trim().is_empty()),
        }
    }
}

/// Screened applicant data, ready to become a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicantDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub date_of_birth: NaiveDate,
    pub country: String,
    pub state: Option<String>,
    pub city: String,
    pub zip_code: String,
    pub interests: Vec<Interest>,
    pub about: Option<String>,
    pub instagram: Option<String>,
    pub linkedin: Option<String>,
    pub sms_updates: bool,
    pub phone_number: Option<String>,
}

/// Output of the intake guard: applicant details plus the photo still to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreenedApplication {
    pub applicant: ApplicantDetails,
    pub photo: Option<PhotoAttachment>,
}

/// Persisted application row. Column names mirror the wire fields in snake case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    #[serde(flatten)]
    pub applicant: ApplicantDetails,
    pub profile_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ApplicationRecord {
    pub fn email(&self) -> &str {
        &self.applicant.email
    }
}

/// Informational, non-authoritative ordinal reported to an accepted applicant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaitlistPosition(pub u64);

impl WaitlistPosition {
    /// `base_offset` plus the number of records that preceded this one.
    pub fn after_insert(base_offset: u64, count_including_self: u64) -> Self {
        Self(base_offset.saturating_add(count_including_self.saturating_sub(1)))
    }
}

impl fmt::Display for WaitlistPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
