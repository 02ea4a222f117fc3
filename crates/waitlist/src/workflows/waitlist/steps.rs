use std::collections::BTreeMap;

use chrono::NaiveDate;
use mime::Mime;

use super::domain::{is_supported_country, ApplicationDraft, Field, PhotoAttachment, UNITED_STATES};
use super::validation::{valid_date_of_birth_on, valid_email};

/// Per-field inline messages, keyed by field.
pub type FieldErrors = BTreeMap<Field, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepId {
    Intro,
    Identity,
    Location,
    Motivation,
    Review,
}

impl StepId {
    pub const fn key(self) -> &'static str {
        match self {
            StepId::Intro => "intro",
            StepId::Identity => "identity",
            StepId::Location => "location",
            StepId::Motivation => "motivation",
            StepId::Review => "review",
        }
    }
}

/// Predicate over the draft that switches a conditional requirement on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    CountryIs(&'static str),
    SmsOptedIn,
}

impl Condition {
    pub fn holds(self, draft: &ApplicationDraft) -> bool {
        match self {
            Condition::CountryIs(country) => draft.country.trim() == country,
            Condition::SmsOptedIn => draft.sms_opt_in,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionalRequirement {
    pub field: Field,
    pub when: Condition,
}

/// One wizard screen: what it must collect and whether it gates advancement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDescriptor {
    pub id: StepId,
    pub title: &'static str,
    pub required: Vec<Field>,
    pub conditional: Vec<ConditionalRequirement>,
    /// Optional fields that must still be well-formed when present.
    pub checked: Vec<Field>,
    /// Non-blocking steps never stop `advance`; their rules only apply at submit time.
    pub blocking: bool,
}

impl StepDescriptor {
    /// Every message this step's rules produce for `draft`.
    pub fn errors(&self, draft: &ApplicationDraft, today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::new();

        let conditional = self
            .conditional
            .iter()
            .filter(|requirement| requirement.when.holds(draft))
            .map(|requirement| requirement.field);

        for field in self.required.iter().copied().chain(conditional) {
            if let Some(message) = required_field_error(draft, field, today) {
                errors.entry(field).or_insert(message);
            }
        }

        for field in self.checked.iter().copied() {
            if draft.is_filled(field) {
                if let Some(message) = field_format_error(draft, field, today) {
                    errors.entry(field).or_insert(message);
                }
            }
        }

        errors
    }

    /// Errors that block `advance`; always empty for non-blocking steps.
    pub fn blocking_errors(&self, draft: &ApplicationDraft, today: NaiveDate) -> FieldErrors {
        if self.blocking {
            self.errors(draft, today)
        } else {
            FieldErrors::new()
        }
    }

    pub fn is_complete(&self, draft: &ApplicationDraft, today: NaiveDate) -> bool {
        self.blocking_errors(draft, today).is_empty()
    }
}

/// Ordered step sequence driving the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardSchema {
    steps: Vec<StepDescriptor>,
}

impl WizardSchema {
    pub fn new(steps: Vec<StepDescriptor>) -> Self {
        Self { steps }
    }

    pub fn standard() -> Self {
        Self::new(standard_steps())
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&StepDescriptor> {
        self.steps.get(index)
    }

    /// Run every step's rules, blocking or not. Empty means the draft is submittable.
    pub fn validate_draft(&self, draft: &ApplicationDraft, today: NaiveDate) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for step in &self.steps {
            for (field, message) in step.errors(draft, today) {
                errors.entry(field).or_insert(message);
            }
        }
        errors
    }
}

impl Default for WizardSchema {
    fn default() -> Self {
        Self::standard()
    }
}

fn standard_steps() -> Vec<StepDescriptor> {
    vec![
        StepDescriptor {
            id: StepId::Intro,
            title: "Welcome",
            required: Vec::new(),
            conditional: Vec::new(),
            checked: Vec::new(),
            blocking: true,
        },
        StepDescriptor {
            id: StepId::Identity,
            title: "Personal Details",
            required: vec![
                Field::FirstName,
                Field::LastName,
                Field::Email,
                Field::DateOfBirth,
            ],
            conditional: Vec::new(),
            checked: Vec::new(),
            blocking: true,
        },
        StepDescriptor {
            id: StepId::Location,
            title: "Location",
            required: vec![Field::Country, Field::City, Field::PostalCode],
            conditional: vec![ConditionalRequirement {
                field: Field::State,
                when: Condition::CountryIs(UNITED_STATES),
            }],
            checked: Vec::new(),
            blocking: true,
        },
        StepDescriptor {
            id: StepId::Motivation,
            title: "Why Join",
            required: vec![Field::Interests],
            conditional: Vec::new(),
            checked: Vec::new(),
            blocking: true,
        },
        StepDescriptor {
            id: StepId::Review,
            title: "Verify",
            required: Vec::new(),
            conditional: vec![ConditionalRequirement {
                field: Field::PhoneNumber,
                when: Condition::SmsOptedIn,
            }],
            checked: vec![Field::ProfilePhoto],
            blocking: false,
        },
    ]
}

fn required_field_error(draft: &ApplicationDraft, field: Field, today: NaiveDate) -> Option<String> {
    if !draft.is_filled(field) {
        return Some(missing_message(field));
    }
    field_format_error(draft, field, today)
}

fn missing_message(field: Field) -> String {
    match field {
        Field::Interests => "Please select at least one reason".to_string(),
        Field::PhoneNumber => "Phone number is required for text updates".to_string(),
        other => format!("{} is required", other.label()),
    }
}

fn field_format_error(draft: &ApplicationDraft, field: Field, today: NaiveDate) -> Option<String> {
    match field {
        Field::Email if !valid_email(draft.email.trim()) => {
            Some("Please enter a valid email address".to_string())
        }
        Field::DateOfBirth if !valid_date_of_birth_on(&draft.date_of_birth, today) => {
            Some("Please enter a valid date of birth".to_string())
        }
        Field::Country if !is_supported_country(draft.country.trim()) => {
            Some("Please select a supported country or region".to_string())
        }
        Field::ProfilePhoto => match &draft.profile_photo {
            Some(photo) if !is_supported_photo(photo) => {
                Some("Profile photo must be a JPEG or PNG image".to_string())
            }
            _ => None,
        },
        _ => None,
    }
}

/// Resolve a photo's media type, falling back to a guess from its file name.
pub fn photo_media_type(photo: &PhotoAttachment) -> Option<Mime> {
    let declared = photo
        .content_type
        .parse::<Mime>()
        .ok()
        .filter(|mime| *mime != mime::APPLICATION_OCTET_STREAM);

    declared.or_else(|| mime_guess::from_path(&photo.file_name).first())
}

pub fn is_supported_photo(photo: &PhotoAttachment) -> bool {
    photo_media_type(photo).is_some_and(|media| {
        media.type_() == mime::IMAGE && (media.subtype() == mime::JPEG || media.subtype() == mime::PNG)
    })
}
