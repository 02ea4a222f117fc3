use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::debug;

use super::domain::{ApplicationDraft, Field, Interest, PhotoAttachment, UNITED_STATES};
use super::steps::{FieldErrors, StepDescriptor, WizardSchema};
use super::validation::normalize_instagram;

/// New value for a single draft field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Flag(bool),
    Photo(Option<PhotoAttachment>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

/// Every transition the wizard accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardAction {
    Advance,
    Retreat,
    UpdateField(Field, FieldValue),
    ToggleInterest(Interest),
}

/// Snapshot of one wizard session: step index, draft, and inline errors.
///
/// Transitions never mutate `self`; each returns the next snapshot.
#[derive(Debug, Clone)]
pub struct Wizard {
    schema: Arc<WizardSchema>,
    step: usize,
    draft: ApplicationDraft,
    errors: FieldErrors,
    today: NaiveDate,
}

impl Wizard {
    pub fn new(schema: Arc<WizardSchema>) -> Self {
        Self::on(schema, Local::now().date_naive())
    }

    /// Start a session evaluated against a fixed local date.
    pub fn on(schema: Arc<WizardSchema>, today: NaiveDate) -> Self {
        Self {
            schema,
            step: 0,
            draft: ApplicationDraft::default(),
            errors: FieldErrors::new(),
            today,
        }
    }

    pub fn standard() -> Self {
        Self::new(Arc::new(WizardSchema::standard()))
    }

    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn current_step(&self) -> Option<&StepDescriptor> {
        self.schema.step(self.step)
    }

    pub fn schema(&self) -> &WizardSchema {
        &self.schema
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn is_last_step(&self) -> bool {
        self.step + 1 >= self.schema.len()
    }

    /// Full-draft check used as the final gate before submission.
    pub fn submission_errors(&self) -> FieldErrors {
        self.schema.validate_draft(&self.draft, self.today)
    }

    pub fn apply(&self, action: WizardAction) -> Self {
        match action {
            WizardAction::Advance => self.advance(),
            WizardAction::Retreat => self.retreat(),
            WizardAction::UpdateField(field, value) => self.update_field(field, value),
            WizardAction::ToggleInterest(interest) => self.toggle_interest(interest),
        }
    }

    /// Move forward when the current step is complete; otherwise stay and report errors.
    pub fn advance(&self) -> Self {
        let mut next = self.clone();
        let Some(step) = self.current_step() else {
            return next;
        };

        let errors = step.blocking_errors(&self.draft, self.today);
        if !errors.is_empty() {
            debug!(step = step.id.key(), failures = errors.len(), "step incomplete");
            next.errors = errors;
            return next;
        }

        next.errors.clear();
        if !self.is_last_step() {
            next.step += 1;
        }
        next
    }

    pub fn retreat(&self) -> Self {
        let mut next = self.clone();
        next.step = self.step.saturating_sub(1);
        next
    }

    pub fn update_field(&self, field: Field, value: FieldValue) -> Self {
        let mut next = self.clone();
        next.errors.remove(&field);

        match (field, value) {
            (Field::SmsOptIn, FieldValue::Flag(opted_in)) => next.draft.sms_opt_in = opted_in,
            (Field::ProfilePhoto, FieldValue::Photo(photo)) => next.draft.profile_photo = photo,
            (Field::Country, FieldValue::Text(country)) => {
                if country.trim() != UNITED_STATES {
                    next.draft.state.clear();
                    next.errors.remove(&Field::State);
                }
                next.draft.country = country;
            }
            (Field::Instagram, FieldValue::Text(handle)) => {
                next.draft.instagram = normalize_instagram(&handle);
            }
            (field, FieldValue::Text(text)) => match next.draft.text_mut(field) {
                Some(slot) => *slot = text,
                None => debug!(%field, "text value ignored for non-text field"),
            },
            (field, value) => debug!(%field, ?value, "value kind does not match field"),
        }

        next
    }

    pub fn toggle_interest(&self, interest: Interest) -> Self {
        let mut next = self.clone();
        if !next.draft.interests.remove(&interest) {
            next.draft.interests.insert(interest);
        }
        next.errors.remove(&Field::Interests);
        next
    }
}
