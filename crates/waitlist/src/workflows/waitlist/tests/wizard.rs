use std::sync::Arc;

use super::common::*;
use crate::workflows::waitlist::domain::{Field, Interest, PhotoAttachment};
use crate::workflows::waitlist::steps::{StepId, WizardSchema};
use crate::workflows::waitlist::wizard::{FieldValue, Wizard, WizardAction};

fn wizard() -> Wizard {
    Wizard::on(Arc::new(WizardSchema::standard()), today())
}

fn fill(wizard: Wizard, values: &[(Field, &str)]) -> Wizard {
    values.iter().fold(wizard, |wizard, (field, value)| {
        wizard.update_field(*field, FieldValue::from(*value))
    })
}

fn at_identity() -> Wizard {
    wizard().advance()
}

fn with_identity(wizard: Wizard) -> Wizard {
    fill(
        wizard,
        &[
            (Field::FirstName, "Ada"),
            (Field::LastName, "Lovelace"),
            (Field::Email, "ada@example.com"),
            (Field::DateOfBirth, "1990-12-10"),
        ],
    )
}

#[test]
fn intro_step_always_advances() {
    let next = wizard().advance();
    assert_eq!(next.step_index(), 1);
    assert_eq!(next.current_step().map(|step| step.id), Some(StepId::Identity));
    assert!(next.errors().is_empty());
}

#[test]
fn incomplete_step_stays_put_with_inline_errors() {
    let wizard = at_identity();
    let stuck = wizard.advance();

    assert_eq!(stuck.step_index(), 1);
    assert_eq!(
        stuck.errors().get(&Field::FirstName).map(String::as_str),
        Some("First name is required")
    );
    assert!(stuck.errors().contains_key(&Field::DateOfBirth));
    assert_eq!(wizard.step_index(), 1, "original snapshot is untouched");
    assert!(wizard.errors().is_empty());
}

#[test]
fn malformed_email_blocks_identity_step() {
    let wizard = fill(
        with_identity(at_identity()),
        &[(Field::Email, "ada@example")],
    );
    let stuck = wizard.advance();

    assert_eq!(stuck.step_index(), 1);
    assert_eq!(
        stuck.errors().get(&Field::Email).map(String::as_str),
        Some("Please enter a valid email address")
    );
}

#[test]
fn editing_a_field_clears_only_its_error() {
    let stuck = at_identity().advance();
    let edited = stuck.update_field(Field::FirstName, "Ada".into());

    assert!(!edited.errors().contains_key(&Field::FirstName));
    assert!(edited.errors().contains_key(&Field::LastName));
}

#[test]
fn state_is_required_only_for_united_states() {
    let location = with_identity(at_identity()).advance();
    assert_eq!(location.current_step().map(|step| step.id), Some(StepId::Location));

    let us = fill(
        location.clone(),
        &[
            (Field::Country, "United States"),
            (Field::City, "Palo Alto"),
            (Field::PostalCode, "94301"),
        ],
    );
    let stuck = us.advance();
    assert_eq!(stuck.step_index(), 2);
    assert_eq!(
        stuck.errors().get(&Field::State).map(String::as_str),
        Some("State is required")
    );

    let canada = fill(
        location,
        &[
            (Field::Country, "Canada"),
            (Field::City, "Toronto"),
            (Field::PostalCode, "M5V"),
        ],
    );
    assert_eq!(canada.advance().step_index(), 3);
}

#[test]
fn leaving_united_states_clears_state() {
    let wizard = fill(
        at_identity(),
        &[(Field::Country, "United States"), (Field::State, "CA")],
    );
    assert_eq!(wizard.draft().state, "CA");

    let moved = wizard.update_field(Field::Country, "Canada".into());
    assert_eq!(moved.draft().state, "");
    assert_eq!(moved.draft().country, "Canada");
}

#[test]
fn interests_toggle_symmetrically() {
    let wizard = wizard();
    let once = wizard.apply(WizardAction::ToggleInterest(Interest::Creative));
    assert!(once.draft().interests.contains(&Interest::Creative));

    let twice = once.apply(WizardAction::ToggleInterest(Interest::Creative));
    assert!(twice.draft().interests.is_empty());
}

#[test]
fn motivation_step_needs_a_reason() {
    let blank = wizard().advance().advance().advance();
    assert_eq!(blank.step_index(), 1, "identity is still blank");

    let draft_ready = fill(
        with_identity(at_identity()),
        &[
            (Field::Country, "Canada"),
            (Field::City, "Toronto"),
            (Field::PostalCode, "M5V"),
        ],
    )
    .advance()
    .advance();
    assert_eq!(draft_ready.current_step().map(|step| step.id), Some(StepId::Motivation));

    let stuck = draft_ready.advance();
    assert_eq!(
        stuck.errors().get(&Field::Interests).map(String::as_str),
        Some("Please select at least one reason")
    );

    let chosen = stuck.toggle_interest(Interest::Blitzes);
    assert!(chosen.errors().is_empty());
    let review = chosen.advance();
    assert!(review.is_last_step());
}

#[test]
fn review_step_never_blocks_but_submission_checks_phone() {
    let mut wizard = wizard();
    for step in 0..4 {
        wizard = wizard.apply(WizardAction::Advance);
        if step == 0 {
            wizard = with_identity(wizard);
        }
        if step == 1 {
            wizard = fill(
                wizard,
                &[
                    (Field::Country, "Canada"),
                    (Field::City, "Toronto"),
                    (Field::PostalCode, "M5V"),
                ],
            );
        }
        if step == 2 {
            wizard = wizard.toggle_interest(Interest::Networking);
        }
    }
    assert!(wizard.is_last_step());

    let opted_in = wizard.update_field(Field::SmsOptIn, true.into());
    let stays = opted_in.advance();
    assert!(stays.is_last_step());
    assert!(stays.errors().is_empty());

    let errors = stays.submission_errors();
    assert_eq!(
        errors.get(&Field::PhoneNumber).map(String::as_str),
        Some("Phone number is required for text updates")
    );

    let with_phone = stays.update_field(Field::PhoneNumber, "+1 555 0100".into());
    assert!(with_phone.submission_errors().is_empty());
}

#[test]
fn retreat_saturates_at_first_step() {
    let wizard = wizard();
    assert_eq!(wizard.retreat().step_index(), 0);
    assert_eq!(wizard.advance().retreat().step_index(), 0);
}

#[test]
fn instagram_handle_gains_at_prefix() {
    let wizard = wizard().update_field(Field::Instagram, "adal".into());
    assert_eq!(wizard.draft().instagram, "@adal");
}

#[test]
fn photo_and_flag_values_only_land_on_matching_fields() {
    let photo = PhotoAttachment::new("me.gif", "image/gif", vec![1, 2, 3]);
    let wizard = wizard()
        .update_field(Field::ProfilePhoto, FieldValue::Photo(Some(photo)))
        .update_field(Field::FirstName, true.into());

    assert!(wizard.draft().profile_photo.is_some());
    assert_eq!(wizard.draft().first_name, "");
    assert_eq!(
        wizard.submission_errors().get(&Field::ProfilePhoto).map(String::as_str),
        Some("Profile photo must be a JPEG or PNG image")
    );
}

#[test]
fn complete_draft_has_no_submission_errors() {
    let wizard = Wizard::on(Arc::new(WizardSchema::standard()), today());
    let filled = fill(
        with_identity(wizard),
        &[
            (Field::Country, "United States"),
            (Field::State, "CA"),
            (Field::City, "Palo Alto"),
            (Field::PostalCode, "94301"),
        ],
    )
    .toggle_interest(Interest::Networking);

    assert!(filled.submission_errors().is_empty());
    assert_eq!(filled.draft(), &ada_draft());
}
