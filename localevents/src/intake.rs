//! Event intake form: stage and validate a new event before it is created.

use localevents_core::model::{EventCreate, EventField, UserId};
use std::collections::BTreeMap;

/// The fields the form edits and validates
pub type IntakeField = EventField;

/// Placeholder organizer when nobody seeds the form
pub const PLACEHOLDER_ORGANIZER: UserId = UserId::new(1);

/// Default duration of a new event
pub const DEFAULT_DURATION: &str = "1 day";

/// Field-keyed validation messages, in field order
///
/// A value, not a failure: an empty map means the draft may be submitted.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<IntakeField, &'static str>);

impl ValidationErrors {
    /// No field is missing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The message for `field`, if it is missing
    #[must_use]
    pub fn get(&self, field: IntakeField) -> Option<&'static str> {
        self.0.get(&field).copied()
    }

    /// `(field, message)` pairs in field order
    pub fn iter(&self) -> impl Iterator<Item = (IntakeField, &'static str)> + '_ {
        self.0.iter().map(|(field, message)| (*field, *message))
    }

    /// The missing fields in field order
    pub fn fields(&self) -> impl Iterator<Item = IntakeField> + '_ {
        self.0.keys().copied()
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, message) in self.0.values().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            f.write_str(message)?;
        }
        Ok(())
    }
}

const fn required_message(field: IntakeField) -> &'static str {
    match field {
        EventField::Title => "Title is required",
        EventField::EventDt => "Date and time is required",
        EventField::Duration => "Duration is required",
        EventField::Location => "Location is required",
    }
}

/// Check that every required field is present
///
/// `organizer_id` is not checked.
#[must_use]
pub fn validate(draft: &EventCreate) -> ValidationErrors {
    ValidationErrors(
        EventField::ALL
            .into_iter()
            .filter(|field| draft.field(*field).is_empty())
            .map(|field| (field, required_message(field)))
            .collect(),
    )
}

/// Draft plus the errors from its last submission attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntakeForm {
    draft: EventCreate,
    errors: ValidationErrors,
    organizer: UserId,
}

impl Default for IntakeForm {
    fn default() -> Self {
        Self::for_organizer(PLACEHOLDER_ORGANIZER)
    }
}

impl IntakeForm {
    /// A blank form with the placeholder organizer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A blank form whose drafts are organized by `organizer`
    #[must_use]
    pub fn for_organizer(organizer: UserId) -> Self {
        Self {
            draft: blank_draft(organizer),
            errors: ValidationErrors::default(),
            organizer,
        }
    }

    /// The draft as currently edited
    #[must_use]
    pub const fn draft(&self) -> &EventCreate {
        &self.draft
    }

    /// Errors from the last [`Self::stage`] call
    #[must_use]
    pub const fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Replace one field's value
    pub fn set(&mut self, field: IntakeField, value: impl Into<String>) {
        *self.draft.field_mut(field) = value.into();
    }

    /// Validate the draft and take it if complete
    ///
    /// On success the form returns to its blank state. On failure the draft
    /// is kept as entered and the errors are recorded on the form.
    ///
    /// # Errors
    ///
    /// The [`ValidationErrors`] for every missing field.
    pub fn stage(&mut self) -> Result<EventCreate, ValidationErrors> {
        let errors = validate(&self.draft);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(errors);
        }
        self.errors = ValidationErrors::default();
        Ok(std::mem::replace(&mut self.draft, blank_draft(self.organizer)))
    }
}

fn blank_draft(organizer_id: UserId) -> EventCreate {
    EventCreate {
        title: String::new(),
        event_dt: String::new(),
        duration: DEFAULT_DURATION.to_string(),
        location: String::new(),
        organizer_id,
    }
}
