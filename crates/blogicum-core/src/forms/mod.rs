//! Typed form inputs and their validation rules.
//!
//! Each form is a plain input struct deserialized from the request body with
//! every field defaulted, so a missing field becomes a field error instead of
//! a decoding failure. `validate` either produces a draft with parsed values
//! or the full set of [`FormErrors`].

mod comment;
mod post;
mod profile;
mod registration;
mod taxonomy;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use uuid::Uuid;

pub use comment::CommentForm;
pub use post::{ImageChange, ImageUpload, PostDraft, PostForm};
pub use profile::{ProfileDraft, ProfileForm};
pub use registration::{RegistrationDraft, RegistrationForm};
pub use taxonomy::{CategoryDraft, CategoryForm, LocationDraft, LocationForm};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Field name to error messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error message against `field`.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(value)` when no error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// Single-error shortcut used by checks that need the data store.
    pub fn single(field: &'static str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Error for a foreign key that does not resolve.
    pub fn invalid_choice(field: &'static str) -> Self {
        Self::single(field, INVALID_CHOICE)
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Trimmed value of a required field, recording an error when blank.
pub(crate) fn required(errors: &mut FormErrors, field: &'static str, value: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    }
    value.to_string()
}

pub(crate) fn max_chars(errors: &mut FormErrors, field: &'static str, value: &str, limit: usize) {
    let count = value.chars().count();
    if count > limit {
        errors.add(
            field,
            format!("Ensure this value has at most {limit} characters (it has {count})."),
        );
    }
}

/// Optional reference to another entity; blank means none.
pub(crate) fn optional_id(
    errors: &mut FormErrors,
    field: &'static str,
    value: Option<&str>,
) -> Option<Uuid> {
    let raw = value.map(str::trim).filter(|v| !v.is_empty())?;
    match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(field, INVALID_CHOICE);
            None
        }
    }
}

pub(crate) fn email(errors: &mut FormErrors, field: &'static str, value: &str) {
    let valid = value
        .split_once('@')
        .map(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !domain.contains('@')
        })
        .unwrap_or(false);
    if !valid || value.chars().any(char::is_whitespace) {
        errors.add(field, "Enter a valid email address.");
    }
    max_chars(errors, field, value, 254);
}

/// Letters, digits and `@ . + - _`, at most 150 characters.
pub(crate) fn username(errors: &mut FormErrors, field: &'static str, value: &str) {
    if value.is_empty() {
        return;
    }
    max_chars(errors, field, value, 150);
    let valid = value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'));
    if !valid {
        errors.add(
            field,
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_accumulate_per_field() {
        let mut errors = FormErrors::new();
        errors.add("title", "first");
        errors.add("title", "second");
        errors.add("text", REQUIRED);

        assert_eq!(errors.get("title").len(), 2);
        assert!(errors.has("text"));
        assert!(errors.get("missing").is_empty());
        assert!(errors.into_result(()).is_err());
    }

    #[test]
    fn errors_serialize_as_map() {
        let errors = FormErrors::single("text", REQUIRED);
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json["text"][0], REQUIRED);
    }

    #[test]
    fn blank_id_is_none_and_garbage_is_an_error() {
        let mut errors = FormErrors::new();
        assert_eq!(optional_id(&mut errors, "category", Some("  ")), None);
        assert_eq!(optional_id(&mut errors, "category", None), None);
        assert!(errors.is_empty());

        assert_eq!(optional_id(&mut errors, "category", Some("nope")), None);
        assert_eq!(errors.get("category"), [INVALID_CHOICE.to_string()]);
    }

    #[test]
    fn email_shapes() {
        for good in ["a@b.co", "first.last@mail.example.org"] {
            let mut errors = FormErrors::new();
            email(&mut errors, "email", good);
            assert!(errors.is_empty(), "{good} should be valid");
        }
        for bad in ["plain", "@b.co", "a@b", "a b@c.de", "a@.com"] {
            let mut errors = FormErrors::new();
            email(&mut errors, "email", bad);
            assert!(errors.has("email"), "{bad} should be invalid");
        }
    }

    #[test]
    fn username_characters() {
        let mut errors = FormErrors::new();
        username(&mut errors, "username", "anna.k+blog@home_1");
        assert!(errors.is_empty());

        username(&mut errors, "username", "anna k");
        assert!(errors.has("username"));
    }
}
