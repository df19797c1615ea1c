use serde::{Deserialize, Serialize};

use super::{FormErrors, email, required, username};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Sign-up form with password confirmation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
}

/// Validated registration; the password is still plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationDraft {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegistrationForm {
    /// Field checks only; username uniqueness needs the user store.
    pub fn validate(&self) -> Result<RegistrationDraft, FormErrors> {
        let mut errors = FormErrors::new();

        let name = required(&mut errors, "username", &self.username);
        username(&mut errors, "username", &name);

        let address = self.email.trim().to_string();
        if !address.is_empty() {
            email(&mut errors, "email", &address);
        }

        if self.password1.is_empty() {
            errors.add("password1", super::REQUIRED);
        }
        if self.password2.is_empty() {
            errors.add("password2", super::REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        } else {
            if self.password1.chars().count() < MIN_PASSWORD_LENGTH {
                errors.add(
                    "password2",
                    format!(
                        "This password is too short. It must contain at least {MIN_PASSWORD_LENGTH} characters."
                    ),
                );
            }
            if self.password1.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password2", "This password is entirely numeric.");
            }
        }

        errors.into_result(RegistrationDraft {
            username: name,
            email: address,
            password: self.password1.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(password1: &str, password2: &str) -> RegistrationForm {
        RegistrationForm {
            username: "pierre".into(),
            email: String::new(),
            password1: password1.into(),
            password2: password2.into(),
        }
    }

    #[test]
    fn matching_passwords_accepted() {
        let draft = form("war-and-peace", "war-and-peace").validate().unwrap();
        assert_eq!(draft.username, "pierre");
        assert_eq!(draft.password, "war-and-peace");
    }

    #[test]
    fn mismatch_reported_on_confirmation() {
        let errors = form("war-and-peace", "war-and-pieces").validate().unwrap_err();
        assert_eq!(
            errors.get("password2"),
            ["The two password fields didn't match.".to_string()]
        );
    }

    #[test]
    fn weak_passwords_rejected() {
        assert!(form("short", "short").validate().unwrap_err().has("password2"));
        assert!(form("12345678", "12345678").validate().unwrap_err().has("password2"));
    }

    #[test]
    fn passwords_never_serialized() {
        let json = serde_json::to_value(form("war-and-peace", "war-and-peace")).unwrap();
        assert!(json.get("password1").is_none());
        assert!(json.get("password2").is_none());
        assert_eq!(json["username"], "pierre");
    }
}
