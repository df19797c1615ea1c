use serde::{Deserialize, Serialize};

use super::{FormErrors, email, max_chars, required, username};
use crate::domain::User;

/// Profile edit form: first name, last name, username and email.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

/// Validated profile edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }

    /// Field checks only; username uniqueness needs the user store.
    pub fn validate(&self) -> Result<ProfileDraft, FormErrors> {
        let mut errors = FormErrors::new();

        let first_name = self.first_name.trim().to_string();
        max_chars(&mut errors, "first_name", &first_name, 150);
        let last_name = self.last_name.trim().to_string();
        max_chars(&mut errors, "last_name", &last_name, 150);
        let name = required(&mut errors, "username", &self.username);
        username(&mut errors, "username", &name);
        let address = self.email.trim().to_string();
        if !address.is_empty() {
            email(&mut errors, "email", &address);
        }

        errors.into_result(ProfileDraft {
            first_name,
            last_name,
            username: name,
            email: address,
        })
    }
}

impl ProfileDraft {
    pub fn apply_to(self, user: &mut User) {
        user.first_name = self.first_name;
        user.last_name = self.last_name;
        user.username = self.username;
        user.email = self.email;
        user.updated_at = chrono::Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_optional_but_checked() {
        let form = ProfileForm {
            username: "anna".into(),
            ..Default::default()
        };
        assert!(form.validate().is_ok());

        let form = ProfileForm {
            email: "not-an-email".into(),
            ..form
        };
        assert!(form.validate().unwrap_err().has("email"));
    }

    #[test]
    fn username_required() {
        let errors = ProfileForm::default().validate().unwrap_err();
        assert!(errors.has("username"));
    }

    #[test]
    fn draft_updates_user() {
        let mut user = User::new("anna".into(), String::new(), "hash".into());
        let form = ProfileForm {
            first_name: "Anna".into(),
            last_name: "Karenina".into(),
            username: "anna_k".into(),
            email: "anna@example.com".into(),
        };
        form.validate().unwrap().apply_to(&mut user);

        assert_eq!(user.username, "anna_k");
        assert_eq!(user.display_name(), "Anna Karenina");
        assert_eq!(user.password_hash, "hash");
    }
}
