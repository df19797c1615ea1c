use serde::{Deserialize, Serialize};

use super::{FormErrors, required};

/// Comment form; the post and author come from the route and the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub text: String,
}

impl CommentForm {
    /// Validated comment text.
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::new();
        let text = required(&mut errors, "text", &self.text);
        errors.into_result(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_comment_rejected() {
        let form = CommentForm { text: "  \n".into() };
        assert!(form.validate().unwrap_err().has("text"));
    }

    #[test]
    fn text_is_trimmed() {
        let form = CommentForm {
            text: " Nice shot! ".into(),
        };
        assert_eq!(form.validate().unwrap(), "Nice shot!");
    }
}
