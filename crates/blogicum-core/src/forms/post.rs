use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FormErrors, max_chars, optional_id, required};
use crate::domain::{Post, TITLE_LENGTH};

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

/// Accepted `pub_date` layouts besides RFC 3339; the first is `datetime-local`.
const DATE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Post form: title, text, category, location, image and pub_date.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub text: String,
    pub pub_date: String,
    pub category: Option<String>,
    pub location: Option<String>,
    /// Base64-encoded image bytes.
    #[serde(skip_serializing)]
    pub image: Option<String>,
    /// Original file name of `image`, used for its extension.
    pub image_name: Option<String>,
    /// Drop the current image when no new one is uploaded.
    pub image_clear: bool,
}

/// Decoded image attached to a post form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub extension: String,
    pub bytes: Vec<u8>,
}

/// What to do with a post's stored image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(ImageUpload),
}

/// Validated post form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub image: ImageChange,
}

impl PostForm {
    /// Pre-filled form for editing an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            text: post.text.clone(),
            pub_date: post.pub_date.format(DATE_FORMATS[0]).to_string(),
            category: post.category_id.map(|id| id.to_string()),
            location: post.location_id.map(|id| id.to_string()),
            image: None,
            image_name: None,
            image_clear: false,
        }
    }

    pub fn validate(&self) -> Result<PostDraft, FormErrors> {
        let mut errors = FormErrors::new();

        let title = required(&mut errors, "title", &self.title);
        max_chars(&mut errors, "title", &title, TITLE_LENGTH);
        let text = required(&mut errors, "text", &self.text);
        let pub_date = parse_pub_date(&mut errors, &self.pub_date);
        let category_id = optional_id(&mut errors, "category", self.category.as_deref());
        let location_id = optional_id(&mut errors, "location", self.location.as_deref());
        let image = self.image_change(&mut errors);

        let draft = PostDraft {
            title,
            text,
            pub_date: pub_date.unwrap_or_default(),
            category_id,
            location_id,
            image,
        };
        errors.into_result(draft)
    }

    fn image_change(&self, errors: &mut FormErrors) -> ImageChange {
        let Some(encoded) = self.image.as_deref().map(str::trim).filter(|v| !v.is_empty())
        else {
            return if self.image_clear {
                ImageChange::Clear
            } else {
                ImageChange::Keep
            };
        };

        let extension = self
            .image_name
            .as_deref()
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            errors.add(
                "image",
                format!(
                    "File extension is not allowed. Allowed extensions are: {}.",
                    IMAGE_EXTENSIONS.join(", ")
                ),
            );
            return ImageChange::Keep;
        }

        match STANDARD.decode(encoded) {
            Ok(bytes) if !bytes.is_empty() => ImageChange::Replace(ImageUpload { extension, bytes }),
            _ => {
                errors.add("image", "The submitted file is empty or not a valid image.");
                ImageChange::Keep
            }
        }
    }
}

impl PostDraft {
    /// Build a new post authored by `author_id`; the image is attached separately.
    pub fn into_post(self, author_id: Uuid) -> Post {
        let mut post = Post::new(author_id, String::new(), String::new(), self.pub_date);
        self.apply_to(&mut post);
        post
    }

    /// Copy the edited fields onto `post`; the author and image stay untouched.
    pub fn apply_to(&self, post: &mut Post) {
        post.title = self.title.clone();
        post.text = self.text.clone();
        post.pub_date = self.pub_date;
        post.category_id = self.category_id;
        post.location_id = self.location_id;
        post.updated_at = Utc::now();
    }
}

fn parse_pub_date(errors: &mut FormErrors, raw: &str) -> Option<DateTime<Utc>> {
    let raw = required(errors, "pub_date", raw);
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let parsed = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(&raw, format).ok())
        .map(|naive| naive.and_utc());
    if parsed.is_none() {
        errors.add("pub_date", "Enter a valid date/time.");
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, TimeZone, Timelike};

    fn filled() -> PostForm {
        PostForm {
            title: "Morning in Kazan".into(),
            text: "Fog over the Volga.".into(),
            pub_date: "2024-05-01T09:30".into(),
            ..Default::default()
        }
    }

    #[test]
    fn valid_form_produces_draft() {
        let draft = filled().validate().unwrap();
        assert_eq!(draft.title, "Morning in Kazan");
        assert_eq!(draft.pub_date.year(), 2024);
        assert_eq!(draft.pub_date.hour(), 9);
        assert_eq!(draft.image, ImageChange::Keep);
        assert_eq!(draft.category_id, None);
    }

    #[test]
    fn rfc3339_dates_are_converted_to_utc() {
        let form = PostForm {
            pub_date: "2024-05-01T12:00:00+03:00".into(),
            ..filled()
        };
        let draft = form.validate().unwrap();
        assert_eq!(draft.pub_date, Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn missing_fields_are_reported_together() {
        let errors = PostForm::default().validate().unwrap_err();
        assert!(errors.has("title"));
        assert!(errors.has("text"));
        assert!(errors.has("pub_date"));
        assert!(!errors.has("category"));
    }

    #[test]
    fn long_title_and_bad_date_rejected() {
        let form = PostForm {
            title: "x".repeat(TITLE_LENGTH + 1),
            pub_date: "yesterday".into(),
            ..filled()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.has("title"));
        assert_eq!(errors.get("pub_date"), ["Enter a valid date/time.".to_string()]);
    }

    #[test]
    fn image_requires_known_extension() {
        let form = PostForm {
            image: Some(STANDARD.encode(b"GIF89a")),
            image_name: Some("cat.exe".into()),
            ..filled()
        };
        assert!(form.validate().unwrap_err().has("image"));

        let form = PostForm {
            image_name: Some("Cat.GIF".into()),
            ..form
        };
        let draft = form.validate().unwrap();
        assert_eq!(
            draft.image,
            ImageChange::Replace(ImageUpload {
                extension: "gif".into(),
                bytes: b"GIF89a".to_vec()
            })
        );
    }

    #[test]
    fn clear_flag_without_upload_clears_image() {
        let form = PostForm {
            image_clear: true,
            ..filled()
        };
        assert_eq!(form.validate().unwrap().image, ImageChange::Clear);
    }

    #[test]
    fn apply_keeps_author_and_image() {
        let author = Uuid::new_v4();
        let mut post = filled().validate().unwrap().into_post(author);
        post.image = Some("post_images/a.png".into());

        let category = Uuid::new_v4();
        let edit = PostForm {
            title: "Evening".into(),
            category: Some(category.to_string()),
            ..filled()
        };
        edit.validate().unwrap().apply_to(&mut post);

        assert_eq!(post.title, "Evening");
        assert_eq!(post.category_id, Some(category));
        assert_eq!(post.author_id, author);
        assert_eq!(post.image.as_deref(), Some("post_images/a.png"));
    }

    #[test]
    fn edit_form_round_trips_pub_date() {
        let post = filled().validate().unwrap().into_post(Uuid::new_v4());
        let form = PostForm::from_post(&post);
        assert_eq!(form.pub_date, "2024-05-01T09:30");
        assert_eq!(form.validate().unwrap().pub_date, post.pub_date);
    }
}
