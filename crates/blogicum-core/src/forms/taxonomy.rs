use serde::{Deserialize, Serialize};

use super::{FormErrors, max_chars, required};
use crate::domain::{Category, Location, TITLE_LENGTH};

/// Category management form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryForm {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryDraft {
    pub title: String,
    pub description: String,
    pub slug: String,
    pub is_published: bool,
}

impl CategoryForm {
    pub fn validate(&self) -> Result<CategoryDraft, FormErrors> {
        let mut errors = FormErrors::new();

        let title = required(&mut errors, "title", &self.title);
        max_chars(&mut errors, "title", &title, TITLE_LENGTH);
        let description = required(&mut errors, "description", &self.description);
        let slug = required(&mut errors, "slug", &self.slug);
        if !slug.is_empty()
            && !slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }
        max_chars(&mut errors, "slug", &slug, 50);

        errors.into_result(CategoryDraft {
            title,
            description,
            slug,
            is_published: self.is_published.unwrap_or(true),
        })
    }
}

impl CategoryDraft {
    pub fn into_category(self) -> Category {
        let mut category = Category::new(self.title, self.description, self.slug);
        category.is_published = self.is_published;
        category
    }

    pub fn apply_to(self, category: &mut Category) {
        category.title = self.title;
        category.description = self.description;
        category.slug = self.slug;
        category.is_published = self.is_published;
    }
}

/// Location management form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationForm {
    pub name: String,
    pub is_published: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationDraft {
    pub name: String,
    pub is_published: bool,
}

impl LocationForm {
    pub fn validate(&self) -> Result<LocationDraft, FormErrors> {
        let mut errors = FormErrors::new();
        let name = required(&mut errors, "name", &self.name);
        max_chars(&mut errors, "name", &name, TITLE_LENGTH);
        errors.into_result(LocationDraft {
            name,
            is_published: self.is_published.unwrap_or(true),
        })
    }
}

impl LocationDraft {
    pub fn into_location(self) -> Location {
        let mut location = Location::new(self.name);
        location.is_published = self.is_published;
        location
    }

    pub fn apply_to(self, location: &mut Location) {
        location.name = self.name;
        location.is_published = self.is_published;
    }
}
