//! JSON renderer.
//!
//! Emits the render context inside the [`ApiResponse`] envelope, tagged with
//! the template name, so clients receive the same data a page would show.

use std::collections::BTreeSet;

use blogicum_core::ports::{RenderError, Rendered, Renderer};
use blogicum_shared::ApiResponse;

/// Every page template the server renders.
pub const TEMPLATES: &[&str] = &[
    "blog/index.html",
    "blog/detail.html",
    "blog/category.html",
    "blog/profile.html",
    "blog/postadd.html",
    "blog/user.html",
    "blog/comment.html",
    "registration/registration_form.html",
    "registration/login.html",
];

pub struct JsonRenderer {
    templates: BTreeSet<String>,
}

impl JsonRenderer {
    pub fn new<I, S>(templates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            templates: templates.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for JsonRenderer {
    fn default() -> Self {
        Self::new(TEMPLATES.iter().copied())
    }
}

impl Renderer for JsonRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<Rendered, RenderError> {
        if !self.templates.contains(template) {
            return Err(RenderError::TemplateNotFound(template.to_owned()));
        }

        let body = serde_json::to_string(&ApiResponse::page(template, context))
            .map_err(|e| RenderError::Failed(e.to_string()))?;

        Ok(Rendered {
            content_type: "application/json".to_owned(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_wraps_context() {
        let renderer = JsonRenderer::default();

        let rendered = renderer
            .render("blog/detail.html", &json!({"post": {"title": "Hello"}}))
            .unwrap();

        assert_eq!(rendered.content_type, "application/json");
        let body: serde_json::Value = serde_json::from_str(&rendered.body).unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["template"], "blog/detail.html");
        assert_eq!(body["data"]["post"]["title"], "Hello");
    }

    #[test]
    fn test_unknown_template() {
        let renderer = JsonRenderer::new(["blog/index.html"]);

        assert!(matches!(
            renderer.render("blog/detail.html", &json!({})),
            Err(RenderError::TemplateNotFound(_))
        ));
    }
}
