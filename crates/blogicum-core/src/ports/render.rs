//! Template rendering port.
//!
//! Handlers never produce markup themselves: they hand a template name and a
//! JSON context to a [`Renderer`].

/// Rendered response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub content_type: String,
    pub body: String,
}

pub trait Renderer: Send + Sync {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<Rendered, RenderError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Rendering failed: {0}")]
    Failed(String),
}
