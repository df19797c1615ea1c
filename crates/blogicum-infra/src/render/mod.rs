//! Renderer implementations.

mod json;

pub use json::{JsonRenderer, TEMPLATES};
