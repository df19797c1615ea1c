//! # Blogicum Core
//!
//! The domain layer of Blogicum.
//! This crate contains the blog's entities, form validation, query filters and
//! ownership policy with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod forms;
pub mod policy;
pub mod ports;
pub mod query;

pub use error::DomainError;
