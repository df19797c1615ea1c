//! Domain entities - the core business objects.

mod category;
mod comment;
mod location;
mod post;
mod user;

pub use category::Category;
pub use comment::Comment;
pub use location::Location;
pub use post::{IMAGE_UPLOAD_PREFIX, Post};
pub use user::{AuthorSummary, User};

/// Maximum length of titles and names.
pub const TITLE_LENGTH: usize = 256;
