//! In-memory store - used when no database is configured, and in tests.
//!
//! All five tables live behind one async `RwLock`, so every save or delete
//! (cascades included) happens atomically with respect to other requests.
//! Note: Data is lost on process restart.

mod store;

pub use store::{
    InMemoryCategoryRepository, InMemoryCommentRepository, InMemoryLocationRepository,
    InMemoryPostRepository, InMemoryRepository, InMemoryStore, InMemoryUserRepository,
};
