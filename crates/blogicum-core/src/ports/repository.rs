use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Category, Comment, Location, Post, User};
use crate::error::RepoError;
use crate::query::{CommentView, Page, PageRequest, PostCard, PostFilter, PostOrder};

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID, applying the schema's cascade rules.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their (unique) username.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;
}

#[async_trait]
pub trait CategoryRepository: BaseRepository<Category, Uuid> {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError>;

    /// All categories ordered by title, for form choices.
    async fn list_all(&self) -> Result<Vec<Category>, RepoError>;
}

#[async_trait]
pub trait LocationRepository: BaseRepository<Location, Uuid> {
    /// All locations ordered by name, for form choices.
    async fn list_all(&self) -> Result<Vec<Location>, RepoError>;
}

/// Post repository - the query layer's listings.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// One page of post cards matching `filter`.
    ///
    /// Fails with [`RepoError::NotFound`] when the page number is out of range.
    async fn list(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        page: PageRequest,
    ) -> Result<Page<PostCard>, RepoError>;

    /// A single post with author, category, location and comment count.
    async fn find_card(&self, id: Uuid) -> Result<Option<PostCard>, RepoError>;
}

#[async_trait]
pub trait CommentRepository: BaseRepository<Comment, Uuid> {
    /// Comments under a post, oldest first.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError>;
}
