use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{AuthorSummary, Category, Comment, Location, Post, User};
use blogicum_core::error::RepoError;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blogicum_core::query::{CommentView, Page, PageRequest, PostCard, PostFilter, PostOrder};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn card(&self, post: &Post) -> Option<PostCard> {
        let author = self.users.get(&post.author_id)?;
        Some(PostCard {
            post: post.clone(),
            author: AuthorSummary::from(author),
            category: post
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
            location: post
                .location_id
                .and_then(|id| self.locations.get(&id).cloned()),
            comment_count: self
                .comments
                .values()
                .filter(|c| c.post_id == post.id)
                .count() as u64,
        })
    }

    fn delete_post(&mut self, id: Uuid) -> Option<Post> {
        let post = self.posts.remove(&id)?;
        self.comments.retain(|_, c| c.post_id != id);
        Some(post)
    }
}

/// A row type stored in [`Tables`], with its integrity rules.
trait Row: Clone + Send + Sync + 'static {
    fn id(&self) -> Uuid;
    fn table(tables: &Tables) -> &HashMap<Uuid, Self>;
    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self>;

    /// Unique and foreign key checks performed before a write.
    fn check(&self, _tables: &Tables) -> Result<(), RepoError> {
        Ok(())
    }

    /// Remove the row and apply the schema's `ON DELETE` rules.
    fn delete(tables: &mut Tables, id: Uuid) -> bool {
        Self::table_mut(tables).remove(&id).is_some()
    }
}

fn missing_reference(name: &str) -> RepoError {
    RepoError::Constraint(format!("{name} does not exist"))
}

impl Row for User {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.users
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.users
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        let taken = tables
            .users
            .values()
            .any(|u| u.id != self.id && u.username == self.username);
        if taken {
            return Err(RepoError::Constraint(
                "duplicate key value violates unique constraint users_username_key".into(),
            ));
        }
        Ok(())
    }

    fn delete(tables: &mut Tables, id: Uuid) -> bool {
        if tables.users.remove(&id).is_none() {
            return false;
        }
        let authored: Vec<Uuid> = tables
            .posts
            .values()
            .filter(|p| p.author_id == id)
            .map(|p| p.id)
            .collect();
        for post_id in authored {
            tables.delete_post(post_id);
        }
        tables.comments.retain(|_, c| c.author_id != id);
        true
    }
}

impl Row for Category {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.categories
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.categories
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        let taken = tables
            .categories
            .values()
            .any(|c| c.id != self.id && c.slug == self.slug);
        if taken {
            return Err(RepoError::Constraint(
                "duplicate key value violates unique constraint categories_slug_key".into(),
            ));
        }
        Ok(())
    }

    fn delete(tables: &mut Tables, id: Uuid) -> bool {
        if tables.categories.remove(&id).is_none() {
            return false;
        }
        for post in tables.posts.values_mut() {
            if post.category_id == Some(id) {
                post.category_id = None;
            }
        }
        true
    }
}

impl Row for Location {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.locations
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.locations
    }

    fn delete(tables: &mut Tables, id: Uuid) -> bool {
        if tables.locations.remove(&id).is_none() {
            return false;
        }
        for post in tables.posts.values_mut() {
            if post.location_id == Some(id) {
                post.location_id = None;
            }
        }
        true
    }
}

impl Row for Post {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.posts
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.posts
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.users.contains_key(&self.author_id) {
            return Err(missing_reference("author"));
        }
        if self
            .category_id
            .is_some_and(|id| !tables.categories.contains_key(&id))
        {
            return Err(missing_reference("category"));
        }
        if self
            .location_id
            .is_some_and(|id| !tables.locations.contains_key(&id))
        {
            return Err(missing_reference("location"));
        }
        Ok(())
    }

    fn delete(tables: &mut Tables, id: Uuid) -> bool {
        tables.delete_post(id).is_some()
    }
}

impl Row for Comment {
    fn id(&self) -> Uuid {
        self.id
    }

    fn table(tables: &Tables) -> &HashMap<Uuid, Self> {
        &tables.comments
    }

    fn table_mut(tables: &mut Tables) -> &mut HashMap<Uuid, Self> {
        &mut tables.comments
    }

    fn check(&self, tables: &Tables) -> Result<(), RepoError> {
        if !tables.posts.contains_key(&self.post_id) {
            return Err(missing_reference("post"));
        }
        if !tables.users.contains_key(&self.author_id) {
            return Err(missing_reference("author"));
        }
        Ok(())
    }
}

/// Shared in-memory tables; clones share the same data.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> InMemoryUserRepository {
        InMemoryRepository::new(self.clone())
    }

    pub fn categories(&self) -> InMemoryCategoryRepository {
        InMemoryRepository::new(self.clone())
    }

    pub fn locations(&self) -> InMemoryLocationRepository {
        InMemoryRepository::new(self.clone())
    }

    pub fn posts(&self) -> InMemoryPostRepository {
        InMemoryRepository::new(self.clone())
    }

    pub fn comments(&self) -> InMemoryCommentRepository {
        InMemoryRepository::new(self.clone())
    }
}

/// Generic in-memory repository over one table of an [`InMemoryStore`].
pub struct InMemoryRepository<T> {
    store: InMemoryStore,
    _row: PhantomData<T>,
}

impl<T> InMemoryRepository<T> {
    fn new(store: InMemoryStore) -> Self {
        Self {
            store,
            _row: PhantomData,
        }
    }
}

pub type InMemoryUserRepository = InMemoryRepository<User>;
pub type InMemoryCategoryRepository = InMemoryRepository<Category>;
pub type InMemoryLocationRepository = InMemoryRepository<Location>;
pub type InMemoryPostRepository = InMemoryRepository<Post>;
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;

#[async_trait]
impl<T: Row> BaseRepository<T, Uuid> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(T::table(&tables).get(&id).cloned())
    }

    async fn save(&self, entity: T) -> Result<T, RepoError> {
        let mut tables = self.store.tables.write().await;
        entity.check(&tables)?;
        T::table_mut(&mut tables).insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.store.tables.write().await;
        if T::delete(&mut tables, id) {
            Ok(())
        } else {
            Err(RepoError::NotFound)
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl CategoryRepository for InMemoryCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(categories)
    }
}

#[async_trait]
impl LocationRepository for InMemoryLocationRepository {
    async fn list_all(&self) -> Result<Vec<Location>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut locations: Vec<Location> = tables.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(
        &self,
        filter: &PostFilter,
        order: PostOrder,
        page: PageRequest,
    ) -> Result<Page<PostCard>, RepoError> {
        tracing::debug!(?filter, ?order, page = page.number, "Listing posts in memory");
        let tables = self.store.tables.read().await;

        let mut matching: Vec<&Post> = tables
            .posts
            .values()
            .filter(|post| {
                let category = post.category_id.and_then(|id| tables.categories.get(&id));
                filter.matches(post, category)
            })
            .collect();
        matching.sort_by_key(|post| (post.pub_date, post.created_at));
        if order == PostOrder::PublishedDesc {
            matching.reverse();
        }

        let page = Page::from_all(matching, page)?;
        Ok(page.filter_map(|post| tables.card(post)))
    }

    async fn find_card(&self, id: Uuid) -> Result<Option<PostCard>, RepoError> {
        let tables = self.store.tables.read().await;
        Ok(tables.posts.get(&id).and_then(|post| tables.card(post)))
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError> {
        let tables = self.store.tables.read().await;
        let mut comments: Vec<CommentView> = tables
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .filter_map(|c| {
                let author = tables.users.get(&c.author_id)?;
                Some(CommentView {
                    comment: c.clone(),
                    author: AuthorSummary::from(author),
                })
            })
            .collect();
        comments.sort_by_key(|view| view.comment.created_at);
        Ok(comments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    struct Fixture {
        store: InMemoryStore,
        author: User,
        category: Category,
    }

    async fn fixture() -> Fixture {
        let store = InMemoryStore::new();
        let author = store
            .users()
            .save(User::new("tolstoy".into(), String::new(), "hash".into()))
            .await
            .unwrap();
        let category = store
            .categories()
            .save(Category::new("Travel".into(), "Trips".into(), "travel".into()))
            .await
            .unwrap();
        Fixture {
            store,
            author,
            category,
        }
    }

    fn post_at(author: &User, offset: Duration) -> Post {
        Post::new(author.id, "Post".into(), "Text".into(), Utc::now() + offset)
    }

    #[tokio::test]
    async fn published_listing_applies_gate_and_order() {
        let f = fixture().await;
        let posts = f.store.posts();

        let yesterday = posts
            .save(post_at(&f.author, -Duration::days(1)).with_category(f.category.id))
            .await
            .unwrap();
        let today = posts
            .save(post_at(&f.author, -Duration::minutes(1)))
            .await
            .unwrap();
        posts
            .save(post_at(&f.author, Duration::days(1)))
            .await
            .unwrap();
        posts
            .save(post_at(&f.author, -Duration::days(2)).unpublished())
            .await
            .unwrap();

        let page = posts
            .list(
                &PostFilter::published(Utc::now()),
                PostOrder::PublishedAsc,
                PageRequest::first(10),
            )
            .await
            .unwrap();

        let ids: Vec<Uuid> = page.items.iter().map(|c| c.post.id).collect();
        assert_eq!(ids, vec![yesterday.id, today.id]);
        assert_eq!(page.items[0].category.as_ref().unwrap().slug, "travel");
        assert_eq!(page.items[0].author.username, "tolstoy");
    }

    #[tokio::test]
    async fn unpublished_category_hides_its_posts() {
        let f = fixture().await;
        let posts = f.store.posts();
        posts
            .save(post_at(&f.author, -Duration::days(1)).with_category(f.category.id))
            .await
            .unwrap();

        let mut hidden = f.category.clone();
        hidden.is_published = false;
        f.store.categories().save(hidden).await.unwrap();

        let page = posts
            .list(
                &PostFilter::published(Utc::now()),
                PostOrder::PublishedAsc,
                PageRequest::first(10),
            )
            .await
            .unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn author_listing_is_newest_first_with_drafts() {
        let f = fixture().await;
        let posts = f.store.posts();
        let old = posts
            .save(post_at(&f.author, -Duration::days(3)))
            .await
            .unwrap();
        let draft = posts
            .save(post_at(&f.author, Duration::days(3)).unpublished())
            .await
            .unwrap();

        let page = posts
            .list(
                &PostFilter::all().by_author(f.author.id),
                PostOrder::PublishedDesc,
                PageRequest::first(10),
            )
            .await
            .unwrap();
        let ids: Vec<Uuid> = page.items.iter().map(|c| c.post.id).collect();
        assert_eq!(ids, vec![draft.id, old.id]);
    }

    #[tokio::test]
    async fn pagination_and_out_of_range_pages() {
        let f = fixture().await;
        let posts = f.store.posts();
        for day in 1..=12 {
            posts
                .save(post_at(&f.author, -Duration::days(day)))
                .await
                .unwrap();
        }

        let filter = PostFilter::published(Utc::now());
        let second = posts
            .list(&filter, PostOrder::PublishedAsc, PageRequest::new(2, 10))
            .await
            .unwrap();
        assert_eq!(second.items.len(), 2);
        assert_eq!(second.total_pages, 2);
        assert!(!second.has_next);

        let third = posts
            .list(&filter, PostOrder::PublishedAsc, PageRequest::new(3, 10))
            .await;
        assert!(matches!(third, Err(RepoError::NotFound)));
    }

    #[tokio::test]
    async fn comment_counts_and_comment_order() {
        let f = fixture().await;
        let post = f
            .store
            .posts()
            .save(post_at(&f.author, -Duration::days(1)))
            .await
            .unwrap();

        let comments = f.store.comments();
        let mut first = Comment::new(post.id, f.author.id, "first".into());
        first.created_at = Utc::now() - Duration::minutes(5);
        comments.save(Comment::new(post.id, f.author.id, "second".into())).await.unwrap();
        comments.save(first).await.unwrap();

        let card = f.store.posts().find_card(post.id).await.unwrap().unwrap();
        assert_eq!(card.comment_count, 2);

        let listed = comments.list_for_post(post.id).await.unwrap();
        let texts: Vec<&str> = listed.iter().map(|v| v.comment.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn deleting_author_cascades_to_posts_and_comments() {
        let f = fixture().await;
        let reader = f
            .store
            .users()
            .save(User::new("reader".into(), String::new(), "hash".into()))
            .await
            .unwrap();
        let post = f
            .store
            .posts()
            .save(post_at(&f.author, -Duration::days(1)))
            .await
            .unwrap();
        let by_reader = f
            .store
            .comments()
            .save(Comment::new(post.id, reader.id, "hi".into()))
            .await
            .unwrap();

        f.store.users().delete(f.author.id).await.unwrap();

        assert!(f.store.posts().find_by_id(post.id).await.unwrap().is_none());
        assert!(
            f.store
                .comments()
                .find_by_id(by_reader.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(f.store.users().find_by_id(reader.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_category_or_location_nulls_reference() {
        let f = fixture().await;
        let location = f
            .store
            .locations()
            .save(Location::new("Moscow".into()))
            .await
            .unwrap();
        let post = f
            .store
            .posts()
            .save(
                post_at(&f.author, -Duration::days(1))
                    .with_category(f.category.id)
                    .with_location(location.id),
            )
            .await
            .unwrap();

        f.store.categories().delete(f.category.id).await.unwrap();
        f.store.locations().delete(location.id).await.unwrap();

        let post = f.store.posts().find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(post.category_id, None);
        assert_eq!(post.location_id, None);
    }

    #[tokio::test]
    async fn unique_username_and_slug() {
        let f = fixture().await;
        let duplicate = User::new("tolstoy".into(), String::new(), "hash".into());
        assert!(matches!(
            f.store.users().save(duplicate).await,
            Err(RepoError::Constraint(_))
        ));

        let mut renamed = f.author.clone();
        renamed.first_name = "Lev".into();
        assert!(f.store.users().save(renamed).await.is_ok());

        let clash = Category::new("Other".into(), "x".into(), "travel".into());
        assert!(matches!(
            f.store.categories().save(clash).await,
            Err(RepoError::Constraint(_))
        ));
    }

    #[tokio::test]
    async fn dangling_references_rejected() {
        let f = fixture().await;
        let orphan = Post::new(Uuid::new_v4(), "t".into(), "x".into(), Utc::now());
        assert!(f.store.posts().save(orphan).await.is_err());

        let stray = Comment::new(Uuid::new_v4(), f.author.id, "hi".into());
        assert!(f.store.comments().save(stray).await.is_err());
    }
}
