//! Query layer - post filters, ordering and pagination.
//!
//! Repositories translate a [`PostFilter`] into their own query language; the
//! filter also knows how to evaluate itself against a post so that in-memory
//! stores and tests share the exact same semantics.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{AuthorSummary, Category, Comment, Location, Post};
use crate::error::RepoError;
use crate::policy;

/// Posts per page on every listing.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Which posts a listing contains.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    /// Apply the publication gate at this instant.
    pub visible_at: Option<DateTime<Utc>>,
    pub category_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
}

impl PostFilter {
    /// Every post, drafts included.
    pub fn all() -> Self {
        Self::default()
    }

    /// Posts that pass the publication gate at `now`.
    pub fn published(now: DateTime<Utc>) -> Self {
        Self {
            visible_at: Some(now),
            ..Self::default()
        }
    }

    pub fn in_category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    pub fn by_author(mut self, author_id: Uuid) -> Self {
        self.author_id = Some(author_id);
        self
    }

    /// Evaluate the filter; `category` is the post's category, if it has one.
    pub fn matches(&self, post: &Post, category: Option<&Category>) -> bool {
        if self.author_id.is_some_and(|id| post.author_id != id) {
            return false;
        }
        if self.category_id.is_some_and(|id| post.category_id != Some(id)) {
            return false;
        }
        match self.visible_at {
            Some(now) => policy::is_publicly_visible(post, category, now),
            None => true,
        }
    }
}

/// Listing order by publication date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PostOrder {
    /// Oldest first - the public feeds.
    #[default]
    PublishedAsc,
    /// Newest first - profile pages.
    PublishedDesc,
}

/// A 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u64,
    pub size: u64,
}

impl PageRequest {
    pub fn new(number: u64, size: u64) -> Self {
        Self {
            number,
            size: size.max(1),
        }
    }

    pub fn first(size: u64) -> Self {
        Self::new(1, size)
    }

    /// Parse the `page` query parameter; absent means the first page.
    pub fn parse(raw: Option<&str>, size: u64) -> Result<Self, RepoError> {
        match raw.map(str::trim).filter(|v| !v.is_empty()) {
            None => Ok(Self::first(size)),
            Some(value) => value
                .parse::<u64>()
                .map(|number| Self::new(number, size))
                .map_err(|_| RepoError::NotFound),
        }
    }

    /// Zero-based index of the requested page.
    pub fn index(&self) -> u64 {
        self.number.saturating_sub(1)
    }

    pub fn offset(&self) -> u64 {
        self.index() * self.size
    }

    /// Number of pages for `total_items`; an empty listing still has one page.
    pub fn total_pages(&self, total_items: u64) -> u64 {
        total_items.div_ceil(self.size).max(1)
    }

    /// Reject page numbers outside `1..=total_pages`.
    pub fn ensure_within(&self, total_items: u64) -> Result<(), RepoError> {
        if self.number == 0 || self.number > self.total_pages(total_items) {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let total_pages = request.total_pages(total_items);
        Self {
            items,
            number: request.number,
            page_size: request.size,
            total_items,
            total_pages,
            has_previous: request.number > 1,
            has_next: request.number < total_pages,
        }
    }

    /// Transform the items, keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }

    /// Transform the items, dropping those `f` maps to `None`.
    pub fn filter_map<U>(self, f: impl FnMut(T) -> Option<U>) -> Page<U> {
        Page {
            items: self.items.into_iter().filter_map(f).collect(),
            number: self.number,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
        }
    }

    /// Slice an already filtered and ordered listing.
    pub fn from_all(all: Vec<T>, request: PageRequest) -> Result<Self, RepoError> {
        let total = all.len() as u64;
        request.ensure_within(total)?;
        let items = all
            .into_iter()
            .skip(request.offset() as usize)
            .take(request.size as usize)
            .collect();
        Ok(Self::new(items, request, total))
    }
}

/// A listed post with everything its card shows.
#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorSummary,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}

/// A comment with its author.
#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: AuthorSummary,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn post(author: Uuid) -> Post {
        Post::new(author, "t".into(), "x".into(), Utc::now() - Duration::hours(1))
    }

    #[test]
    fn filter_by_author_and_category() {
        let author = Uuid::new_v4();
        let category = Category::new("c".into(), "d".into(), "c".into());
        let mine = post(author).with_category(category.id);
        let other = post(Uuid::new_v4());

        let filter = PostFilter::all().by_author(author).in_category(category.id);
        assert!(filter.matches(&mine, Some(&category)));
        assert!(!filter.matches(&other, None));
        assert!(!PostFilter::all().in_category(category.id).matches(&other, None));
    }

    #[test]
    fn published_filter_applies_gate() {
        let now = Utc::now();
        let draft = post(Uuid::new_v4()).unpublished();
        assert!(!PostFilter::published(now).matches(&draft, None));
        assert!(PostFilter::all().matches(&draft, None));
    }

    #[test]
    fn page_bounds() {
        let request = PageRequest::new(2, 10);
        assert_eq!(request.offset(), 10);
        assert_eq!(request.total_pages(0), 1);
        assert_eq!(request.total_pages(21), 3);
        assert!(request.ensure_within(11).is_ok());
        assert!(request.ensure_within(10).is_err());
        assert!(PageRequest::new(0, 10).ensure_within(5).is_err());
        assert!(PageRequest::first(10).ensure_within(0).is_ok());
    }

    #[test]
    fn parse_page_parameter() {
        assert_eq!(PageRequest::parse(None, 10).unwrap().number, 1);
        assert_eq!(PageRequest::parse(Some("3"), 10).unwrap().number, 3);
        assert!(PageRequest::parse(Some("last"), 10).is_err());
        assert!(PageRequest::parse(Some("-1"), 10).is_err());
    }

    #[test]
    fn page_slices_listing() {
        let page = Page::from_all((1..=25).collect::<Vec<_>>(), PageRequest::new(3, 10)).unwrap();
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_previous);
        assert!(!page.has_next);

        let empty = Page::<u8>::from_all(vec![], PageRequest::first(10)).unwrap();
        assert!(empty.items.is_empty());
        assert!(!empty.has_next);
    }

    #[test]
    fn filter_map_keeps_page_metadata() {
        let page = Page::from_all((1..=15).collect::<Vec<u32>>(), PageRequest::new(2, 10)).unwrap();
        let odd: Page<String> = page.filter_map(|n| (n % 2 == 1).then(|| n.to_string()));

        assert_eq!(odd.items, vec!["11", "13", "15"]);
        assert_eq!(odd.number, 2);
        assert_eq!(odd.total_items, 15);
        assert_eq!(odd.total_pages, 2);
        assert!(odd.has_previous);
    }
}
