//! Authorization layer - ownership and visibility rules.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Category, Comment, Post};
use crate::query::PostCard;

/// A resource with a single owning user.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for Post {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for Comment {
    fn owner_id(&self) -> Uuid {
        self.author_id
    }
}

impl Owned for PostCard {
    fn owner_id(&self) -> Uuid {
        self.post.author_id
    }
}

/// Only the owner may edit or delete a resource.
pub fn can_modify<R: Owned + ?Sized>(user_id: Uuid, resource: &R) -> bool {
    resource.owner_id() == user_id
}

/// The publication gate: the post is published, its category (if any) is
/// published, and its publication date has passed.
pub fn is_publicly_visible(post: &Post, category: Option<&Category>, now: DateTime<Utc>) -> bool {
    post.is_published && category.is_none_or(|c| c.is_published) && post.pub_date <= now
}

/// Public posts are visible to everyone; the author also sees hidden ones.
pub fn can_view_post(
    viewer: Option<Uuid>,
    post: &Post,
    category: Option<&Category>,
    now: DateTime<Utc>,
) -> bool {
    viewer.is_some_and(|id| can_modify(id, post)) || is_publicly_visible(post, category, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn published_post(author: Uuid) -> Post {
        Post::new(author, "t".into(), "x".into(), Utc::now() - Duration::days(1))
    }

    #[test]
    fn only_owner_can_modify() {
        let author = Uuid::new_v4();
        let post = published_post(author);
        let comment = Comment::new(post.id, author, "hi".into());

        assert!(can_modify(author, &post));
        assert!(can_modify(author, &comment));
        assert!(!can_modify(Uuid::new_v4(), &post));
        assert!(!can_modify(Uuid::new_v4(), &comment));
    }

    #[test]
    fn gate_requires_all_conditions() {
        let now = Utc::now();
        let mut category = Category::new("c".into(), "d".into(), "c".into());
        let post = published_post(Uuid::new_v4()).with_category(category.id);
        assert!(is_publicly_visible(&post, Some(&category), now));
        assert!(is_publicly_visible(&post, None, now));

        category.is_published = false;
        assert!(!is_publicly_visible(&post, Some(&category), now));

        let scheduled = Post {
            pub_date: now + Duration::minutes(5),
            ..published_post(Uuid::new_v4())
        };
        assert!(!is_publicly_visible(&scheduled, None, now));

        let hidden = published_post(Uuid::new_v4()).unpublished();
        assert!(!is_publicly_visible(&hidden, None, now));
    }

    #[test]
    fn author_sees_own_hidden_post() {
        let now = Utc::now();
        let author = Uuid::new_v4();
        let hidden = published_post(author).unpublished();

        assert!(can_view_post(Some(author), &hidden, None, now));
        assert!(!can_view_post(Some(Uuid::new_v4()), &hidden, None, now));
        assert!(!can_view_post(None, &hidden, None, now));
    }
}
