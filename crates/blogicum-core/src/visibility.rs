//! Post visibility rules.
//!
//! Listings and detail pages never query "all posts": they build a
//! [`PostFilter`], a conjunction of [`PostPredicate`]s, and hand it to the
//! repository. The in-memory store evaluates it with [`PostFilter::matches`];
//! the PostgreSQL adapter translates it into a SQL condition.

use std::ops::BitAnd;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::PostView;

/// A single condition a post must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum PostPredicate {
    /// The post's own published flag is set.
    Published,
    /// The post has a category and that category is published.
    CategoryPublished,
    /// The publish date is not after the given instant.
    PublishedBy(DateTime<Utc>),
    /// The post was written by the given user.
    AuthoredBy(Uuid),
    /// The post belongs to the given category.
    InCategory(Uuid),
    /// At least one of the nested filters matches.
    AnyOf(Vec<PostFilter>),
}

impl PostPredicate {
    pub fn matches(&self, view: &PostView) -> bool {
        let post = &view.post;
        match self {
            PostPredicate::Published => post.is_published,
            PostPredicate::CategoryPublished => {
                view.category.as_ref().is_some_and(|c| c.is_published)
            }
            PostPredicate::PublishedBy(now) => post.publish_at <= *now,
            PostPredicate::AuthoredBy(user_id) => post.author_id == *user_id,
            PostPredicate::InCategory(category_id) => post.category_id == Some(*category_id),
            PostPredicate::AnyOf(filters) => filters.iter().any(|f| f.matches(view)),
        }
    }
}

/// Conjunction of predicates. The empty filter matches every post.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    predicates: Vec<PostPredicate>,
}

impl PostFilter {
    /// Filter that matches everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Posts any visitor may see at `now`.
    pub fn public(now: DateTime<Utc>) -> Self {
        Self::all()
            .and(PostPredicate::Published)
            .and(PostPredicate::CategoryPublished)
            .and(PostPredicate::PublishedBy(now))
    }

    /// Posts visible to `viewer`: everything they wrote plus the public set.
    pub fn visible_to(viewer: Option<Uuid>, now: DateTime<Utc>) -> Self {
        match viewer {
            None => Self::public(now),
            Some(user_id) => Self::all().and(PostPredicate::AnyOf(vec![
                Self::all().and(PostPredicate::AuthoredBy(user_id)),
                Self::public(now),
            ])),
        }
    }

    pub fn and(mut self, predicate: PostPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[PostPredicate] {
        &self.predicates
    }

    pub fn matches(&self, view: &PostView) -> bool {
        self.predicates.iter().all(|p| p.matches(view))
    }
}

impl BitAnd for PostFilter {
    type Output = PostFilter;

    fn bitand(mut self, rhs: PostFilter) -> PostFilter {
        self.predicates.extend(rhs.predicates);
        self
    }
}

impl BitAnd<PostPredicate> for PostFilter {
    type Output = PostFilter;

    fn bitand(self, rhs: PostPredicate) -> PostFilter {
        self.and(rhs)
    }
}

/// Whether `viewer` may see `view` at `now`.
pub fn is_visible(view: &PostView, viewer: Option<Uuid>, now: DateTime<Utc>) -> bool {
    PostFilter::visible_to(viewer, now).matches(view)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AuthorRef, Category, Post};
    use chrono::Duration;

    fn view(is_published: bool, category_published: Option<bool>, offset: Duration) -> PostView {
        let author = Uuid::new_v4();
        let category = category_published.map(|p| Category::new("News", "news", p));
        let now = Utc::now();
        PostView {
            post: Post {
                id: Uuid::new_v4(),
                author_id: author,
                category_id: category.as_ref().map(|c| c.id),
                location_id: None,
                title: "Title".to_string(),
                body: "Body".to_string(),
                publish_at: now + offset,
                is_published,
                created_at: now,
            },
            author: AuthorRef {
                id: author,
                username: "author".to_string(),
            },
            category,
            location: None,
            comment_count: 0,
        }
    }

    #[test]
    fn test_public_requires_all_three_conditions() {
        let now = Utc::now();
        let past = -Duration::hours(1);
        let future = Duration::hours(1);

        for is_published in [false, true] {
            for category in [None, Some(false), Some(true)] {
                for offset in [past, future] {
                    let post = view(is_published, category, offset);
                    let expected = is_published && category == Some(true) && offset == past;
                    assert_eq!(is_visible(&post, None, now), expected);
                    assert_eq!(is_visible(&post, Some(Uuid::new_v4()), now), expected);
                }
            }
        }
    }

    #[test]
    fn test_author_always_sees_own_post() {
        let now = Utc::now();
        let post = view(false, Some(false), Duration::days(3));
        assert!(is_visible(&post, Some(post.post.author_id), now));
        assert!(!is_visible(&post, None, now));
    }

    #[test]
    fn test_publish_at_boundary_is_inclusive() {
        let post = view(true, Some(true), Duration::zero());
        assert!(PostFilter::public(post.post.publish_at).matches(&post));
    }

    #[test]
    fn test_filters_combine_with_and() {
        let now = Utc::now();
        let post = view(true, Some(true), -Duration::hours(1));
        let category_id = post.post.category_id.unwrap();

        let in_category = PostFilter::public(now) & PostPredicate::InCategory(category_id);
        assert!(in_category.matches(&post));

        let elsewhere = PostFilter::public(now) & PostPredicate::InCategory(Uuid::new_v4());
        assert!(!elsewhere.matches(&post));

        let combined = PostFilter::all().and(PostPredicate::AuthoredBy(post.author.id))
            & PostFilter::public(now);
        assert_eq!(combined.predicates().len(), 4);
        assert!(combined.matches(&post));
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let post = view(false, None, Duration::days(1));
        assert!(PostFilter::all().matches(&post));
    }
}
