use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Category, Location};
use crate::forms::PostDraft;

/// Post entity - a blog entry written by a single author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub title: String,
    pub body: String,
    /// Moment the post becomes public, provided the flags allow it.
    pub publish_at: DateTime<Utc>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post owned by `author_id`.
    pub fn new(author_id: Uuid, draft: PostDraft) -> Self {
        let mut post = Self {
            id: Uuid::new_v4(),
            author_id,
            category_id: None,
            location_id: None,
            title: String::new(),
            body: String::new(),
            publish_at: draft.publish_at,
            is_published: false,
            created_at: Utc::now(),
        };
        post.apply(draft);
        post
    }

    /// Overwrite the editable fields. Author and creation time never change.
    pub fn apply(&mut self, draft: PostDraft) {
        self.title = draft.title;
        self.body = draft.body;
        self.publish_at = draft.publish_at;
        self.category_id = Some(draft.category_id);
        self.location_id = draft.location_id;
        self.is_published = draft.is_published;
    }
}

/// Public reference to the author of a post or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorRef {
    pub id: Uuid,
    pub username: String,
}

/// A post joined with its author, category, location and comment count.
///
/// This is what listings and the detail page render, and what the visibility
/// filter is evaluated against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorRef,
    pub category: Option<Category>,
    pub location: Option<Location>,
    pub comment_count: u64,
}
