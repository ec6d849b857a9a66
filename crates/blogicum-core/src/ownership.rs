//! Ownership guard for mutating requests.
//!
//! A requester who is not the author of a post or comment is not shown an
//! error: the guard yields the page they should be bounced back to.

use uuid::Uuid;

use crate::domain::{Comment, Post, PostView};
use crate::services::Destination;

/// Anything with a recorded author.
pub trait Authored {
    fn author_id(&self) -> Uuid;
}

impl Authored for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

impl Authored for PostView {
    fn author_id(&self) -> Uuid {
        self.post.author_id
    }
}

impl Authored for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

pub fn is_owner<R: Authored + ?Sized>(requester: Uuid, resource: &R) -> bool {
    resource.author_id() == requester
}

/// Passes when `requester` authored `resource`, otherwise returns `bounce`.
pub fn ensure_owner<R: Authored + ?Sized>(
    requester: Uuid,
    resource: &R,
    bounce: Destination,
) -> Result<(), Destination> {
    if is_owner(requester, resource) {
        Ok(())
    } else {
        Err(bounce)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_passes() {
        let author = Uuid::new_v4();
        let comment = Comment::new(Uuid::new_v4(), author, "hi".to_string());
        let bounce = Destination::PostDetail(comment.post_id);

        assert!(ensure_owner(author, &comment, bounce).is_ok());
    }

    #[test]
    fn test_stranger_is_bounced_to_post() {
        let comment = Comment::new(Uuid::new_v4(), Uuid::new_v4(), "hi".to_string());
        let bounce = Destination::PostDetail(comment.post_id);

        let result = ensure_owner(Uuid::new_v4(), &comment, bounce.clone());
        assert_eq!(result, Err(bounce));
    }
}
