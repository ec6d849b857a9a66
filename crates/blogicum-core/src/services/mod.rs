//! Request-level operations of the blog.
//!
//! Each operation takes the requesting identity (if any) and returns either a
//! page context to render or a [`Destination`] to redirect to. Not-found and
//! infrastructure failures are [`DomainError`]s.

mod categories;
mod comments;
mod posts;
mod profiles;

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{PostView, User};
use crate::error::DomainError;
use crate::pagination::{PAGE_SIZE, Page, PageQuery, Paginator};
use crate::ports::{
    CategoryRepository, CommentRepository, LocationRepository, PostRepository, UserRepository,
};
use crate::visibility::PostFilter;

pub use categories::CategoryPage;
pub use comments::CommentFormPage;
pub use posts::{PostDetail, PostFormPage};
pub use profiles::{ProfileFormPage, ProfilePage};

/// Where a request ends up after a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    PostDetail(Uuid),
    Profile(String),
}

impl Destination {
    pub fn path(&self) -> String {
        match self {
            Destination::PostDetail(post_id) => format!("/posts/{post_id}"),
            Destination::Profile(username) => {
                format!("/profile/{}", urlencoding::encode(username))
            }
        }
    }
}

/// Result of a page-producing operation.
#[derive(Debug, Clone)]
pub enum Outcome<T> {
    /// Render the page.
    Render(T),
    /// Render the form again with its field errors; nothing was written.
    Invalid(T),
    /// Send the requester elsewhere.
    Redirect(Destination),
}

impl<T> Outcome<T> {
    pub fn redirect(&self) -> Option<&Destination> {
        match self {
            Outcome::Redirect(destination) => Some(destination),
            _ => None,
        }
    }

    pub fn page(&self) -> Option<&T> {
        match self {
            Outcome::Render(page) | Outcome::Invalid(page) => Some(page),
            Outcome::Redirect(_) => None,
        }
    }
}

/// What a form page is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    Create,
    Edit,
    Delete,
}

/// The repositories the blog operates on.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub categories: Arc<dyn CategoryRepository>,
    pub locations: Arc<dyn LocationRepository>,
    pub comments: Arc<dyn CommentRepository>,
}

impl Repositories {
    /// Use one backing store for every repository.
    pub fn from_store<S>(store: Arc<S>) -> Self
    where
        S: UserRepository
            + PostRepository
            + CategoryRepository
            + LocationRepository
            + CommentRepository
            + 'static,
    {
        Self {
            users: store.clone(),
            posts: store.clone(),
            categories: store.clone(),
            locations: store.clone(),
            comments: store,
        }
    }
}

/// The blog's operations over a set of repositories.
#[derive(Clone)]
pub struct BlogService {
    repos: Repositories,
}

impl BlogService {
    pub fn new(repos: Repositories) -> Self {
        Self { repos }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }

    /// Resolve a page of posts matching `filter`.
    async fn paginate(
        &self,
        filter: &PostFilter,
        query: PageQuery,
    ) -> Result<Page<PostView>, DomainError> {
        let total = self.repos.posts.count_matching(filter).await?;
        let paginator = Paginator::new(total, PAGE_SIZE);
        let number = paginator.resolve(query)?;
        let items = self
            .repos
            .posts
            .find_matching(filter, paginator.window(number))
            .await?;
        Ok(paginator.page(number, items))
    }

    /// The requester's own user record. A token for a vanished user is unauthorized.
    async fn require_user(&self, user_id: Uuid) -> Result<User, DomainError> {
        self.repos
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(DomainError::Unauthorized)
    }
}
