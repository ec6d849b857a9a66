//! In-memory store - used when no database is configured, and in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, CommentView, Location, Post, PostView, User};
use blogicum_core::error::RepoError;
use blogicum_core::pagination::Window;
use blogicum_core::ports::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
use blogicum_core::visibility::PostFilter;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    posts: HashMap<Uuid, Post>,
    categories: HashMap<Uuid, Category>,
    locations: HashMap<Uuid, Location>,
    comments: HashMap<Uuid, Comment>,
}

impl Tables {
    fn post_view(&self, post: &Post) -> Result<PostView, RepoError> {
        let author = self
            .users
            .get(&post.author_id)
            .map(User::author_ref)
            .ok_or_else(|| RepoError::Query(format!("author of post {} is missing", post.id)))?;

        Ok(PostView {
            post: post.clone(),
            author,
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

    fn matching_views(&self, filter: &PostFilter) -> Result<Vec<PostView>, RepoError> {
        let mut views = Vec::new();
        for post in self.posts.values() {
            let view = self.post_view(post)?;
            if filter.matches(&view) {
                views.push(view);
            }
        }
        views.sort_by(|a, b| {
            b.post
                .publish_at
                .cmp(&a.post.publish_at)
                .then(b.post.created_at.cmp(&a.post.created_at))
        });
        Ok(views)
    }

    fn user_conflict(&self, user: &User) -> bool {
        self.users
            .values()
            .any(|other| other.id != user.id && other.username == user.username)
    }

    fn slug_conflict(&self, category: &Category) -> bool {
        self.categories
            .values()
            .any(|other| other.id != category.id && other.slug == category.slug)
    }
}

/// Every repository over one set of `HashMap`s behind an async `RwLock`.
///
/// Enforces the same constraints as the database schema: unique usernames
/// and category slugs, and comments removed together with their post.
/// Data is lost on process restart.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Implements `BaseRepository` for one table of the store.
macro_rules! table_repository {
    ($entity:ty, $table:ident $(, conflict = $conflict:ident)?) => {
        #[async_trait]
        impl BaseRepository<$entity, Uuid> for InMemoryStore {
            async fn find_by_id(&self, id: Uuid) -> Result<Option<$entity>, RepoError> {
                let tables = self.tables.read().await;
                Ok(tables.$table.get(&id).cloned())
            }

            async fn insert(&self, entity: $entity) -> Result<$entity, RepoError> {
                let mut tables = self.tables.write().await;
                if tables.$table.contains_key(&entity.id) {
                    return Err(RepoError::Constraint("Entity already exists".to_string()));
                }
                $(
                    if tables.$conflict(&entity) {
                        return Err(RepoError::Constraint("Entity already exists".to_string()));
                    }
                )?
                tables.$table.insert(entity.id, entity.clone());
                Ok(entity)
            }

            async fn update(&self, entity: $entity) -> Result<$entity, RepoError> {
                let mut tables = self.tables.write().await;
                if !tables.$table.contains_key(&entity.id) {
                    return Err(RepoError::NotFound);
                }
                $(
                    if tables.$conflict(&entity) {
                        return Err(RepoError::Constraint("Entity already exists".to_string()));
                    }
                )?
                tables.$table.insert(entity.id, entity.clone());
                Ok(entity)
            }

            async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
                let mut tables = self.tables.write().await;
                tables.$table.remove(&id).ok_or(RepoError::NotFound)?;
                Ok(())
            }
        }
    };
}

table_repository!(User, users, conflict = user_conflict);
table_repository!(Category, categories, conflict = slug_conflict);
table_repository!(Location, locations);
table_repository!(Comment, comments);

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.posts.get(&id).cloned())
    }

    async fn insert(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.posts.contains_key(&post.id) {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }
        if !tables.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("Unknown author".to_string()));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        match tables.posts.get_mut(&post.id) {
            Some(stored) => {
                *stored = post.clone();
                Ok(post)
            }
            None => Err(RepoError::NotFound),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables.posts.remove(&id).ok_or(RepoError::NotFound)?;
        tables.comments.retain(|_, comment| comment.post_id != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn count_matching(&self, filter: &PostFilter) -> Result<u64, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.matching_views(filter)?.len() as u64)
    }

    async fn find_matching(
        &self,
        filter: &PostFilter,
        window: Window,
    ) -> Result<Vec<PostView>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .matching_views(filter)?
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect())
    }

    async fn find_view(&self, id: Uuid) -> Result<Option<PostView>, RepoError> {
        let tables = self.tables.read().await;
        tables.posts.get(&id).map(|p| tables.post_view(p)).transpose()
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let tables = self.tables.read().await;
        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

#[async_trait]
impl LocationRepository for InMemoryStore {
    async fn list_all(&self) -> Result<Vec<Location>, RepoError> {
        let tables = self.tables.read().await;
        let mut locations: Vec<Location> = tables.locations.values().cloned().collect();
        locations.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(locations)
    }
}

#[async_trait]
impl CommentRepository for InMemoryStore {
    async fn find_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError> {
        let tables = self.tables.read().await;
        let mut views = Vec::new();
        for comment in tables.comments.values().filter(|c| c.post_id == post_id) {
            let author = tables
                .users
                .get(&comment.author_id)
                .map(User::author_ref)
                .ok_or_else(|| {
                    RepoError::Query(format!("author of comment {} is missing", comment.id))
                })?;
            views.push(CommentView {
                comment: comment.clone(),
                author,
            });
        }
        views.sort_by(|a, b| a.comment.created_at.cmp(&b.comment.created_at));
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blogicum_core::visibility::PostPredicate;
    use chrono::{Duration, Utc};

    async fn store_with_author() -> (InMemoryStore, User) {
        let store = InMemoryStore::new();
        let user = User::new("jane".to_string(), "jane@example.com".to_string(), "x".to_string());
        BaseRepository::<User, Uuid>::insert(&store, user.clone())
            .await
            .unwrap();
        (store, user)
    }

    fn post(author: &User, category: &Category, hours_ago: i64) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            author_id: author.id,
            category_id: Some(category.id),
            location_id: None,
            title: format!("{hours_ago}h ago"),
            body: "text".to_string(),
            publish_at: now - Duration::hours(hours_ago),
            is_published: true,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_constraint_error() {
        let (store, _) = store_with_author().await;
        let twin = User::new("jane".to_string(), "other@example.com".to_string(), "x".to_string());

        let result = BaseRepository::<User, Uuid>::insert(&store, twin).await;
        assert!(matches!(result, Err(RepoError::Constraint(_))));
    }

    #[tokio::test]
    async fn test_matching_posts_are_newest_first_and_windowed() {
        let (store, author) = store_with_author().await;
        let news = Category::new("News", "news", true);
        BaseRepository::<Category, Uuid>::insert(&store, news.clone())
            .await
            .unwrap();
        for hours_ago in [5, 1, 3] {
            BaseRepository::<Post, Uuid>::insert(&store, post(&author, &news, hours_ago))
                .await
                .unwrap();
        }

        let filter = PostFilter::public(Utc::now()) & PostPredicate::InCategory(news.id);
        assert_eq!(store.count_matching(&filter).await.unwrap(), 3);

        let page = store
            .find_matching(&filter, Window { offset: 1, limit: 5 })
            .await
            .unwrap();
        let titles: Vec<&str> = page.iter().map(|v| v.post.title.as_str()).collect();
        assert_eq!(titles, ["3h ago", "5h ago"]);
    }

    #[tokio::test]
    async fn test_deleting_post_removes_its_comments() {
        let (store, author) = store_with_author().await;
        let news = Category::new("News", "news", true);
        let post = post(&author, &news, 1);
        BaseRepository::<Post, Uuid>::insert(&store, post.clone())
            .await
            .unwrap();
        let comment = Comment::new(post.id, author.id, "first".to_string());
        BaseRepository::<Comment, Uuid>::insert(&store, comment.clone())
            .await
            .unwrap();

        let view = store.find_view(post.id).await.unwrap().unwrap();
        assert_eq!(view.comment_count, 1);

        BaseRepository::<Post, Uuid>::delete(&store, post.id)
            .await
            .unwrap();
        let gone = BaseRepository::<Comment, Uuid>::find_by_id(&store, comment.id)
            .await
            .unwrap();
        assert!(gone.is_none());
    }
}
