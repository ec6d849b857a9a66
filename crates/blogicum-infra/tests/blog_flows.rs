//! End-to-end request flows of `BlogService` over the in-memory store.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use blogicum_core::domain::{Category, Comment, Location, Post, User};
use blogicum_core::error::DomainError;
use blogicum_core::forms::{CommentInput, PostInput, ProfileInput};
use blogicum_core::pagination::PageQuery;
use blogicum_core::ports::BaseRepository;
use blogicum_core::{BlogService, Destination, Outcome, Repositories};
use blogicum_infra::InMemoryStore;

struct Fixture {
    store: Arc<InMemoryStore>,
    blog: BlogService,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        let blog = BlogService::new(Repositories::from_store(store.clone()));
        Self { store, blog }
    }

    async fn user(&self, username: &str) -> User {
        let user = User::new(
            username.to_string(),
            format!("{username}@example.com"),
            "hash".to_string(),
        );
        BaseRepository::<User, Uuid>::insert(self.store.as_ref(), user)
            .await
            .unwrap()
    }

    async fn category(&self, slug: &str, is_published: bool) -> Category {
        let category = Category::new(slug.to_uppercase(), slug, is_published);
        BaseRepository::<Category, Uuid>::insert(self.store.as_ref(), category)
            .await
            .unwrap()
    }

    /// A post whose publish date is `offset` away from now.
    async fn post(
        &self,
        author: &User,
        category: &Category,
        title: &str,
        is_published: bool,
        offset: Duration,
    ) -> Post {
        let post = Post {
            id: Uuid::new_v4(),
            author_id: author.id,
            category_id: Some(category.id),
            location_id: None,
            title: title.to_string(),
            body: format!("{title} body"),
            publish_at: Utc::now() + offset,
            is_published,
            created_at: Utc::now(),
        };
        BaseRepository::<Post, Uuid>::insert(self.store.as_ref(), post)
            .await
            .unwrap()
    }

    async fn comment(&self, post: &Post, author: &User, body: &str) -> Comment {
        let comment = Comment::new(post.id, author.id, body.to_string());
        BaseRepository::<Comment, Uuid>::insert(self.store.as_ref(), comment)
            .await
            .unwrap()
    }
}

fn titles(items: &[blogicum_core::domain::PostView]) -> Vec<&str> {
    items.iter().map(|v| v.post.title.as_str()).collect()
}

fn post_input(category: &Category) -> PostInput {
    PostInput {
        title: "Fresh".to_string(),
        body: "Straight from the form".to_string(),
        publish_at: "2024-03-01T12:00".to_string(),
        category: category.id.to_string(),
        location: String::new(),
        is_published: Some("on".to_string()),
    }
}

/// Published news category with one post of each hidden kind next to a public one.
async fn news_scenario(fx: &Fixture) -> (User, Category) {
    let author = fx.user("reporter").await;
    let news = fx.category("news", true).await;
    let drafts = fx.category("drafts", false).await;

    fx.post(&author, &news, "public", true, -Duration::hours(1)).await;
    fx.post(&author, &news, "unpublished", false, -Duration::hours(2)).await;
    fx.post(&author, &news, "scheduled", true, Duration::days(1)).await;
    fx.post(&author, &drafts, "hidden category", true, -Duration::hours(3)).await;

    (author, news)
}

#[tokio::test]
async fn test_anonymous_feeds_show_only_public_posts() {
    let fx = Fixture::new();
    let (_, news) = news_scenario(&fx).await;

    let home = fx.blog.post_list(None, PageQuery::First).await.unwrap();
    assert_eq!(titles(&home.items), ["public"]);
    assert_eq!(home.total, 1);

    let feed = fx
        .blog
        .category_posts(None, &news.slug, PageQuery::First)
        .await
        .unwrap();
    assert_eq!(titles(&feed.page.items), ["public"]);
}

#[tokio::test]
async fn test_author_sees_own_hidden_posts() {
    let fx = Fixture::new();
    let (author, news) = news_scenario(&fx).await;

    let home = fx
        .blog
        .post_list(Some(author.id), PageQuery::First)
        .await
        .unwrap();
    assert_eq!(
        titles(&home.items),
        ["scheduled", "public", "unpublished", "hidden category"]
    );

    let feed = fx
        .blog
        .category_posts(Some(author.id), &news.slug, PageQuery::First)
        .await
        .unwrap();
    assert_eq!(titles(&feed.page.items), ["scheduled", "public", "unpublished"]);

    let scheduled = fx.post(&author, &news, "tomorrow", true, Duration::days(1)).await;
    let detail = fx
        .blog
        .post_detail(Some(author.id), scheduled.id)
        .await
        .unwrap();
    assert_eq!(detail.post.post.title, "tomorrow");

    let stranger = fx.user("stranger").await;
    let feed = fx
        .blog
        .category_posts(Some(stranger.id), &news.slug, PageQuery::First)
        .await
        .unwrap();
    assert_eq!(titles(&feed.page.items), ["public"]);

    let hidden = fx.blog.post_detail(Some(stranger.id), scheduled.id).await;
    assert!(matches!(hidden, Err(DomainError::NotFound { .. })));
    assert!(fx.blog.post_detail(None, scheduled.id).await.is_err());
}

#[tokio::test]
async fn test_post_with_location_in_described_category() {
    let fx = Fixture::new();
    let author = fx.user("traveller").await;
    let travel = Category::new("Travel", "travel", true).with_description("Trips and places");
    let travel = BaseRepository::<Category, Uuid>::insert(fx.store.as_ref(), travel)
        .await
        .unwrap();
    let old_town = BaseRepository::<Location, Uuid>::insert(
        fx.store.as_ref(),
        Location::new("Old Town"),
    )
    .await
    .unwrap();

    let form = fx.blog.new_post_form().await.unwrap();
    assert_eq!(form.locations, [old_town.clone()]);

    let input = PostInput {
        location: old_town.id.to_string(),
        ..post_input(&travel)
    };
    let outcome = fx.blog.create_post(author.id, input).await.unwrap();
    assert!(outcome.redirect().is_some());

    let feed = fx
        .blog
        .category_posts(None, "travel", PageQuery::First)
        .await
        .unwrap();
    assert_eq!(feed.category.description, "Trips and places");
    assert_eq!(feed.page.items.len(), 1);
    assert_eq!(feed.page.items[0].location.as_ref(), Some(&old_town));
}

#[tokio::test]
async fn test_listing_carries_comment_count() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let reader = fx.user("reader").await;
    let news = fx.category("news", true).await;
    let post = fx.post(&author, &news, "popular", true, -Duration::hours(1)).await;

    for body in ["first", "second", "third"] {
        fx.comment(&post, &reader, body).await;
    }

    let home = fx.blog.post_list(None, PageQuery::First).await.unwrap();
    assert_eq!(home.items[0].comment_count, 3);

    let detail = fx.blog.post_detail(None, post.id).await.unwrap();
    let bodies: Vec<&str> = detail
        .comments
        .iter()
        .map(|c| c.comment.body.as_str())
        .collect();
    assert_eq!(bodies, ["first", "second", "third"]);
}

#[tokio::test]
async fn test_stranger_cannot_edit_or_delete_comment() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let stranger = fx.user("stranger").await;
    let news = fx.category("news", true).await;
    let post = fx.post(&author, &news, "post", true, -Duration::hours(1)).await;
    let comment = fx.comment(&post, &author, "original").await;

    let outcome = fx
        .blog
        .update_comment(
            stranger.id,
            post.id,
            comment.id,
            CommentInput {
                body: "vandalised".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.redirect(), Some(&Destination::PostDetail(post.id)));

    let destination = fx
        .blog
        .delete_comment(stranger.id, post.id, comment.id)
        .await
        .unwrap();
    assert_eq!(destination, Destination::PostDetail(post.id));

    let stored = BaseRepository::<Comment, Uuid>::find_by_id(fx.store.as_ref(), comment.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.body, "original");
}

#[tokio::test]
async fn test_comment_through_wrong_post_is_not_found() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let news = fx.category("news", true).await;
    let post = fx.post(&author, &news, "one", true, -Duration::hours(1)).await;
    let other = fx.post(&author, &news, "two", true, -Duration::hours(2)).await;
    let comment = fx.comment(&post, &author, "hello").await;

    let result = fx
        .blog
        .edit_comment_form(author.id, other.id, comment.id)
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_owner_edits_comment() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let news = fx.category("news", true).await;
    let post = fx.post(&author, &news, "post", true, -Duration::hours(1)).await;
    let comment = fx.comment(&post, &author, "typo").await;

    let outcome = fx
        .blog
        .update_comment(
            author.id,
            post.id,
            comment.id,
            CommentInput {
                body: "fixed".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.redirect(), Some(&Destination::PostDetail(post.id)));

    let detail = fx.blog.post_detail(None, post.id).await.unwrap();
    assert_eq!(detail.comments[0].comment.body, "fixed");
}

#[tokio::test]
async fn test_comment_on_hidden_post_is_not_found() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let reader = fx.user("reader").await;
    let news = fx.category("news", true).await;
    let draft = fx.post(&author, &news, "draft", false, -Duration::hours(1)).await;

    let result = fx
        .blog
        .create_comment(
            reader.id,
            draft.id,
            CommentInput {
                body: "first!".to_string(),
            },
        )
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_create_post_redirects_to_profile() {
    let fx = Fixture::new();
    let author = fx.user("writer").await;
    let news = fx.category("news", true).await;

    let outcome = fx
        .blog
        .create_post(author.id, post_input(&news))
        .await
        .unwrap();
    assert_eq!(
        outcome.redirect(),
        Some(&Destination::Profile("writer".to_string()))
    );

    let profile = fx
        .blog
        .profile(Some(author.id), "writer", PageQuery::First)
        .await
        .unwrap();
    assert_eq!(titles(&profile.page.items), ["Fresh"]);
    assert_eq!(profile.page.items[0].author.username, "writer");
}

#[tokio::test]
async fn test_invalid_post_form_is_rerendered() {
    let fx = Fixture::new();
    let author = fx.user("writer").await;
    let news = fx.category("news", true).await;

    let mut input = post_input(&news);
    input.title = String::new();
    input.category = Uuid::new_v4().to_string();

    let outcome = fx.blog.create_post(author.id, input).await.unwrap();
    let Outcome::Invalid(page) = outcome else {
        panic!("expected the form to be rejected");
    };
    assert!(page.errors.get("title").is_some());
    assert_eq!(page.categories.len(), 1);

    let mut input = post_input(&news);
    input.category = Uuid::new_v4().to_string();
    let outcome = fx.blog.create_post(author.id, input).await.unwrap();
    let page = outcome.page().unwrap();
    assert!(page.errors.get("category").is_some());

    let home = fx
        .blog
        .post_list(Some(author.id), PageQuery::First)
        .await
        .unwrap();
    assert!(home.items.is_empty());
}

#[tokio::test]
async fn test_post_edit_and_delete_by_owner_only() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let stranger = fx.user("stranger").await;
    let news = fx.category("news", true).await;
    let post = fx.post(&author, &news, "mine", true, -Duration::hours(1)).await;
    fx.comment(&post, &stranger, "nice").await;

    let outcome = fx
        .blog
        .update_post(stranger.id, post.id, post_input(&news))
        .await
        .unwrap();
    assert_eq!(outcome.redirect(), Some(&Destination::PostDetail(post.id)));
    let bounce = fx.blog.delete_post(stranger.id, post.id).await.unwrap();
    assert_eq!(bounce, Destination::PostDetail(post.id));

    let outcome = fx
        .blog
        .update_post(author.id, post.id, post_input(&news))
        .await
        .unwrap();
    assert_eq!(outcome.redirect(), Some(&Destination::PostDetail(post.id)));
    let detail = fx.blog.post_detail(None, post.id).await.unwrap();
    assert_eq!(detail.post.post.title, "Fresh");

    let destination = fx.blog.delete_post(author.id, post.id).await.unwrap();
    assert_eq!(destination, Destination::Profile("author".to_string()));
    assert!(fx.blog.post_detail(Some(author.id), post.id).await.is_err());
}

#[tokio::test]
async fn test_unpublished_category_is_not_found() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let drafts = fx.category("drafts", false).await;
    fx.post(&author, &drafts, "post", true, -Duration::hours(1)).await;

    let result = fx
        .blog
        .category_posts(Some(author.id), "drafts", PageQuery::First)
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));

    let result = fx
        .blog
        .category_posts(None, "missing", PageQuery::First)
        .await;
    assert!(matches!(result, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_profile_self_view_and_other_view() {
    let fx = Fixture::new();
    let (author, news) = news_scenario(&fx).await;
    let other = fx.user("other").await;
    fx.post(&other, &news, "not mine", true, -Duration::hours(1)).await;

    let own = fx
        .blog
        .profile(Some(author.id), "reporter", PageQuery::First)
        .await
        .unwrap();
    assert!(own.is_owner);
    assert_eq!(own.page.total, 4);

    let seen = fx
        .blog
        .profile(Some(other.id), "reporter", PageQuery::First)
        .await
        .unwrap();
    assert!(!seen.is_owner);
    assert_eq!(titles(&seen.page.items), ["public"]);

    let missing = fx.blog.profile(None, "nobody", PageQuery::First).await;
    assert!(matches!(missing, Err(DomainError::NotFound { .. })));
}

#[tokio::test]
async fn test_profile_update_rejects_taken_username() {
    let fx = Fixture::new();
    let jane = fx.user("jane").await;
    fx.user("john").await;

    let outcome = fx
        .blog
        .update_profile(
            jane.id,
            ProfileInput {
                username: "john".to_string(),
                email: "jane@example.com".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let page = outcome.page().unwrap();
    assert!(page.errors.get("username").is_some());

    let outcome = fx
        .blog
        .update_profile(
            jane.id,
            ProfileInput {
                username: "jane_doe".to_string(),
                first_name: "Jane".to_string(),
                last_name: "Doe".to_string(),
                email: "jane@example.com".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(
        outcome.redirect(),
        Some(&Destination::Profile("jane_doe".to_string()))
    );

    let profile = fx
        .blog
        .profile(None, "jane_doe", PageQuery::First)
        .await
        .unwrap();
    assert_eq!(profile.profile.full_name(), "Jane Doe");
}

#[tokio::test]
async fn test_pagination_over_home_feed() {
    let fx = Fixture::new();
    let author = fx.user("author").await;
    let news = fx.category("news", true).await;
    for i in 0..25 {
        fx.post(
            &author,
            &news,
            &format!("post {i:02}"),
            true,
            -Duration::minutes(i + 1),
        )
        .await;
    }

    let first = fx.blog.post_list(None, PageQuery::First).await.unwrap();
    assert_eq!(first.items.len(), 10);
    assert_eq!(first.num_pages, 3);
    assert_eq!(first.items[0].post.title, "post 00");

    let last = fx.blog.post_list(None, PageQuery::Last).await.unwrap();
    assert_eq!(last.number, 3);
    assert_eq!(last.items.len(), 5);
    assert_eq!(last.items[4].post.title, "post 24");

    let beyond = fx.blog.post_list(None, PageQuery::Number(4)).await;
    assert!(matches!(beyond, Err(DomainError::NotFound { .. })));
}
