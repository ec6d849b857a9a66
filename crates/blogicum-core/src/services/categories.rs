use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use super::BlogService;
use crate::domain::{Category, PostView};
use crate::error::DomainError;
use crate::pagination::{Page, PageQuery};
use crate::visibility::{PostFilter, PostPredicate};

/// Context of a category feed.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryPage {
    pub category: Category,
    pub page: Page<PostView>,
}

impl BlogService {
    /// Feed of a published category. Unpublished or unknown slugs are not found.
    pub async fn category_posts(
        &self,
        viewer: Option<Uuid>,
        slug: &str,
        page: PageQuery,
    ) -> Result<CategoryPage, DomainError> {
        let category = self
            .repos
            .categories
            .find_by_slug(slug)
            .await?
            .filter(|category| category.is_published)
            .ok_or_else(|| DomainError::not_found("category", slug))?;

        let filter =
            PostFilter::visible_to(viewer, Utc::now()) & PostPredicate::InCategory(category.id);
        let page = self.paginate(&filter, page).await?;
        Ok(CategoryPage { category, page })
    }
}
