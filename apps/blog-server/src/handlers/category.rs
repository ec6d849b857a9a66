use actix_web::{HttpResponse, web};

use blogicum_shared::dto::PageParams;

use super::pages;
use crate::middleware::auth::OptionalIdentity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /category/{slug}
pub async fn show(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let page = pages::page_query(&query)?;
    let feed = state
        .blog
        .category_posts(viewer.user_id(), &path.into_inner(), page)
        .await?;
    Ok(pages::render(pages::CATEGORY, feed))
}
