//! Profile pages.

use actix_web::{HttpResponse, web};

use blogicum_core::forms::ProfileInput;
use blogicum_shared::dto::PageParams;

use super::pages;
use crate::middleware::auth::{LoginRequired, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /profile/{username}
pub async fn show(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<String>,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let page = pages::page_query(&query)?;
    let profile = state
        .blog
        .profile(viewer.user_id(), &path.into_inner(), page)
        .await?;
    Ok(pages::render(pages::PROFILE, profile))
}

/// GET /profile/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    user: LoginRequired,
) -> AppResult<HttpResponse> {
    let page = state.blog.profile_form(user.user_id()).await?;
    Ok(pages::render(pages::PROFILE_FORM, page))
}

/// POST /profile/edit
pub async fn edit(
    state: web::Data<AppState>,
    user: LoginRequired,
    form: web::Form<ProfileInput>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .update_profile(user.user_id(), form.into_inner())
        .await?;
    Ok(pages::respond(pages::PROFILE_FORM, outcome))
}
