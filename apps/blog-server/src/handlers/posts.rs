//! Post pages: feed, detail and the create/edit/delete forms.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::forms::PostInput;
use blogicum_shared::dto::PageParams;

use super::pages;
use crate::middleware::auth::{LoginRequired, OptionalIdentity};
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /
pub async fn index(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    query: web::Query<PageParams>,
) -> AppResult<HttpResponse> {
    let page = pages::page_query(&query)?;
    let posts = state.blog.post_list(viewer.user_id(), page).await?;
    Ok(pages::render(pages::INDEX, posts))
}

/// GET /posts/{post_id}
pub async fn detail(
    state: web::Data<AppState>,
    viewer: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let detail = state
        .blog
        .post_detail(viewer.user_id(), path.into_inner())
        .await?;
    Ok(pages::render(pages::DETAIL, detail))
}

/// GET /posts/create
pub async fn create_form(
    state: web::Data<AppState>,
    _user: LoginRequired,
) -> AppResult<HttpResponse> {
    let page = state.blog.new_post_form().await?;
    Ok(pages::render(pages::POST_FORM, page))
}

/// POST /posts/create
pub async fn create(
    state: web::Data<AppState>,
    user: LoginRequired,
    form: web::Form<PostInput>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .create_post(user.user_id(), form.into_inner())
        .await?;
    if outcome.redirect().is_some() {
        tracing::info!(author = %user.0.username, "Post created");
    }
    Ok(pages::respond(pages::POST_FORM, outcome))
}

/// GET /posts/{post_id}/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    user: LoginRequired,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .edit_post_form(user.user_id(), path.into_inner())
        .await?;
    Ok(pages::respond(pages::POST_FORM, outcome))
}

/// POST /posts/{post_id}/edit
pub async fn edit(
    state: web::Data<AppState>,
    user: LoginRequired,
    path: web::Path<Uuid>,
    form: web::Form<PostInput>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .update_post(user.user_id(), path.into_inner(), form.into_inner())
        .await?;
    Ok(pages::respond(pages::POST_FORM, outcome))
}

/// GET /posts/{post_id}/delete
pub async fn delete_form(
    state: web::Data<AppState>,
    user: LoginRequired,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .delete_post_form(user.user_id(), path.into_inner())
        .await?;
    Ok(pages::respond(pages::POST_FORM, outcome))
}

/// POST /posts/{post_id}/delete
pub async fn delete(
    state: web::Data<AppState>,
    user: LoginRequired,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post_id = path.into_inner();
    let destination = state.blog.delete_post(user.user_id(), post_id).await?;
    tracing::info!(post_id = %post_id, to = %destination.path(), "Post delete handled");
    Ok(pages::redirect(&destination))
}
