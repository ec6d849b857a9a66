//! Comment forms, always addressed through their post.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogicum_core::forms::CommentInput;

use super::pages;
use crate::middleware::auth::LoginRequired;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /posts/{post_id}/comment
pub async fn create_form(
    state: web::Data<AppState>,
    user: LoginRequired,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let page = state
        .blog
        .new_comment_form(user.user_id(), path.into_inner())
        .await?;
    Ok(pages::render(pages::COMMENT_FORM, page))
}

/// POST /posts/{post_id}/comment
pub async fn create(
    state: web::Data<AppState>,
    user: LoginRequired,
    path: web::Path<Uuid>,
    form: web::Form<CommentInput>,
) -> AppResult<HttpResponse> {
    let outcome = state
        .blog
        .create_comment(user.user_id(), path.into_inner(), form.into_inner())
        .await?;
    Ok(pages::respond(pages::COMMENT_FORM, outcome))
}

/// GET /posts/{post_id}/comment/{comment_id}/edit
pub async fn edit_form(
    state: web::Data<AppState>,
    user: LoginRequired,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let outcome = state
        .blog
        .edit_comment_form(user.user_id(), post_id, comment_id)
        .await?;
    Ok(pages::respond(pages::COMMENT_FORM, outcome))
}

/// POST /posts/{post_id}/comment/{comment_id}/edit
pub async fn edit(
    state: web::Data<AppState>,
    user: LoginRequired,
    path: web::Path<(Uuid, Uuid)>,
    form: web::Form<CommentInput>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let outcome = state
        .blog
        .update_comment(user.user_id(), post_id, comment_id, form.into_inner())
        .await?;
    Ok(pages::respond(pages::COMMENT_FORM, outcome))
}

/// GET /posts/{post_id}/comment/{comment_id}/delete
pub async fn delete_form(
    state: web::Data<AppState>,
    user: LoginRequired,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let outcome = state
        .blog
        .delete_comment_form(user.user_id(), post_id, comment_id)
        .await?;
    Ok(pages::respond(pages::COMMENT_FORM, outcome))
}

/// POST /posts/{post_id}/comment/{comment_id}/delete
pub async fn delete(
    state: web::Data<AppState>,
    user: LoginRequired,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();
    let destination = state
        .blog
        .delete_comment(user.user_id(), post_id, comment_id)
        .await?;
    Ok(pages::redirect(&destination))
}
