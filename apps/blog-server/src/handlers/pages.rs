//! Turning operation results into HTTP responses.

use actix_web::{HttpResponse, http::header};
use serde::Serialize;

use blogicum_core::pagination::PageQuery;
use blogicum_core::{Destination, Outcome};
use blogicum_shared::PageResponse;
use blogicum_shared::dto::PageParams;

use crate::middleware::error::AppResult;

pub const INDEX: &str = "blog/index.html";
pub const DETAIL: &str = "blog/detail.html";
pub const POST_FORM: &str = "blog/create.html";
pub const COMMENT_FORM: &str = "blog/comment.html";
pub const PROFILE: &str = "blog/profile.html";
pub const PROFILE_FORM: &str = "blog/user.html";
pub const CATEGORY: &str = "blog/category.html";
pub const LOGIN: &str = "registration/login.html";

pub fn render<T: Serialize>(template: &str, context: T) -> HttpResponse {
    HttpResponse::Ok().json(PageResponse::new(template, context))
}

pub fn redirect(destination: &Destination) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, destination.path()))
        .finish()
}

/// Render, re-render with errors (422) or redirect.
pub fn respond<T: Serialize>(template: &str, outcome: Outcome<T>) -> HttpResponse {
    match outcome {
        Outcome::Render(context) => render(template, context),
        Outcome::Invalid(context) => {
            HttpResponse::UnprocessableEntity().json(PageResponse::new(template, context))
        }
        Outcome::Redirect(destination) => redirect(&destination),
    }
}

pub fn page_query(params: &PageParams) -> AppResult<PageQuery> {
    Ok(PageQuery::parse(params.page.as_deref())?)
}
