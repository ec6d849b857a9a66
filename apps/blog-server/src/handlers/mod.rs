//! HTTP handlers and route configuration.

mod auth;
mod category;
mod comments;
mod health;
mod pages;
mod posts;
mod profile;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(posts::index))
        .route("/health", web::get().to(health::health_check))
        // Auth routes
        .service(
            web::scope("/auth")
                .route("/register", web::post().to(auth::register))
                .service(
                    web::resource("/login")
                        .route(web::get().to(auth::login_page))
                        .route(web::post().to(auth::login)),
                )
                .route("/me", web::get().to(auth::me)),
        )
        // Posts; the literal `create` segment must precede `{post_id}`
        .service(
            web::resource("/posts/create")
                .route(web::get().to(posts::create_form))
                .route(web::post().to(posts::create)),
        )
        .route("/posts/{post_id}", web::get().to(posts::detail))
        .service(
            web::resource("/posts/{post_id}/edit")
                .route(web::get().to(posts::edit_form))
                .route(web::post().to(posts::edit)),
        )
        .service(
            web::resource("/posts/{post_id}/delete")
                .route(web::get().to(posts::delete_form))
                .route(web::post().to(posts::delete)),
        )
        // Comments
        .service(
            web::resource("/posts/{post_id}/comment")
                .route(web::get().to(comments::create_form))
                .route(web::post().to(comments::create)),
        )
        .service(
            web::resource("/posts/{post_id}/comment/{comment_id}/edit")
                .route(web::get().to(comments::edit_form))
                .route(web::post().to(comments::edit)),
        )
        .service(
            web::resource("/posts/{post_id}/comment/{comment_id}/delete")
                .route(web::get().to(comments::delete_form))
                .route(web::post().to(comments::delete)),
        )
        // Profiles; `edit` before `{username}`
        .service(
            web::resource("/profile/edit")
                .route(web::get().to(profile::edit_form))
                .route(web::post().to(profile::edit)),
        )
        .route("/profile/{username}", web::get().to(profile::show))
        .route("/category/{slug}", web::get().to(category::show));
}
