//! HTTP handlers and route configuration.

mod health;
mod posts;

#[cfg(test)]
mod tests;

use actix_web::web;

/// Configure all application routes.
///
/// Fixed paths come before the `/{username}/...` patterns they would otherwise
/// be captured by.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/api/health", web::get().to(health::health_check))
        .route("/", web::get().to(posts::index))
        .service(
            web::resource("/new/")
                .route(web::get().to(posts::new_post_form))
                .route(web::post().to(posts::new_post)),
        )
        .route("/group/{slug}/", web::get().to(posts::group_posts))
        .route("/{username}/", web::get().to(posts::profile))
        .route("/{username}/{post_id}/", web::get().to(posts::post_view))
        .service(
            web::resource("/{username}/{post_id}/edit/")
                .route(web::get().to(posts::post_edit_form))
                .route(web::post().to(posts::post_edit)),
        );
}
