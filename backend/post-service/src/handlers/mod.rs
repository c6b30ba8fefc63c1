/// HTTP request handlers and route table
pub mod auth;
pub mod health;
pub mod media;
pub mod multipart;
pub mod posts;
pub mod reactions;
pub mod users;

pub use multipart::UploadLimits;

use crate::error::AppError;
use crate::middleware::JwtAuthMiddleware;
use crate::services::AppServices;
use actix_web::{guard, web};

/// Malformed JSON bodies answer 400 in the usual error shape
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// A path id that is not a UUID answers 400 instead of 404
fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err, _req| AppError::BadRequest(format!("invalid path parameter: {err}")).into())
}

/// Register services, extractor configs and every route.
///
/// Public: `/`, `/health`, `/auth/sign-up`, `/auth/sign-in`, `GET /users`.
/// Everything else requires a bearer token.
pub fn configure(cfg: &mut web::ServiceConfig, services: &AppServices, limits: UploadLimits) {
    let auth = JwtAuthMiddleware::new(services.resolver.clone());

    cfg.app_data(web::Data::new(services.users.clone()))
        .app_data(web::Data::new(services.posts.clone()))
        .app_data(web::Data::new(services.reactions.clone()))
        .app_data(web::Data::from(services.media.clone()))
        .app_data(web::Data::new(limits))
        .app_data(json_config())
        .app_data(path_config())
        .route("/", web::get().to(health::index))
        .route("/health", web::get().to(health::health))
        .service(
            web::scope("/auth")
                .route("/sign-up", web::post().to(auth::sign_up))
                .route("/sign-in", web::post().to(auth::sign_in))
                .service(
                    web::resource("/current-user")
                        .wrap(auth.clone())
                        .route(web::get().to(auth::current_user)),
                ),
        )
        .service(
            web::resource("/users")
                .guard(guard::Get())
                .to(users::list_users),
        )
        .service(
            web::resource("/users")
                .guard(guard::Put())
                .wrap(auth.clone())
                .to(users::update_profile),
        )
        .service(
            web::scope("/posts")
                .wrap(auth.clone())
                .route("", web::get().to(posts::list_posts))
                .route("", web::post().to(posts::create_post))
                .route("/{post_id}", web::get().to(posts::get_post))
                .route("/{post_id}", web::put().to(posts::update_post))
                .route("/{post_id}", web::delete().to(posts::delete_post))
                .route("/{post_id}/reactions", web::post().to(reactions::react))
                .route("/{post_id}/reactions", web::get().to(reactions::get_reactions)),
        )
        .service(
            web::resource("/upload")
                .wrap(auth)
                .route(web::post().to(media::upload)),
        );
}
