/// OpenAPI documentation for Post Service
use crate::domain::{ReactionState, ReactionSummary, VoteKind};
use crate::error::ErrorResponse;
use crate::handlers::{auth, health, media, posts, reactions, users};
use crate::models::{
    AuthorSummary, MediaRef, Post, PostView, ReactionRequest, Role, SignInRequest, SignUpRequest,
    User,
};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Post Service API",
        version = "1.0.0",
        description = "Social posting backend: accounts, JWT sessions, text/image posts and like/dislike reactions.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Development server"),
    ),
    paths(
        health::index,
        health::health,
        auth::sign_up,
        auth::sign_in,
        auth::current_user,
        users::list_users,
        users::update_profile,
        posts::list_posts,
        posts::create_post,
        posts::get_post,
        posts::update_post,
        posts::delete_post,
        reactions::react,
        reactions::get_reactions,
        media::upload,
    ),
    components(schemas(
        ErrorResponse,
        SignUpRequest,
        SignInRequest,
        ReactionRequest,
        auth::MessageResponse,
        auth::TokenBody,
        users::UserEnvelope,
        users::ProfileForm,
        posts::PostList,
        posts::PostEnvelope,
        posts::PostForm,
        media::ImageForm,
        User,
        Role,
        Post,
        PostView,
        AuthorSummary,
        MediaRef,
        ReactionState,
        ReactionSummary,
        VoteKind,
    )),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "auth", description = "Registration, sign-in and the current session"),
        (name = "users", description = "User listing and profile updates"),
        (name = "posts", description = "Post creation, retrieval, updates, and deletion"),
        (name = "reactions", description = "Like/dislike voting on posts"),
        (name = "media", description = "Image upload to the media host"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /auth/sign-in"))
                        .build(),
                ),
            )
        }
    }
}

impl ApiDoc {
    pub fn openapi_json_path() -> &'static str {
        "/api/v1/openapi.json"
    }
}
