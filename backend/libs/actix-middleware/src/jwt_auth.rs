use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage, HttpResponse,
};
use crypto_core::{AuthError, IdentityResolver};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// Authenticated user resolved from the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// Bearer token authentication.
///
/// Every request must carry `Authorization: Bearer <token>`; the token is
/// handed to the configured `IdentityResolver`. On success the resolved
/// `UserId` is stored in the request extensions, otherwise the request is
/// answered with 401 and never reaches the handler.
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    resolver: Arc<dyn IdentityResolver>,
}

impl JwtAuthMiddleware {
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self { resolver }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = JwtAuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service: Rc::new(service),
            resolver: self.resolver.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    resolver: Arc<dyn IdentityResolver>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let resolved = bearer_token(&req).and_then(|token| self.resolver.resolve_identity(token));

        Box::pin(async move {
            match resolved {
                Ok(user_id) => {
                    req.extensions_mut().insert(UserId(user_id));
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                }
                Err(err) => {
                    tracing::warn!(path = %req.path(), error = %err, "Authentication failed");
                    let response = unauthorized(&err);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
fn bearer_token(req: &ServiceRequest) -> Result<&str, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingCredential)?
        .to_str()
        .map_err(|_| AuthError::Malformed("authorization header is not ASCII".to_string()))?;

    let (scheme, token) = header
        .split_once(' ')
        .ok_or_else(|| AuthError::Malformed("expected 'Bearer <token>'".to_string()))?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Malformed(format!(
            "unsupported authorization scheme '{scheme}'"
        )));
    }

    Ok(token)
}

fn unauthorized(err: &AuthError) -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "error": format!("Unauthorized: {}", err),
        "status": 401,
    }))
}

impl actix_web::FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<UserId>() {
            Some(user_id) => ready(Ok(*user_id)),
            None => ready(Err(actix_web::error::ErrorUnauthorized(
                "User not authenticated",
            ))),
        }
    }
}
