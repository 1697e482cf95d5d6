use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    error::InternalError,
    http::header,
    Error, HttpMessage, HttpResponse,
};
use crypto_core::{TokenError, TokenIssuer, TokenKind};
use error_types::ErrorResponse;
use futures::future::{ready, Ready};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Arc;
use uuid::Uuid;

/// httpOnly cookie carrying the short-lived access token
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
/// httpOnly cookie carrying the long-lived refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

/// Account ID extracted from the access token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserId(pub Uuid);

/// JWT Authentication Middleware
///
/// Reads the access token from the `accessToken` cookie, falling back to an
/// `Authorization: Bearer` header for non-browser clients.
pub struct JwtAuthMiddleware {
    issuer: Arc<TokenIssuer>,
}

impl JwtAuthMiddleware {
    pub fn new(issuer: Arc<TokenIssuer>) -> Self {
        Self { issuer }
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
            issuer: self.issuer.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: Rc<S>,
    issuer: Arc<TokenIssuer>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let issuer = self.issuer.clone();

        Box::pin(async move {
            let token = match extract_access_token(&req) {
                Some(token) => token,
                None => return Ok(reject(req, "Unauthorized, No Token Provided")),
            };

            let claims = match issuer.validate(&token, TokenKind::Access) {
                Ok(claims) => claims,
                Err(TokenError::Expired) => return Ok(reject(req, "Unauthorized, Token Expired")),
                Err(e) => {
                    tracing::warn!(error = %e, "access token rejected");
                    return Ok(reject(req, "Unauthorized"));
                }
            };

            let account_id = match claims.account_id() {
                Ok(id) => id,
                Err(e) => {
                    tracing::error!(error = %e, "access token carries malformed subject");
                    return Ok(reject(req, "Unauthorized"));
                }
            };

            req.extensions_mut().insert(UserId(account_id));

            service.call(req).await.map(ServiceResponse::map_into_left_body)
        })
    }
}

fn extract_access_token(req: &ServiceRequest) -> Option<String> {
    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn reject<B>(req: ServiceRequest, message: &'static str) -> ServiceResponse<EitherBody<B>> {
    req.into_response(HttpResponse::Unauthorized().json(ErrorResponse::unauthorized(message)))
        .map_into_right_body()
}

fn unauthorized(message: &'static str) -> Error {
    let body = ErrorResponse::unauthorized(message);
    InternalError::from_response(message, HttpResponse::Unauthorized().json(body)).into()
}

/// FromRequest implementation for UserId
impl actix_web::FromRequest for UserId {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<UserId>() {
            Some(user_id) => ready(Ok(*user_id)),
            None => ready(Err(unauthorized("Unauthorized"))),
        }
    }
}
