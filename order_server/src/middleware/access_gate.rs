//! Bearer-token access gate for the order API.
//!
//! The gate reads the `Authorization: Bearer <token>` header, verifies the token, and stores the resulting
//! [`JwtClaims`] in the request extensions for the ACL middleware and the handlers to use. Requests without a valid,
//! unexpired token are rejected with a 401 before they reach any route.
use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;

use crate::{
    auth::{JwtClaims, TokenVerifier},
    errors::{AuthError, ServerError},
};

pub struct AccessGateFactory {
    verifier: TokenVerifier,
}

impl AccessGateFactory {
    pub fn new(verifier: TokenVerifier) -> Self {
        AccessGateFactory { verifier }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGateFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AccessGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AccessGateService { verifier: self.verifier.clone(), service: Rc::new(service) })
    }
}

pub struct AccessGateService<S> {
    verifier: TokenVerifier,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AccessGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let claims = bearer_token(&req).and_then(|token| self.verifier.verify(token));
        Box::pin(async move {
            match claims {
                Ok(claims) => {
                    trace!("🔐️ {} ({}) is calling {}", claims.user_id, claims.role, req.path());
                    req.extensions_mut().insert::<JwtClaims>(claims);
                    service.call(req).await
                },
                Err(e) => {
                    debug!("🔐️ Rejecting request to {}. {e}", req.path());
                    Err(ServerError::AuthenticationError(e).into())
                },
            }
        })
    }
}

fn bearer_token(req: &ServiceRequest) -> Result<&str, AuthError> {
    let header = req.headers().get(AUTHORIZATION).ok_or(AuthError::MissingToken)?;
    let value = header
        .to_str()
        .map_err(|e| AuthError::PoorlyFormattedToken(format!("The Authorization header is not valid text. {e}")))?;
    match value.trim().split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() => {
            Ok(token.trim())
        },
        _ => Err(AuthError::PoorlyFormattedToken("Expected 'Bearer <token>'.".to_string())),
    }
}
