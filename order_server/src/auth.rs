//! Access tokens for the order API.
//!
//! Tokens are HS256-signed JWTs carrying the caller's user id and role, plus an expiry. The server only ever verifies
//! them; [`TokenIssuer`] exists for operators and tests that need to mint tokens signed with the server's secret.
use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{DateTime, Utc};
use futures::future::{ready, Ready};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    prelude::*,
};
use log::*;
use order_engine::db_types::Role;
use serde::{Deserialize, Serialize};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    pub user_id: String,
    pub role: Role,
}

impl JwtClaims {
    pub fn new<S: Into<String>>(user_id: S, role: Role) -> Self {
        Self { user_id: user_id.into(), role }
    }
}

/// Handlers receive the claims that the access gate placed into the request extensions. A handler mounted outside the
/// gate will always reject the request.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

fn signing_key(config: &AuthConfig) -> Hs256Key {
    Hs256Key::new(config.jwt_secret.reveal().as_bytes())
}

//-------------------------------------------------  TokenVerifier  ---------------------------------------------------

#[derive(Clone)]
pub struct TokenVerifier {
    key: Hs256Key,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: signing_key(config) }
    }

    /// Checks the token's signature and expiry, returning the claims it carries.
    pub fn verify<S: AsRef<str>>(&self, token: S) -> Result<JwtClaims, AuthError> {
        let untrusted =
            UntrustedToken::new(token.as_ref()).map_err(|e| AuthError::PoorlyFormattedToken(e.to_string()))?;
        let token = Hs256
            .validator::<JwtClaims>(&self.key)
            .validate(&untrusted)
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        token
            .claims()
            .validate_expiration(&TimeOptions::default())
            .map_err(|e| AuthError::ValidationError(e.to_string()))?;
        let claims = token.into_parts().1.custom;
        trace!("🔐️ Access token verified for {} ({})", claims.user_id, claims.role);
        Ok(claims)
    }
}

//-------------------------------------------------  TokenIssuer  -----------------------------------------------------

pub struct TokenIssuer {
    key: Hs256Key,
    lifetime: chrono::Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        Self { key: signing_key(config), lifetime: config.token_lifetime }
    }

    /// Issue a new access token for the given claims, valid for the configured token lifetime.
    pub fn issue_token(&self, claims: JwtClaims) -> Result<String, AuthError> {
        let claims = Claims::new(claims).set_duration_and_issuance(&TimeOptions::default(), self.lifetime);
        self.sign(&claims)
    }

    /// Issue a token that expires at the given time, which may be in the past.
    pub fn issue_token_expiring_at(&self, claims: JwtClaims, expiry: DateTime<Utc>) -> Result<String, AuthError> {
        let mut claims = Claims::new(claims);
        claims.expiration = Some(expiry);
        self.sign(&claims)
    }

    fn sign(&self, claims: &Claims<JwtClaims>) -> Result<String, AuthError> {
        let header = Header::empty().with_token_type("JWT");
        let token =
            Hs256.token(&header, claims, &self.key).map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))?;
        debug!("🔐️ Issued access token for {} ({})", claims.custom.user_id, claims.custom.role);
        Ok(token)
    }
}
