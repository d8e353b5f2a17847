use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};

use crate::error::ForumError;
use crate::models::Id;
use crate::routes::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// User id issued by the identity service; becomes the `owner` of content.
    pub sub: Id,
    pub username: String,
    pub exp: usize,
}

#[derive(thiserror::Error, Debug)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid token subject")]
    EmptySubject,
}

/// Checks a bearer credential and yields the caller's claims.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Claims, AuthError>;
}

/// HS256 JWTs signed with a shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    secret: String,
}

impl JwtVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self { secret: secret.into() }
    }
}

impl CredentialVerifier for JwtVerifier {
    fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let data = decode::<Claims>(token, &DecodingKey::from_secret(self.secret.as_bytes()), &validation)?;
        if data.claims.sub.is_empty() {
            return Err(AuthError::EmptySubject);
        }
        Ok(data.claims)
    }
}

/// Extractor yielding the verified caller.
pub struct Auth(pub Claims);

impl Auth {
    pub fn owner(&self) -> &str {
        &self.0.sub
    }
}

impl FromRequest for Auth {
    type Error = ForumError;
    type Future = Ready<Result<Self, ForumError>>;

    fn from_request(req: &HttpRequest, pl: &mut Payload) -> Self::Future {
        let Some(state) = req.app_data::<web::Data<AppState>>() else {
            return ready(Err(ForumError::Internal("AppState not registered".into())));
        };
        // Delegate to BearerAuth to parse the header.
        let Ok(bearer) = BearerAuth::from_request(req, pl).into_inner() else {
            return ready(Err(ForumError::Unauthorized("Missing authentication".into())));
        };
        match state.verifier.verify(bearer.token()) {
            Ok(claims) => ready(Ok(Auth(claims))),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                ready(Err(ForumError::Unauthorized(e.to_string())))
            }
        }
    }
}

/// Issue a token for a user. Token issuance belongs to the identity service;
/// this exists for it and for tests.
pub fn create_jwt(secret: &str, user_id: &str, username: &str) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = chrono::Utc::now()
        .checked_add_signed(chrono::Duration::hours(3))
        .map(|t| t.timestamp() as usize)
        .unwrap_or(usize::MAX);

    let claims = Claims { sub: user_id.to_string(), username: username.to_string(), exp: expiration };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes()))
}
