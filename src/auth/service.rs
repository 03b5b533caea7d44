use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;

use crate::user;

/// Only contract the engine consumes from the identity collaborator: a bearer
/// token either resolves to a user identity or it does not.
#[async_trait]
pub trait AuthService {
    async fn current_identity(&self, token: &str) -> Option<user::Id>;
}

#[derive(Deserialize)]
struct Claims {
    sub: user::Id,
}

pub struct JwtAuthService {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuthService {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl AuthService for JwtAuthService {
    async fn current_identity(&self, token: &str) -> Option<user::Id> {
        decode::<Claims>(token, &self.key, &self.validation)
            .map(|data| data.claims.sub)
            .ok()
    }
}
