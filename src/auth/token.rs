use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::Config;
use crate::models::User;
use crate::store::{Store, StoreError};

/// Represents the claims encoded within both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: Uuid,
    pub email: String,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// Random id, set on refresh tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<Uuid>,
}

/// The identity a validated token speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub email: String,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, expired, malformed or missing claims.
    #[error("invalid or expired token")]
    Invalid,
    #[error("token subject no longer exists")]
    UnknownUser,
    /// The refresh token no longer matches the most recently issued one.
    #[error("refresh token reuse detected")]
    Reused,
    #[error("failed to sign token: {0}")]
    Signing(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Signing material and lifetimes for both token kinds.
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.jwt_secret,
            &config.jwt_refresh_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    /// Signs a fresh access/refresh pair. No side effects.
    pub fn issue(&self, user_id: Uuid, email: &str) -> Result<TokenPair, TokenError> {
        let now = Utc::now().timestamp();
        let access = Claims {
            user_id,
            email: email.to_string(),
            iat: now,
            exp: now + self.access_ttl.num_seconds(),
            jti: None,
        };
        let refresh = Claims {
            exp: now + self.refresh_ttl.num_seconds(),
            jti: Some(Uuid::new_v4()),
            ..access.clone()
        };

        let header = Header::new(Algorithm::HS256);
        let sign = |claims: &Claims, key: &EncodingKey| {
            encode(&header, claims, key).map_err(|e| TokenError::Signing(e.to_string()))
        };
        Ok(TokenPair {
            access_token: sign(&access, &self.access_encoding)?,
            refresh_token: sign(&refresh, &self.refresh_encoding)?,
        })
    }

    /// Stateless check of a bearer token against the access secret.
    pub fn validate_access(&self, token: &str) -> Result<Identity, TokenError> {
        Self::decode_with(token, &self.access_decoding).map(Identity::from)
    }

    /// Signature and expiry check of a refresh token. Does not consult the store.
    pub fn decode_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        Self::decode_with(token, &self.refresh_decoding)
    }

    fn decode_with(token: &str, key: &DecodingKey) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<Claims>(token, key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("Token rejected: {}", e);
                TokenError::Invalid
            })
    }
}

/// One-way digest of a refresh token, as persisted on the user record.
pub fn hash_refresh_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Compares a presented token against a stored digest in constant time.
pub fn refresh_hash_matches(token: &str, stored_hash: &str) -> bool {
    let presented = hash_refresh_token(token);
    presented.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}

/// Issues, rotates and validates tokens against the credential store.
#[derive(Clone)]
pub struct TokenService {
    keys: Arc<TokenKeys>,
    store: Arc<dyn Store>,
}

impl TokenService {
    pub fn new(keys: Arc<TokenKeys>, store: Arc<dyn Store>) -> Self {
        Self { keys, store }
    }

    pub fn keys(&self) -> &TokenKeys {
        &self.keys
    }

    /// Issues a new pair and records its refresh digest, replacing whatever was stored.
    pub async fn rotate(&self, user_id: Uuid, email: &str) -> Result<TokenPair, TokenError> {
        let pair = self.keys.issue(user_id, email)?;
        let stored = self
            .store
            .set_refresh_hash(user_id, Some(hash_refresh_token(&pair.refresh_token)))
            .await?;
        if !stored {
            return Err(TokenError::UnknownUser);
        }
        Ok(pair)
    }

    /// Resolves the user a presented refresh token belongs to, rejecting tokens
    /// that were already rotated away.
    pub async fn validate_refresh(&self, token: &str) -> Result<User, TokenError> {
        let claims = self.keys.decode_refresh(token)?;
        let user = self
            .store
            .find_user(claims.user_id)
            .await?
            .ok_or(TokenError::UnknownUser)?;

        let matches = user
            .refresh_token_hash
            .as_deref()
            .map(|stored| refresh_hash_matches(token, stored))
            .unwrap_or(false);
        if !matches {
            log::warn!("Refresh token reuse detected for user {}", user.id);
            return Err(TokenError::Reused);
        }
        Ok(user)
    }

    /// Exchanges a refresh token for a new pair. The stored digest is swapped only
    /// if it still belongs to the presented token, so two concurrent refreshes with
    /// the same token cannot both succeed.
    pub async fn refresh(&self, token: &str) -> Result<(User, TokenPair), TokenError> {
        let user = self.validate_refresh(token).await?;
        let pair = self.keys.issue(user.id, &user.email)?;
        let swapped = self
            .store
            .swap_refresh_hash(
                user.id,
                &hash_refresh_token(token),
                &hash_refresh_token(&pair.refresh_token),
            )
            .await?;
        if !swapped {
            log::warn!("Concurrent refresh lost the race for user {}", user.id);
            return Err(TokenError::Reused);
        }
        Ok((user, pair))
    }
}
