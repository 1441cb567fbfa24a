use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Jwk
///
/// One RSA public key as published by the identity provider. Only the fields needed for RS256
/// verification are kept; anything else in the document (`x5c`, `x5t`, ...) is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    pub kid: String,
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_field: Option<String>,
    pub n: String,
    pub e: String,
}

/// Jwks
///
/// The `/.well-known/jwks.json` document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Error)]
pub enum JwksError {
    #[error("fetch jwks from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid key {kid}: {source}")]
    InvalidKey {
        kid: String,
        #[source]
        source: jsonwebtoken::errors::Error,
    },
}

/// KeySet
///
/// Decoding keys indexed by `kid`, built once at startup and read-only afterwards.
#[derive(Clone, Default)]
pub struct KeySet {
    keys: HashMap<String, DecodingKey>,
}

impl KeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Converts every RSA signing key of a JWKS document. Keys of other types or uses are
    /// skipped; a malformed RSA key fails the whole set.
    pub fn from_jwks(jwks: &Jwks) -> Result<Self, JwksError> {
        let mut set = Self::new();
        for key in &jwks.keys {
            if key.kty != "RSA" || key.use_field.as_deref().is_some_and(|u| u != "sig") {
                tracing::debug!(kid = %key.kid, kty = %key.kty, "skipping non-signing jwk");
                continue;
            }
            let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e).map_err(|source| {
                JwksError::InvalidKey {
                    kid: key.kid.clone(),
                    source,
                }
            })?;
            set.insert(key.kid.clone(), decoding_key);
        }
        Ok(set)
    }

    pub fn insert(&mut self, kid: impl Into<String>, key: DecodingKey) {
        self.keys.insert(kid.into(), key);
    }

    pub fn get(&self, kid: &str) -> Option<&DecodingKey> {
        self.keys.get(kid)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Downloads the identity provider's published keys.
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<KeySet, JwksError> {
    let fetch_err = |source| JwksError::Fetch {
        url: url.to_string(),
        source,
    };
    let jwks: Jwks = client
        .get(url)
        .send()
        .await
        .and_then(|response| response.error_for_status())
        .map_err(fetch_err)?
        .json()
        .await
        .map_err(fetch_err)?;

    let set = KeySet::from_jwks(&jwks)?;
    tracing::info!(url, keys = set.len(), "loaded signing keys");
    Ok(set)
}
