// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWKS (JSON Web Key Set) fetching and caching.
//!
//! ## Policy
//!
//! - Keys are cached process-wide with a 24-hour TTL
//! - Origin fetches are limited to 10 per minute
//! - Stale cache is used on fetch failure (fail-open for availability)
//!
//! ## Usage
//!
//! Initialize [`JwksManager`] with the realm JWKS URL in `main.rs` and store
//! it in `AppState`. The verifier resolves decoding keys through it.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::{Duration, Instant};

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use jsonwebtoken::jwk::{AlgorithmParameters, Jwk, JwkSet};
use jsonwebtoken::DecodingKey;
use tokio::sync::RwLock;

use super::error::AuthError;

/// Default JWKS cache TTL (24 hours).
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Timeout for a single JWKS fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum origin fetches per minute.
const MAX_FETCHES_PER_MINUTE: u32 = 10;

/// JWKS cache entry.
struct CacheEntry {
    jwks: JwkSet,
    fetched_at: Instant,
}

/// JWKS manager with caching and a bounded origin fetch rate.
#[derive(Clone)]
pub struct JwksManager {
    /// JWKS URL (realm `protocol/openid-connect/certs` endpoint)
    jwks_url: String,
    /// Cache TTL
    cache_ttl: Duration,
    /// Cached key set
    cache: Arc<RwLock<Option<CacheEntry>>>,
    /// Origin fetch quota
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
    /// HTTP client
    client: reqwest::Client,
}

impl JwksManager {
    /// Create a new JWKS manager.
    ///
    /// # Arguments
    /// - `jwks_url`: The JWKS endpoint URL (e.g.
    ///   `https://id.example.com/realms/myrealm/protocol/openid-connect/certs`)
    pub fn new(jwks_url: impl Into<String>) -> Self {
        let quota = Quota::per_minute(
            NonZeroU32::new(MAX_FETCHES_PER_MINUTE).unwrap_or(NonZeroU32::MIN),
        );
        Self {
            jwks_url: jwks_url.into(),
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: Arc::new(RwLock::new(None)),
            limiter: Arc::new(RateLimiter::direct(quota)),
            client: reqwest::Client::builder()
                .timeout(FETCH_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    /// Create with custom cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Get the JWKS URL.
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// Fetch the key set, preferring the cache.
    ///
    /// When the cache is expired and a refresh is rate-limited or fails, the
    /// stale cache entry is served if one exists.
    async fn get_jwks(&self) -> Result<JwkSet, AuthError> {
        {
            let cache = self.cache.read().await;
            if let Some(entry) = &*cache {
                if entry.fetched_at.elapsed() < self.cache_ttl {
                    return Ok(entry.jwks.clone());
                }
            }
        }

        let fetch_result = if self.limiter.check().is_ok() {
            self.fetch_jwks().await
        } else {
            Err(AuthError::JwksFetch(
                "origin fetch rate limit exceeded".to_string(),
            ))
        };

        match fetch_result {
            Ok(jwks) => {
                let mut cache = self.cache.write().await;
                *cache = Some(CacheEntry {
                    jwks: jwks.clone(),
                    fetched_at: Instant::now(),
                });
                Ok(jwks)
            }
            Err(err) => {
                let cache = self.cache.read().await;
                if let Some(entry) = &*cache {
                    tracing::warn!(error = %err, "serving stale JWKS after failed refresh");
                    Ok(entry.jwks.clone())
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Fetch the key set from the endpoint.
    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| AuthError::JwksFetch(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::JwksFetch(format!(
                "HTTP {} from JWKS endpoint",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::JwksFetch(e.to_string()))
    }

    /// Get a decoding key for the given key ID.
    pub async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let jwks = self.get_jwks().await?;

        let jwk = jwks
            .keys
            .iter()
            .find(|k| k.common.key_id.as_deref() == Some(kid))
            .ok_or(AuthError::NoMatchingKey)?;

        jwk_to_decoding_key(jwk)
    }

    /// Get any usable decoding key (for tokens without a `kid` header).
    pub async fn any_decoding_key(&self) -> Result<DecodingKey, AuthError> {
        let jwks = self.get_jwks().await?;

        for jwk in &jwks.keys {
            if let Ok(key) = jwk_to_decoding_key(jwk) {
                return Ok(key);
            }
        }

        Err(AuthError::NoMatchingKey)
    }

    /// Force refresh the cached key set, subject to the fetch quota.
    pub async fn refresh(&self) -> Result<(), AuthError> {
        if self.limiter.check().is_err() {
            return Err(AuthError::JwksFetch(
                "origin fetch rate limit exceeded".to_string(),
            ));
        }
        let jwks = self.fetch_jwks().await?;
        let mut cache = self.cache.write().await;
        *cache = Some(CacheEntry {
            jwks,
            fetched_at: Instant::now(),
        });
        Ok(())
    }

    /// Check if a non-expired key set is currently cached.
    pub async fn is_cached(&self) -> bool {
        let cache = self.cache.read().await;
        if let Some(entry) = &*cache {
            entry.fetched_at.elapsed() < self.cache_ttl
        } else {
            false
        }
    }
}

/// Convert a JWK to a decoding key.
fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
    match &jwk.algorithm {
        AlgorithmParameters::RSA(rsa) => DecodingKey::from_rsa_components(&rsa.n, &rsa.e)
            .map_err(|e| AuthError::JwksFetch(format!("unusable RSA key: {e}"))),
        AlgorithmParameters::EllipticCurve(ec) => DecodingKey::from_ec_components(&ec.x, &ec.y)
            .map_err(|e| AuthError::JwksFetch(format!("unusable EC key: {e}"))),
        _ => Err(AuthError::JwksFetch(
            "unsupported key type in JWKS".to_string(),
        )),
    }
}
