// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Token verification.
//!
//! Verification is a two-step attempt: a strict pass enforcing signature,
//! time window, issuer and audience, then - only when the strict pass failed
//! on the audience check - a relaxed pass with audience enforcement
//! disabled. Signature, expiry and issuer are never relaxed.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, DecodingKey, Validation};

use super::claims::KeycloakClaims;
use super::error::AuthError;
use crate::state::AuthConfig;

/// Clock skew tolerance (60 seconds).
const CLOCK_SKEW_LEEWAY: u64 = 60;

/// Verify a compact signed token and return its claim set.
pub async fn verify_token(token: &str, auth: &AuthConfig) -> Result<KeycloakClaims, AuthError> {
    let jwks = auth.jwks.as_ref().ok_or(AuthError::Configuration)?;

    let header = decode_header(token).map_err(|_| AuthError::TokenMalformed)?;
    if header.alg != auth.algorithm {
        return Err(AuthError::SignatureInvalid);
    }

    let decoding_key = match &header.kid {
        Some(kid) => jwks.decoding_key(kid).await?,
        None => jwks.any_decoding_key().await?,
    };

    let strict = build_validation(auth, true);
    match decode::<KeycloakClaims>(token, &decoding_key, &strict) {
        Ok(data) => Ok(data.claims),
        Err(err) if is_audience_failure(&err) => {
            verify_relaxed_audience(token, &decoding_key, auth)
        }
        Err(err) => Err(map_jwt_error(&err)),
    }
}

/// Relaxed pass: audience enforcement off, everything else unchanged.
fn verify_relaxed_audience(
    token: &str,
    decoding_key: &DecodingKey,
    auth: &AuthConfig,
) -> Result<KeycloakClaims, AuthError> {
    let relaxed = build_validation(auth, false);
    let data =
        decode::<KeycloakClaims>(token, decoding_key, &relaxed).map_err(|e| map_jwt_error(&e))?;
    tracing::warn!(
        sub = %data.claims.sub,
        aud = ?data.claims.aud,
        expected = ?auth.audience,
        "accepted token after relaxed audience validation"
    );
    Ok(data.claims)
}

fn build_validation(auth: &AuthConfig, enforce_audience: bool) -> Validation {
    let mut validation = Validation::new(auth.algorithm);
    validation.leeway = CLOCK_SKEW_LEEWAY;
    validation.validate_nbf = true;
    validation.set_issuer(&[&auth.issuer]);
    match (&auth.audience, enforce_audience) {
        (Some(audience), true) => validation.set_audience(&[audience]),
        _ => validation.validate_aud = false,
    }
    validation
}

fn is_audience_failure(err: &jsonwebtoken::errors::Error) -> bool {
    match err.kind() {
        ErrorKind::InvalidAudience => true,
        ErrorKind::MissingRequiredClaim(claim) => claim == "aud",
        _ => false,
    }
}

fn map_jwt_error(err: &jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        ErrorKind::ImmatureSignature => AuthError::TokenNotYetValid,
        ErrorKind::InvalidSignature => AuthError::SignatureInvalid,
        ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
        _ => AuthError::TokenMalformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::test_keys::{jwks_json, sign};
    use crate::auth::JwksManager;
    use jsonwebtoken::Algorithm;
    use std::sync::Arc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TEST_ISSUER: &str = "https://id.example.com/realms/myrealm";
    const TEST_CLIENT: &str = "profile-app";

    async fn jwks_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/certs"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(jwks_json(), "application/json"),
            )
            .mount(&server)
            .await;
        server
    }

    fn auth_config(server: &MockServer) -> AuthConfig {
        AuthConfig {
            jwks: Some(Arc::new(JwksManager::new(format!(
                "{}/certs",
                server.uri()
            )))),
            issuer: TEST_ISSUER.to_string(),
            audience: Some(TEST_CLIENT.to_string()),
            algorithm: Algorithm::RS256,
            client_id: TEST_CLIENT.to_string(),
        }
    }

    fn base_claims() -> serde_json::Value {
        let now = chrono::Utc::now().timestamp();
        serde_json::json!({
            "sub": "f7c1d9e0",
            "iss": TEST_ISSUER,
            "aud": TEST_CLIENT,
            "exp": now + 3600,
            "iat": now,
        })
    }

    #[tokio::test]
    async fn valid_token_yields_claims() {
        let server = jwks_server().await;
        let token = sign(&base_claims(), Algorithm::RS256);

        let claims = verify_token(&token, &auth_config(&server)).await.unwrap();
        assert_eq!(claims.sub, "f7c1d9e0");
        assert_eq!(claims.iss, TEST_ISSUER);
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let server = jwks_server().await;
        let mut claims = base_claims();
        let now = chrono::Utc::now().timestamp();
        claims["exp"] = serde_json::json!(now - 7200);
        let token = sign(&claims, Algorithm::RS256);

        let err = verify_token(&token, &auth_config(&server)).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn not_yet_valid_token_is_rejected() {
        let server = jwks_server().await;
        let mut claims = base_claims();
        let now = chrono::Utc::now().timestamp();
        claims["nbf"] = serde_json::json!(now + 3600);
        let token = sign(&claims, Algorithm::RS256);

        let err = verify_token(&token, &auth_config(&server)).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenNotYetValid));
    }

    #[tokio::test]
    async fn wrong_audience_succeeds_via_relaxed_fallback() {
        let server = jwks_server().await;
        let mut claims = base_claims();
        claims["aud"] = serde_json::json!("account");
        let token = sign(&claims, Algorithm::RS256);

        let claims = verify_token(&token, &auth_config(&server)).await.unwrap();
        assert_eq!(claims.sub, "f7c1d9e0");
    }

    #[tokio::test]
    async fn missing_audience_succeeds_via_relaxed_fallback() {
        let server = jwks_server().await;
        let mut claims = base_claims();
        claims.as_object_mut().unwrap().remove("aud");
        let token = sign(&claims, Algorithm::RS256);

        assert!(verify_token(&token, &auth_config(&server)).await.is_ok());
    }

    #[tokio::test]
    async fn relaxed_fallback_does_not_rescue_expired_tokens() {
        let server = jwks_server().await;
        let mut claims = base_claims();
        let now = chrono::Utc::now().timestamp();
        claims["aud"] = serde_json::json!("account");
        claims["exp"] = serde_json::json!(now - 7200);
        let token = sign(&claims, Algorithm::RS256);

        let err = verify_token(&token, &auth_config(&server)).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn tampered_signature_is_rejected() {
        let server = jwks_server().await;
        let token = sign(&base_claims(), Algorithm::RS256);
        let mut other_claims = base_claims();
        other_claims["sub"] = serde_json::json!("someone-else");
        let other = sign(&other_claims, Algorithm::RS256);

        // Splice the other token's signature onto this token's payload.
        let parts: Vec<&str> = token.split('.').collect();
        let other_sig = other.split('.').next_back().unwrap();
        let tampered = format!("{}.{}.{}", parts[0], parts[1], other_sig);

        let err = verify_token(&tampered, &auth_config(&server)).await.unwrap_err();
        assert!(matches!(err, AuthError::SignatureInvalid));
    }

    #[tokio::test]
    async fn algorithm_mismatch_is_rejected() {
        let server = jwks_server().await;
        let token = sign(&base_claims(), Algorithm::RS384);

        let err = verify_token(&token, &auth_config(&server)).await.unwrap_err();
        assert!(matches!(err, AuthError::SignatureInvalid));
    }

    #[tokio::test]
    async fn wrong_issuer_is_rejected() {
        let server = jwks_server().await;
        let mut claims = base_claims();
        claims["iss"] = serde_json::json!("https://id.example.com/realms/other");
        let token = sign(&claims, Algorithm::RS256);

        let err = verify_token(&token, &auth_config(&server)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidIssuer));
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let server = jwks_server().await;
        let err = verify_token("not-a-jwt", &auth_config(&server)).await.unwrap_err();
        assert!(matches!(err, AuthError::TokenMalformed));
    }

    #[tokio::test]
    async fn missing_jwks_source_is_configuration_error() {
        let server = jwks_server().await;
        let mut config = auth_config(&server);
        config.jwks = None;
        let token = sign(&base_claims(), Algorithm::RS256);

        let err = verify_token(&token, &config).await.unwrap_err();
        assert!(matches!(err, AuthError::Configuration));
    }
}
