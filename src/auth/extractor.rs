// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated requests.
//!
//! Use the `Auth` extractor in handlers to require a verified bearer token:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(identity): Auth) -> impl IntoResponse {
//!     // identity is the typed Identity context
//! }
//! ```

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::claims::Identity;
use super::error::AuthError;
use super::verifier::verify_token;
use crate::state::AppState;

/// Extractor for authenticated requests.
///
/// Parses the bearer credential, verifies the token and maps its claims into
/// an [`Identity`]. A failing request is rejected before the handler runs,
/// with the verifier's error code surfaced unchanged.
pub struct Auth(pub Identity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // An identity placed in extensions (e.g. by tests) takes precedence.
        if let Some(identity) = parts.extensions.get::<Identity>().cloned() {
            return Ok(Auth(identity));
        }

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingCredential)?
            .to_str()
            .map_err(|_| AuthError::MalformedCredential)?;

        // Must be exactly "Bearer <token>".
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AuthError::MalformedCredential)?;
        if token.is_empty() || token.contains(' ') {
            return Err(AuthError::MalformedCredential);
        }

        let claims = verify_token(token, &state.auth).await?;

        Ok(Auth(Identity::from_claims(claims, &state.auth.client_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{AppState, AuthConfig};
    use crate::storage::UserStore;
    use axum::http::Request;
    use jsonwebtoken::Algorithm;
    use tempfile::TempDir;

    /// Helper to create a test AppState with no JWKS source.
    fn create_test_state() -> (AppState, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store =
            UserStore::open(temp_dir.path().join("users.redb")).expect("Failed to open store");
        let auth = AuthConfig {
            jwks: None,
            issuer: "test".to_string(),
            audience: None,
            algorithm: Algorithm::RS256,
            client_id: "profile-app".to_string(),
        };
        (AppState::new(store, auth), temp_dir)
    }

    fn test_identity(sub: &str) -> Identity {
        Identity {
            sub: sub.to_string(),
            email: Some("jo@example.com".to_string()),
            username: Some("jo".to_string()),
            given_name: None,
            family_name: None,
            name: None,
            email_verified: true,
            realm_roles: vec![],
            client_roles: vec![],
            issuer: "test".to_string(),
            expires_at: 0,
        }
    }

    #[tokio::test]
    async fn missing_header_is_missing_credential() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MissingCredential)));
    }

    #[tokio::test]
    async fn non_bearer_header_is_malformed_credential() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Token abc")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MalformedCredential)));
    }

    #[tokio::test]
    async fn bearer_with_extra_segment_is_malformed_credential() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer abc def")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::MalformedCredential)));
    }

    #[tokio::test]
    async fn verifier_without_jwks_is_configuration_error() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .header("Authorization", "Bearer some.jwt.token")
            .body(())
            .unwrap()
            .into_parts()
            .0;

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(AuthError::Configuration)));
    }

    #[tokio::test]
    async fn extractor_prefers_extensions() {
        let (state, _temp_dir) = create_test_state();
        let mut parts = Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0;
        parts.extensions.insert(test_identity("sub_from_middleware"));

        let result = Auth::from_request_parts(&mut parts, &state).await;
        assert_eq!(result.unwrap().0.sub, "sub_from_middleware");
    }
}
