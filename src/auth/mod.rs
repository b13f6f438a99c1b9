// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Keycloak JWT authentication for the profile API.
//!
//! ## Auth Flow
//!
//! 1. A client obtains an access token from Keycloak
//! 2. The client sends `Authorization: Bearer <token>`
//! 3. This service:
//!    - Resolves the signing key from the realm JWKS endpoint (cached)
//!    - Verifies signature, expiry, issuer and - best effort - audience
//!    - Maps the claim set into a typed [`Identity`]
//!
//! ## Security
//!
//! - All `/api/users` endpoints except health require authentication
//! - JWKS responses are cached for 24 hours; origin fetches are limited to
//!   10 per minute
//! - Clock skew tolerance is 60 seconds
//! - Audience failures retry once without audience enforcement; each use of
//!   the fallback is logged at WARN

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
#[cfg(test)]
pub mod test_keys;
pub mod verifier;

pub use claims::{Identity, KeycloakClaims};
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::JwksManager;
