// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Authentication error type.
///
/// Each variant maps to a distinct caller-visible error code, surfaced
/// unchanged in the error envelope.
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingCredential,
    /// Authorization header is not exactly `Bearer <token>`
    MalformedCredential,
    /// Token cannot be decoded as a JWT
    TokenMalformed,
    /// Token signature is invalid or signed with the wrong algorithm
    SignatureInvalid,
    /// Token has expired
    TokenExpired,
    /// Token is not yet valid
    TokenNotYetValid,
    /// Token issuer does not match the configured realm
    InvalidIssuer,
    /// The token names a key id the provider does not publish
    NoMatchingKey,
    /// The key set could not be fetched or produced no usable key
    JwksFetch(String),
    /// Verifier invoked without a configured JWKS source
    Configuration,
    /// Internal error
    Internal(String),
}

#[derive(Serialize)]
struct AuthErrorBody {
    success: bool,
    message: String,
    code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::TokenMalformed => "token_malformed",
            AuthError::SignatureInvalid => "signature_invalid",
            AuthError::TokenExpired => "token_expired",
            AuthError::TokenNotYetValid => "token_not_yet_valid",
            AuthError::InvalidIssuer => "invalid_issuer",
            AuthError::NoMatchingKey => "no_matching_key",
            AuthError::JwksFetch(_) => "key_resolution_error",
            AuthError::Configuration => "configuration_error",
            AuthError::Internal(_) => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredential
            | AuthError::MalformedCredential
            | AuthError::TokenMalformed
            | AuthError::SignatureInvalid
            | AuthError::TokenExpired
            | AuthError::TokenNotYetValid
            | AuthError::InvalidIssuer
            | AuthError::NoMatchingKey => StatusCode::UNAUTHORIZED,
            AuthError::JwksFetch(_) | AuthError::Configuration | AuthError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "Authorization header is required"),
            AuthError::MalformedCredential => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::TokenMalformed => write!(f, "Token is malformed"),
            AuthError::SignatureInvalid => write!(f, "Token signature is invalid"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenNotYetValid => write!(f, "Token is not yet valid"),
            AuthError::InvalidIssuer => write!(f, "Token issuer is invalid"),
            AuthError::NoMatchingKey => write!(f, "No matching key found in JWKS"),
            AuthError::JwksFetch(msg) => write!(f, "Failed to resolve signing key: {msg}"),
            AuthError::Configuration => write!(f, "Identity provider is not configured"),
            AuthError::Internal(msg) => write!(f, "Internal authentication error: {msg}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            success: false,
            message: self.to_string(),
            code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
