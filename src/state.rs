// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared application state.

use std::sync::Arc;

use jsonwebtoken::Algorithm;

use crate::auth::JwksManager;
use crate::storage::UserStore;

/// Token verification configuration.
///
/// The JWKS source is optional so tests can construct state without a live
/// key endpoint; a request that reaches the verifier while it is unset is
/// rejected with a configuration error.
#[derive(Clone)]
pub struct AuthConfig {
    /// JWKS key source.
    pub jwks: Option<Arc<JwksManager>>,
    /// Expected token issuer.
    pub issuer: String,
    /// Expected token audience. Audience failures fall back to a relaxed
    /// pass, see `auth::verifier`.
    pub audience: Option<String>,
    /// Expected signing algorithm.
    pub algorithm: Algorithm,
    /// Client id used to scope client-level roles.
    pub client_id: String,
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<UserStore>,
    pub auth: AuthConfig,
    /// Allowed CORS origin; permissive when unset.
    pub allowed_origin: Option<String>,
}

impl AppState {
    pub fn new(store: UserStore, auth: AuthConfig) -> Self {
        Self {
            store: Arc::new(store),
            auth,
            allowed_origin: None,
        }
    }

    pub fn with_allowed_origin(mut self, origin: impl Into<String>) -> Self {
        self.allowed_origin = Some(origin.into());
        self
    }
}
