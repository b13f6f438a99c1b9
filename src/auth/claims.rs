// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! JWT claim set and the typed identity context derived from it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Claims extracted from a Keycloak access token.
///
/// Keycloak tokens contain standard OIDC claims plus realm/client role
/// claims. Only the fields this service consumes are typed; everything else
/// lands in `extra`.
#[derive(Debug, Clone, Deserialize)]
pub struct KeycloakClaims {
    /// Subject - the canonical provider-issued user identifier
    pub sub: String,

    /// Expiration timestamp
    pub exp: i64,

    /// Issued at timestamp
    #[serde(default)]
    pub iat: i64,

    /// Not before timestamp (optional)
    #[serde(default)]
    pub nbf: Option<i64>,

    /// Issuer (realm URL)
    #[serde(default)]
    pub iss: String,

    /// Audience - a single client id or a list of them
    #[serde(default)]
    pub aud: Option<serde_json::Value>,

    /// Email address
    #[serde(default)]
    pub email: Option<String>,

    /// Whether the provider has verified the email address
    #[serde(default)]
    pub email_verified: bool,

    /// Preferred username
    #[serde(default)]
    pub preferred_username: Option<String>,

    /// Given name
    #[serde(default)]
    pub given_name: Option<String>,

    /// Family name
    #[serde(default)]
    pub family_name: Option<String>,

    /// Full display name
    #[serde(default)]
    pub name: Option<String>,

    /// Realm-level roles
    #[serde(default)]
    pub realm_access: Option<RoleSet>,

    /// Client-level roles, keyed by client id
    #[serde(default)]
    pub resource_access: HashMap<String, RoleSet>,

    /// Remaining claims, kept for request-scoped inspection only
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// A `roles` claim block (`realm_access` / `resource_access` entries).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleSet {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Typed identity context for an authenticated request.
///
/// Populated by [`Identity::from_claims`], the only claim-to-context mapping
/// in the service; handlers never see the raw claim payload.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    /// Canonical user id (`sub` claim)
    pub sub: String,

    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Preferred username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Given name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,

    /// Family name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,

    /// Full display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Whether the provider has verified the email address
    pub email_verified: bool,

    /// Realm-level roles
    pub realm_roles: Vec<String>,

    /// Roles of the configured client
    pub client_roles: Vec<String>,

    /// Token issuer (kept for logging, not serialized)
    #[serde(skip)]
    pub issuer: String,

    /// Token expiration (Unix timestamp, not serialized)
    #[serde(skip)]
    pub expires_at: i64,
}

impl Identity {
    /// Map a verified claim set into an identity context.
    ///
    /// Client roles are scoped to `client_id`; roles granted for other
    /// clients are dropped.
    pub fn from_claims(claims: KeycloakClaims, client_id: &str) -> Self {
        let realm_roles = claims
            .realm_access
            .map(|r| r.roles)
            .unwrap_or_default();
        let client_roles = claims
            .resource_access
            .get(client_id)
            .map(|r| r.roles.clone())
            .unwrap_or_default();

        Self {
            sub: claims.sub,
            email: claims.email,
            username: claims.preferred_username,
            given_name: claims.given_name,
            family_name: claims.family_name,
            name: claims.name,
            email_verified: claims.email_verified,
            realm_roles,
            client_roles,
            issuer: claims.iss,
            expires_at: claims.exp,
        }
    }

    /// Check for a realm-level role.
    pub fn has_realm_role(&self, role: &str) -> bool {
        self.realm_roles.iter().any(|r| r == role)
    }

    /// Check for a client-level role.
    pub fn has_client_role(&self, role: &str) -> bool {
        self.client_roles.iter().any(|r| r == role)
    }
}
