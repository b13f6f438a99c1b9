// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User record model and the merge rules applied to it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Identity;

/// Persisted user-profile record.
///
/// Provider-sourced fields (`email`, `username`, `first_name`, `last_name`,
/// `email_verified`) are overwritten on every login synchronization;
/// locally-owned fields (`phone`, `picture`, `preferences`) and the
/// `enabled` flag survive it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserRecord {
    /// Provider-issued subject id (unique key, immutable)
    pub sub: String,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// First name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Last name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Whether the provider has verified the email address
    pub email_verified: bool,
    /// Soft-delete flag; disabled records are retained
    pub enabled: bool,
    /// Phone number (locally owned)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Avatar URL (locally owned)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Free-form preference map (locally owned)
    #[serde(default)]
    #[schema(value_type = Object)]
    pub preferences: HashMap<String, serde_json::Value>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record was last modified
    pub updated_at: DateTime<Utc>,
    /// When the user last logged in
    pub last_login_at: DateTime<Utc>,
}

impl UserRecord {
    /// Create a record from a first-seen identity.
    pub fn from_identity(identity: &Identity, now: DateTime<Utc>) -> Self {
        Self {
            sub: identity.sub.clone(),
            email: identity.email.clone(),
            username: identity.username.clone(),
            first_name: identity.given_name.clone(),
            last_name: identity.family_name.clone(),
            email_verified: identity.email_verified,
            enabled: true,
            phone: None,
            picture: None,
            preferences: HashMap::new(),
            created_at: now,
            updated_at: now,
            last_login_at: now,
        }
    }

    /// Overwrite provider-sourced fields and stamp the login time.
    ///
    /// The subject id, locally-owned fields, `enabled` and `created_at` are
    /// untouched.
    pub fn apply_identity(&mut self, identity: &Identity, now: DateTime<Utc>) {
        self.email = identity.email.clone();
        self.username = identity.username.clone();
        self.first_name = identity.given_name.clone();
        self.last_name = identity.family_name.clone();
        self.email_verified = identity.email_verified;
        self.updated_at = now;
        self.last_login_at = now;
    }

    /// Apply an allow-listed profile update.
    pub fn apply_update(&mut self, update: &ProfileUpdate, now: DateTime<Utc>) {
        if let Some(first_name) = &update.first_name {
            self.first_name = Some(first_name.clone());
        }
        if let Some(last_name) = &update.last_name {
            self.last_name = Some(last_name.clone());
        }
        if let Some(phone) = &update.phone {
            self.phone = Some(phone.clone());
        }
        if let Some(picture) = &update.picture {
            self.picture = Some(picture.clone());
        }
        if let Some(preferences) = &update.preferences {
            self.preferences = preferences.clone();
        }
        self.updated_at = now;
    }
}

/// Allow-listed profile update.
///
/// Fields outside the allow-list are dropped at deserialization, so a body
/// that submits e.g. `email` or `sub` leaves those fields unchanged rather
/// than being rejected.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProfileUpdate {
    /// First name
    pub first_name: Option<String>,
    /// Last name
    pub last_name: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Avatar URL
    pub picture: Option<String>,
    /// Preference map; replaces the stored map when present
    #[schema(value_type = Option<Object>)]
    pub preferences: Option<HashMap<String, serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(sub: &str) -> Identity {
        Identity {
            sub: sub.to_string(),
            email: Some("jo@example.com".to_string()),
            username: Some("jo".to_string()),
            given_name: Some("Jo".to_string()),
            family_name: Some("Doe".to_string()),
            name: Some("Jo Doe".to_string()),
            email_verified: true,
            realm_roles: vec![],
            client_roles: vec![],
            issuer: "test".to_string(),
            expires_at: 0,
        }
    }

    #[test]
    fn from_identity_sets_provider_fields_and_enables() {
        let now = Utc::now();
        let record = UserRecord::from_identity(&identity("abc"), now);
        assert_eq!(record.sub, "abc");
        assert_eq!(record.email.as_deref(), Some("jo@example.com"));
        assert!(record.enabled);
        assert_eq!(record.created_at, now);
        assert_eq!(record.last_login_at, now);
    }

    #[test]
    fn apply_identity_preserves_local_fields() {
        let created = Utc::now();
        let mut record = UserRecord::from_identity(&identity("abc"), created);
        record.phone = Some("+4912345".to_string());
        record.enabled = false;

        let mut fresh = identity("abc");
        fresh.email = Some("new@example.com".to_string());
        let later = created + chrono::Duration::seconds(60);
        record.apply_identity(&fresh, later);

        assert_eq!(record.email.as_deref(), Some("new@example.com"));
        assert_eq!(record.phone.as_deref(), Some("+4912345"));
        assert!(!record.enabled);
        assert_eq!(record.created_at, created);
        assert_eq!(record.last_login_at, later);
    }

    #[test]
    fn apply_update_only_touches_provided_fields() {
        let now = Utc::now();
        let mut record = UserRecord::from_identity(&identity("abc"), now);
        record.apply_update(
            &ProfileUpdate {
                phone: Some("+4912345".to_string()),
                ..Default::default()
            },
            now,
        );
        assert_eq!(record.phone.as_deref(), Some("+4912345"));
        assert_eq!(record.first_name.as_deref(), Some("Jo"));
    }

    #[test]
    fn update_deserialization_drops_unknown_fields() {
        let update: ProfileUpdate = serde_json::from_value(serde_json::json!({
            "first_name": "Joanna",
            "email": "sneaky@example.com",
            "sub": "hijack",
            "enabled": false
        }))
        .unwrap();
        assert_eq!(update.first_name.as_deref(), Some("Joanna"));
        // The unknown fields simply do not exist on the update type.
        assert!(update.phone.is_none());
    }
}
