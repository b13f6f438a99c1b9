// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User profile endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::envelope::{Ack, ApiResponse};
use crate::auth::{Auth, Identity};
use crate::error::ApiError;
use crate::state::AppState;
use crate::storage::database::{normalize_limit, DEFAULT_PAGE_SIZE};
use crate::storage::{ProfileUpdate, UserRecord};

/// Claim summary returned alongside the synchronized record.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClaimSummary {
    /// Subject id
    pub sub: String,
    /// Email address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Preferred username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Whether the provider has verified the email address
    pub email_verified: bool,
    /// Realm-level roles
    pub realm_roles: Vec<String>,
    /// Roles of the configured client
    pub client_roles: Vec<String>,
    /// Token expiration (Unix timestamp)
    pub expires_at: i64,
}

impl From<&Identity> for ClaimSummary {
    fn from(identity: &Identity) -> Self {
        Self {
            sub: identity.sub.clone(),
            email: identity.email.clone(),
            username: identity.username.clone(),
            email_verified: identity.email_verified,
            realm_roles: identity.realm_roles.clone(),
            client_roles: identity.client_roles.clone(),
            expires_at: identity.expires_at,
        }
    }
}

/// Payload for GET /api/users/me.
#[derive(Debug, Serialize, ToSchema)]
pub struct MeData {
    pub user: UserRecord,
    pub claims: ClaimSummary,
}

/// Payload wrapping a single user record.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserData {
    pub user: UserRecord,
}

/// Payload for the paginated listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserListData {
    pub users: Vec<UserRecord>,
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListQuery {
    /// 1-based page number (default 1)
    pub page: Option<u64>,
    /// Page size (default 10, maximum 100)
    pub limit: Option<u64>,
}

/// Get the authenticated user's profile.
///
/// Synchronizes the record from the verified claims before returning it, so
/// a first login creates the profile.
#[utoipa::path(
    get,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Synchronized profile and claim summary", body = ApiResponse<MeData>),
        (status = 401, description = "Unauthorized - invalid or missing token"),
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Result<Json<ApiResponse<MeData>>, ApiError> {
    let user = state.store.sync_identity(&identity)?;
    let claims = ClaimSummary::from(&identity);
    Ok(Json(ApiResponse::ok(
        "Profile synchronized",
        MeData { user, claims },
    )))
}

/// Update the authenticated user's profile.
///
/// Only allow-listed fields are applied; anything else in the body is
/// silently ignored.
#[utoipa::path(
    put,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = [])),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<UserData>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Profile does not exist yet"),
    )
)]
pub async fn update_me(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    let user = state.store.update_profile(&identity.sub, &update)?;
    Ok(Json(ApiResponse::ok("Profile updated", UserData { user })))
}

/// Soft-delete the authenticated user's profile.
///
/// The record is retained with `enabled` flipped off.
#[utoipa::path(
    delete,
    path = "/api/users/me",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Profile disabled", body = Ack),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Profile does not exist"),
    )
)]
pub async fn delete_me(
    State(state): State<AppState>,
    Auth(identity): Auth,
) -> Result<Json<Ack>, ApiError> {
    state.store.disable(&identity.sub)?;
    Ok(Json(Ack::message("Profile disabled")))
}

/// Get a user profile by subject id.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "Users",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Provider-issued subject id")),
    responses(
        (status = 200, description = "User profile", body = ApiResponse<UserData>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No such user"),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Auth(_identity): Auth,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserData>>, ApiError> {
    match state.store.get(&id)? {
        Some(user) => Ok(Json(ApiResponse::ok("User found", UserData { user }))),
        None => Err(ApiError::not_found(format!("User {id} not found"))),
    }
}

/// List user profiles with pagination.
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "Users",
    security(("bearer" = [])),
    params(ListQuery),
    responses(
        (status = 200, description = "Page of user profiles", body = ApiResponse<UserListData>),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
    Auth(_identity): Auth,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<UserListData>>, ApiError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = normalize_limit(query.limit.unwrap_or(DEFAULT_PAGE_SIZE));

    let (users, total) = state.store.list(page, limit)?;
    let total_pages = total.div_ceil(limit);

    Ok(Json(ApiResponse::ok(
        "Users listed",
        UserListData {
            users,
            page,
            limit,
            total,
            total_pages,
        },
    )))
}

/// Stateless logout acknowledgement.
///
/// No server-side token invalidation happens here; the token stays valid
/// until its natural expiry and must be discarded client-side.
#[utoipa::path(
    post,
    path = "/api/users/logout",
    tag = "Users",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Acknowledged", body = Ack),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn logout(Auth(identity): Auth) -> Json<Ack> {
    tracing::debug!(sub = %identity.sub, "logout acknowledged");
    Json(Ack::message("Logged out; discard the token on the client"))
}
