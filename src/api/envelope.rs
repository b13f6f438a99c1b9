// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The JSON response envelope shared by every endpoint.

use serde::Serialize;
use utoipa::ToSchema;

/// Success envelope: `{"success": true, "message": "...", "data": ...}`.
///
/// The error counterpart (`success: false`) is produced by the error types,
/// see `crate::error::ApiError` and `crate::auth::AuthError`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Success envelope with a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Payload-less acknowledgement envelope.
pub type Ack = ApiResponse<serde_json::Value>;

impl Ack {
    /// Success envelope without a payload.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }
}
