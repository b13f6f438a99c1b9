// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Profile Service - Keycloak-backed User Profile Microservice
//!
//! This crate provides a thin user-profile service that delegates
//! authentication to Keycloak and mirrors verified token claims into an
//! embedded document store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `auth` - Authentication (Keycloak JWT + JWKS)
//! - `storage` - Embedded user store (redb)

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;
pub mod storage;
