// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # User Store
//!
//! Persistent user-profile records backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `users`: subject id → serialized [`UserRecord`] (JSON bytes)
//!
//! ## Ownership
//!
//! Records are mutated only through upsert-on-login ([`UserStore::sync_identity`])
//! or explicit profile updates; they are never physically deleted (the
//! `enabled` flag is flipped instead). The subject id key is immutable once
//! a record is created.
//!
//! Concurrent logins for the same subject are not serialized here; redb
//! write transactions make the upsert atomic, so no duplicate records can
//! be created.

pub mod database;
pub mod users;

pub use database::{StoreError, StoreResult, UserStore};
pub use users::{ProfileUpdate, UserRecord};
