// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;
use crate::storage::{ProfileUpdate, UserRecord};

pub mod envelope;
pub mod health;
pub mod users;

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.allowed_origin.as_deref());

    Router::new()
        .route("/health", get(health::health))
        .route("/api/users/health", get(health::users_health))
        .route(
            "/api/users/me",
            get(users::get_me)
                .put(users::update_me)
                .delete(users::delete_me),
        )
        .route("/api/users/logout", post(users::logout))
        .route("/api/users/{id}", get(users::get_user))
        .route("/api/users", get(users::list_users))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// CORS restricted to the configured origin, permissive when none is set.
fn cors_layer(allowed_origin: Option<&str>) -> CorsLayer {
    match allowed_origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(origin) => CorsLayer::new()
                .allow_origin(origin)
                .allow_methods(Any)
                .allow_headers(Any),
            Err(_) => {
                tracing::warn!(%origin, "unparseable ALLOWED_ORIGIN, falling back to permissive CORS");
                CorsLayer::permissive()
            }
        },
        None => CorsLayer::permissive(),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::users_health,
        users::get_me,
        users::update_me,
        users::delete_me,
        users::get_user,
        users::list_users,
        users::logout
    ),
    components(
        schemas(
            UserRecord,
            ProfileUpdate,
            users::ClaimSummary,
            users::MeData,
            users::UserData,
            users::UserListData,
            health::HealthResponse,
            health::ReadyResponse,
            health::HealthChecks
        )
    ),
    tags(
        (name = "Health", description = "Liveness and readiness"),
        (name = "Users", description = "User profile management")
    )
)]
struct ApiDoc;
