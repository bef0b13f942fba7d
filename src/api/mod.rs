// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{
        guard::guard_management_endpoints, metrics::AuthMetricsSnapshot,
        middleware::authenticate_request, ProviderKind, Role,
    },
    state::AppState,
};

pub mod health;
pub mod management;
pub mod session;

/// Every route served, with its methods. Backs `/mappings`.
pub const ROUTES: &[(&str, &[&str])] = &[
    ("/health", &["GET"]),
    ("/api/v1/authenticate", &["POST"]),
    ("/api/v1/logout", &["POST"]),
    ("/api/v1/me", &["GET"]),
    ("/autoconfig", &["GET"]),
    ("/beans", &["GET"]),
    ("/configprops", &["GET"]),
    ("/env", &["GET"]),
    ("/mappings", &["GET"]),
    ("/metrics", &["GET"]),
    ("/shutdown", &["POST"]),
    ("/docs", &["GET"]),
    ("/api-doc/openapi.json", &["GET"]),
];

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/authenticate", post(session::authenticate))
        .route("/logout", post(session::logout))
        .route("/me", get(session::me));

    let management_routes = Router::new()
        .route("/autoconfig", get(management::autoconfig))
        .route("/beans", get(management::beans))
        .route("/configprops", get(management::configprops))
        .route("/env", get(management::env))
        .route("/mappings", get(management::mappings))
        .route("/metrics", get(management::metrics))
        .route("/shutdown", post(management::shutdown));

    // Layers run bottom to top: CORS, request id, tracing, then credential
    // extraction, then the admin guard which needs the installed principal.
    Router::new()
        .route("/health", get(health::health))
        .nest("/api/v1", v1_routes)
        .merge(management_routes)
        .with_state(state.clone())
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(from_fn_with_state(
            state.guard_state(),
            guard_management_endpoints,
        ))
        .layer(from_fn_with_state(state.filter_state(), authenticate_request))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        session::authenticate,
        session::logout,
        session::me,
        management::autoconfig,
        management::beans,
        management::configprops,
        management::env,
        management::mappings,
        management::metrics,
        management::shutdown
    ),
    components(
        schemas(
            health::HealthResponse,
            session::PrincipalResponse,
            session::AuthenticateResponse,
            management::AutoconfigResponse,
            management::BeansResponse,
            management::ConfigPropsResponse,
            management::RouteMapping,
            management::MetricsResponse,
            AuthMetricsSnapshot,
            ProviderKind,
            Role
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Session", description = "Login, logout and caller identity"),
        (name = "Management", description = "Operational endpoints, admin role only")
    )
)]
struct ApiDoc;
