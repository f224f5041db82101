use crate::auth_middleware::require_auth;
use crate::{
    logging::{access_log, log_payloads},
    models::AppState,
    routes::{auth, exercises, workouts},
};

use axum::http::HeaderValue;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::{Json, Router};

use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

async fn healthz() -> Json<&'static str> {
    Json("ok")
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => layer.allow_origin(Any),
    }
}

pub fn build_app(state: AppState) -> Router {
    // Request-ID middleware comes first so everything downstream
    // has access to the x-request-id header.
    let request_id_layer = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id());

    let protected = Router::new()
        .route("/auth/status", get(auth::auth_status))
        .route("/exercises/parse", post(exercises::preview))
        .route("/workouts", get(workouts::list).post(workouts::create))
        .route(
            "/workouts/{id}",
            get(workouts::get).delete(workouts::delete),
        )
        .route("/workouts/by-code/{code}", get(workouts::get_by_code))
        .route(
            "/workouts/{id}/exercises",
            get(exercises::list)
                .post(exercises::create)
                .delete(exercises::clear),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let cors = cors_layer(state.config.cors_origin.as_deref());

    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/login", post(auth::login))
        .merge(protected)
        .with_state(state)
        .layer(from_fn(log_payloads))
        .layer(from_fn(access_log))
        .layer(request_id_layer)
        .layer(cors)
}
