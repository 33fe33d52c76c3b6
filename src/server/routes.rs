use axum::http::Method;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::*;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(service_info))
        .route("/_api/catalog", get(get_catalog))
        // Benchmark routes
        .route("/_api/benchmark/run", post(run_catalog_benchmark))
        .route("/_api/benchmark/custom", post(run_custom_benchmark))
        // Result store routes
        .route("/_api/results", get(list_results).delete(clear_results))
        .route(
            "/_api/results/{database}/{variant}/{scenario}",
            get(get_result).delete(delete_result),
        )
        // Combined analytics
        .route("/_api/analytics/ranking", get(analytics_ranking))
        // Playground routes
        .route("/_api/playground/collections", get(list_collections))
        .route("/_api/playground/collection", post(create_collection))
        .route("/_api/playground/collection/{name}", delete(drop_collection))
        .route("/_api/playground/document/{collection}", post(insert_document))
        .route("/_api/playground/find/{collection}", post(find_documents))
        .route(
            "/_api/playground/documents/{collection}",
            put(update_documents).delete(delete_documents),
        )
        .route(
            "/_api/playground/aggregate/{collection}",
            post(aggregate_documents),
        )
        .route("/_api/playground/index/{collection}", post(create_index))
        .route(
            "/_api/playground/index/{collection}/{name}",
            delete(drop_index),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers(Any),
        )
}
