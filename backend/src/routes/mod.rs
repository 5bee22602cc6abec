//! Route definitions for the café inventory API

use axum::{
    routing::{get, post},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::dashboard))
        .nest("/categories", category_routes())
        .nest("/items", item_routes())
        .nest("/orders", order_routes())
        .nest("/receiving", receiving_routes())
        .nest("/counts", count_routes())
}

/// Category management routes
fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/:id",
            get(handlers::get_category)
                .put(handlers::update_category)
                .delete(handlers::delete_category),
        )
        .route(
            "/:id/image",
            get(handlers::get_category_image).put(handlers::set_category_image),
        )
}

/// Item ledger routes
fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_items).post(handlers::create_item))
        .route("/:id", get(handlers::get_item).put(handlers::update_item))
        .route("/:id/archive", post(handlers::archive_item))
}

/// Purchase order routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/on-order", get(handlers::quantity_on_order))
        .route(
            "/:id",
            get(handlers::get_order)
                .put(handlers::update_order)
                .delete(handlers::delete_order),
        )
        .route("/:id/place", post(handlers::place_order))
}

/// Receiving routes
fn receiving_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::receiving_overview).post(handlers::create_receipt),
        )
        .route("/orders/:order_id", post(handlers::create_order_receipt))
        .route(
            "/:id",
            get(handlers::get_receipt)
                .put(handlers::update_receipt)
                .delete(handlers::delete_receipt),
        )
}

/// Inventory count routes
fn count_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_counts).post(handlers::create_count))
        .route("/sheet", get(handlers::start_count))
        .route(
            "/:id",
            get(handlers::get_count)
                .put(handlers::update_count)
                .delete(handlers::delete_count),
        )
        .route("/:id/sheet", get(handlers::count_sheet))
}
