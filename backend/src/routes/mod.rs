//! Route definitions for the commerce back office API

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Protected routes - inventory ledger
        .nest("/inventory", inventory_routes(state.clone()))
        // Protected routes - quotations
        .nest("/quotations", quotation_routes(state.clone()))
        // Protected routes - sales and payments
        .nest("/sales", sale_routes(state))
}

/// Inventory routes (protected)
fn inventory_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_inventory).post(handlers::provision_inventory),
        )
        .route(
            "/:inventory_id",
            get(handlers::get_inventory).put(handlers::update_inventory),
        )
        .route("/:inventory_id/ledger", get(handlers::verify_ledger))
        .route(
            "/:inventory_id/adjustments",
            get(handlers::list_adjustments).post(handlers::apply_adjustment),
        )
        .route(
            "/:inventory_id/adjustments/export",
            get(handlers::export_adjustments),
        )
        .route(
            "/:inventory_id/adjustments/:adjustment_id",
            get(handlers::get_adjustment)
                .put(handlers::update_adjustment)
                .delete(handlers::reverse_adjustment),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Quotation routes (protected)
fn quotation_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_quotations).post(handlers::create_quotation),
        )
        .route(
            "/:quotation_id",
            get(handlers::get_quotation)
                .put(handlers::update_quotation)
                .delete(handlers::delete_quotation),
        )
        .route("/:quotation_id/items", post(handlers::add_quotation_item))
        .route(
            "/:quotation_id/items/:item_id",
            put(handlers::update_quotation_item).delete(handlers::remove_quotation_item),
        )
        .route("/:quotation_id/send", post(handlers::send_quotation))
        .route("/:quotation_id/approve", post(handlers::approve_quotation))
        .route("/:quotation_id/reject", post(handlers::reject_quotation))
        .route("/:quotation_id/convert", post(handlers::convert_quotation))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Sale routes (protected)
fn sale_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route(
            "/:sale_id",
            get(handlers::get_sale)
                .put(handlers::update_sale)
                .delete(handlers::delete_sale),
        )
        .route("/:sale_id/items", post(handlers::add_sale_item))
        .route(
            "/:sale_id/items/:item_id",
            put(handlers::update_sale_item).delete(handlers::remove_sale_item),
        )
        .route("/:sale_id/confirm", post(handlers::confirm_sale))
        .route("/:sale_id/cancel", post(handlers::cancel_sale))
        .route("/:sale_id/payments", post(handlers::record_payment))
        .route(
            "/:sale_id/payments/:payment_id",
            delete(handlers::remove_payment),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
