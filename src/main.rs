//src/main.rs

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod clients;
mod common;
mod config;
mod handlers;
mod middleware;
mod models;
mod services;

#[cfg(test)]
mod testing;

use crate::config::{AppState, Settings};
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() {
    // Inicializa o logger. RUST_LOG sobrescreve o nível padrão.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // .expect() é bom aqui: se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env().expect("Falha ao carregar a configuração.");
    let app_state = AppState::new(&settings).expect("Falha ao inicializar o estado da aplicação.");

    let invoice_routes = Router::new()
        .route("/invoices", get(handlers::invoices::list_invoices))
        .route("/invoices/{id}/payments", post(handlers::invoices::log_payment))
        .route("/payments/{id}/confirm", post(handlers::invoices::confirm_payment))
        .route("/quotes/{id}/status", post(handlers::invoices::update_quote_status));

    let fulfillment_routes = Router::new()
        .route("/{invoice_id}/draft"
               ,get(handlers::fulfillment::open_draft)
               .delete(handlers::fulfillment::discard_draft)
        )
        .route("/{invoice_id}/lines/{line_id}/splits", post(handlers::fulfillment::add_split))
        .route("/{invoice_id}/splits/{split_id}"
               ,axum::routing::patch(handlers::fulfillment::update_split)
               .delete(handlers::fulfillment::remove_split)
        )
        .route("/{invoice_id}/lines/{line_id}/skip", post(handlers::fulfillment::set_skip))
        .route("/{invoice_id}/bulk-assign", post(handlers::fulfillment::bulk_assign))
        .route("/{invoice_id}/progress", get(handlers::fulfillment::progress))
        .route("/{invoice_id}/submit", post(handlers::fulfillment::submit))
        .route("/{invoice_id}/purchase-orders", post(handlers::fulfillment::create_purchase_order));

    let dispatch_routes = Router::new()
        .route("/{invoice_id}", get(handlers::dispatch::overview))
        .route("/{invoice_id}/approve", post(handlers::dispatch::approve_all))
        .route("/{invoice_id}/reject", post(handlers::dispatch::reject_all));

    let requisition_routes = Router::new()
        .route("/"
               ,get(handlers::requisitions::list_requisitions)
               .post(handlers::requisitions::create_requisition)
        )
        .route("/{id}/approve", post(handlers::requisitions::approve_requisition))
        .route("/{id}/reject", post(handlers::requisitions::reject_requisition))
        .route("/{id}/pay", post(handlers::requisitions::pay_requisition))
        .route("/{id}/receive", post(handlers::requisitions::receive_requisition));

    let inventory_routes = Router::new()
        .route("/locations/{location}/products", get(handlers::inventory::products_for_location))
        .route("/stock", post(handlers::inventory::update_stock_quantity));

    // Tudo sob /api exige token, exceto o health check
    let protected = Router::new()
        .merge(invoice_routes)
        .nest("/fulfillment", fulfillment_routes)
        .route("/purchase-orders/{id}/payments", post(handlers::purchase_orders::log_supplier_payment))
        .nest("/dispatch", dispatch_routes)
        .nest("/requisitions", requisition_routes)
        .route("/float"
               ,get(handlers::requisitions::float_balance)
               .post(handlers::requisitions::add_float_funds)
        )
        .nest("/inventory", inventory_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    let app = Router::new()
        .route("/api/health", get(handlers::health::health))
        .nest("/api", protected)
        .with_state(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", settings.bind_addr);
    axum::serve(listener, app)
        .await
        .expect("Erro no servidor Axum");
}
