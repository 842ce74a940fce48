use freight_rateio::{api, AppConfig, BatchImportAdapter, TripRegistry};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let config = AppConfig::load()?;
    info!("Starting server with config: {:?}", config);

    let state = api::AppState {
        registry: Arc::new(TripRegistry::new()),
        importer: Arc::new(BatchImportAdapter::new(config.import.clone())),
    };
    let app = api::router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST   /api/allocate                              - one-off allocation");
    info!("  GET    /api/trips/:trip_id                        - current allocation");
    info!("  PUT    /api/trips/:trip_id/header                 - replace header");
    info!("  POST   /api/trips/:trip_id/invoices               - add invoice");
    info!("  DELETE /api/trips/:trip_id/invoices/:invoice_id   - remove invoice");
    info!("  POST   /api/trips/:trip_id/imports[/csv]          - batch import");
    info!("  POST   /api/trips/:trip_id/recalculate            - re-apply");
    info!("  GET    /api/trips/:trip_id/export.csv             - CSV export");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
