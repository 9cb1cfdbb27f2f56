//! Web server exposing the staging/warehouse/rules/extraction API.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::repository::{
    DetailRepository, RuleRepository, StagingRepository, WarehouseRepository,
};
use crate::services::{BatchCoordinator, ExtractionPipeline, HttpFetcher, PageFetcher};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub staging: Arc<StagingRepository>,
    pub warehouse: Arc<WarehouseRepository>,
    pub rules: Arc<RuleRepository>,
    pub details: Arc<DetailRepository>,
    pub pipeline: Arc<ExtractionPipeline>,
    pub batch: Arc<BatchCoordinator>,
}

impl AppState {
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        Self::with_fetcher(settings, Arc::new(HttpFetcher::new()))
    }

    /// Build state with a caller-supplied fetcher (used by tests).
    pub fn with_fetcher(
        settings: &Settings,
        fetcher: Arc<dyn PageFetcher>,
    ) -> anyhow::Result<Self> {
        let db = settings.db_path();
        // Warehouse schema first: detail records reference it.
        let warehouse = Arc::new(WarehouseRepository::new(&db)?);
        let rules = Arc::new(RuleRepository::new(&db)?);
        let details = Arc::new(DetailRepository::new(&db)?);
        let staging = Arc::new(StagingRepository::new(&db)?);

        let pipeline = Arc::new(ExtractionPipeline::new(
            warehouse.clone(),
            rules.clone(),
            details.clone(),
            fetcher,
        ));
        let batch = Arc::new(BatchCoordinator::new(pipeline.clone()));

        Ok(Self {
            staging,
            warehouse,
            rules,
            details,
            pipeline,
            batch,
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = settings.bind.parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
