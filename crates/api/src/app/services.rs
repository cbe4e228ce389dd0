//! Infrastructure wiring: event store, reference data, fulfillment service.
//!
//! The event store is Postgres when `DATABASE_URL` is set and in-memory
//! otherwise. Read models always live in memory and are rebuilt from the
//! store on startup.

use std::{convert::Infallible, sync::Arc, time::Duration};

use anyhow::Context;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tracing::{info, warn};

use sitecart_core::TenantId;
use sitecart_fleet::{InMemoryStaffDirectory, InMemoryVehicleCatalog};
use sitecart_infra::{
    AppConfig, CommandDispatcher, FulfillmentService, StatusNotifier,
    event_store::{EventStore, InMemoryEventStore, PostgresEventStore},
};

pub type DynEventStore = Arc<dyn EventStore>;

/// Shared state behind every handler.
pub struct AppServices {
    fulfillment: FulfillmentService<DynEventStore>,
}

impl AppServices {
    pub fn new(fulfillment: FulfillmentService<DynEventStore>) -> Self {
        Self { fulfillment }
    }

    pub fn fulfillment(&self) -> &FulfillmentService<DynEventStore> {
        &self.fulfillment
    }
}

/// Build services from configuration.
///
/// Fails when the database is unreachable or the vehicle catalog file is unreadable.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store: DynEventStore = match &config.database_url {
        Some(url) => {
            let pg = PostgresEventStore::connect(url)
                .await
                .context("connecting to the event store database")?;
            pg.ensure_schema().await.context("creating the events table")?;
            info!("using postgres event store");
            Arc::new(pg)
        }
        None => {
            warn!("DATABASE_URL not set; events are kept in memory only");
            Arc::new(InMemoryEventStore::new())
        }
    };

    let catalog = match &config.vehicle_catalog_path {
        Some(path) => {
            let raw = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("reading vehicle catalog {}", path.display()))?;
            InMemoryVehicleCatalog::from_json(&raw).context("parsing vehicle catalog")?
        }
        None => InMemoryVehicleCatalog::with_defaults(),
    };

    let services = assemble(
        store,
        catalog,
        StatusNotifier::new(config.realtime_channel_capacity),
    );

    // The Postgres store blocks on the runtime; keep that off the async workers.
    let services = tokio::task::spawn_blocking(move || {
        services
            .fulfillment
            .rebuild_read_models()
            .map(|count| (services, count))
    })
    .await
    .context("read model rebuild task")?
    .context("rebuilding read models")?;
    info!(events = services.1, "read models ready");

    Ok(services.0)
}

/// In-memory services with the default fleet; used by tests and local runs.
pub fn in_memory_services() -> AppServices {
    assemble(
        Arc::new(InMemoryEventStore::new()),
        InMemoryVehicleCatalog::with_defaults(),
        StatusNotifier::new(256),
    )
}

fn assemble(store: DynEventStore, catalog: InMemoryVehicleCatalog, notifier: StatusNotifier) -> AppServices {
    let dispatcher = CommandDispatcher::new(store);
    AppServices::new(FulfillmentService::new(
        dispatcher,
        Arc::new(catalog),
        Arc::new(InMemoryStaffDirectory::with_defaults()),
        notifier,
    ))
}

/// Status changes for one tenant as server-sent events.
pub fn tenant_status_stream(
    services: &AppServices,
    tenant_id: TenantId,
) -> Sse<impl tokio_stream::Stream<Item = Result<SseEvent, Infallible>> + use<>> {
    let rx = services.fulfillment.notifier().subscribe();
    let stream = BroadcastStream::new(rx).filter_map(move |msg| match msg {
        Ok(note) if note.tenant_id == tenant_id => {
            let data = serde_json::to_string(&note).unwrap_or_else(|_| "{}".to_string());
            Some(Ok(SseEvent::default().event("order.status").data(data)))
        }
        // Lagged receivers skip ahead.
        _ => None,
    });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}
