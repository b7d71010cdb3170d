use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, Stream, StreamExt};

use comanda_auth::{authorize_order_read, LoginPolicy, Principal, Role};
use comanda_infra::{seed_demo_catalog, DocumentStore, InMemoryDocumentStore, RepositoryError, StoreError};
use comanda_session::{AppContext, ContextError, OrdersView, SessionRegistry};

use crate::app::dto;
use crate::config::{Settings, StoreBackend};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("COMANDA_STORE=postgres but this build lacks the `postgres` feature")]
    PostgresUnavailable,

    #[error("store setup failed: {0}")]
    Store(#[from] StoreError),

    #[error("demo seed failed: {0}")]
    Seed(#[from] RepositoryError),

    #[error("initial load failed: {0}")]
    Load(#[from] ContextError),
}

/// Everything the handlers share.
pub struct AppServices {
    ctx: AppContext,
    sessions: Arc<SessionRegistry>,
    /// Keeps the context's order list in step with remote writes for as
    /// long as the server runs.
    _live_orders: OrdersView,
}

impl AppServices {
    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }
}

pub async fn build_services(settings: &Settings) -> Result<AppServices, ServiceError> {
    let store = open_store(&settings.store).await?;
    let ctx = AppContext::new(store);

    if settings.seed_demo {
        let report = seed_demo_catalog(ctx.catalog_repository()).await?;
        if !report.is_empty() {
            tracing::info!(?report, "demo catalog loaded");
        }
    }

    ctx.refresh_catalog().await?;
    ctx.refresh_orders().await?;

    let mut live_orders = OrdersView::new(ctx.clone(), Principal::new("api", Role::PurchasingLead))?;
    live_orders.mount().await?;

    Ok(AppServices {
        ctx,
        sessions: Arc::new(SessionRegistry::new(LoginPolicy::new(settings.lead_secret.clone()))),
        _live_orders: live_orders,
    })
}

async fn open_store(backend: &StoreBackend) -> Result<Arc<dyn DocumentStore>, ServiceError> {
    match backend {
        StoreBackend::Memory => {
            tracing::info!("using in-memory document store");
            Ok(Arc::new(InMemoryDocumentStore::new()))
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres { database_url } => {
            let store = comanda_infra::PostgresDocumentStore::connect(database_url).await?;
            store.ensure_schema().await?;
            tracing::info!("using postgres document store");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres { .. } => Err(ServiceError::PostgresUnavailable),
    }
}

/// Live order snapshots for one principal, as server-sent events.
///
/// Each snapshot is filtered to what the principal may read. The underlying
/// subscription is released when the client goes away.
pub async fn orders_sse_stream(
    services: Arc<AppServices>,
    principal: Principal,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ContextError> {
    let mut subscription = services.ctx.subscribe_orders().await?;
    let (tx, rx) = mpsc::channel::<serde_json::Value>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                snapshot = subscription.recv() => {
                    let Some(orders) = snapshot else { break };
                    let catalog = services.ctx.catalog();
                    let items: Vec<_> = orders
                        .iter()
                        .filter(|o| authorize_order_read(&principal, &o.created_by).is_ok())
                        .map(|o| dto::order_row_to_json(o, &catalog))
                        .collect();
                    if tx.send(serde_json::json!({ "items": items })).await.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!(name = %principal.name, "order stream closed");
    });

    let stream = ReceiverStream::new(rx).map(|payload| {
        Ok(SseEvent::default().event("orders").data(payload.to_string()))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15))))
}
