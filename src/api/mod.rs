//! REST API over axum.
//!
//! Handlers run every inventory call on the blocking pool, since the stores
//! are synchronous. Routes, status codes and bodies:
//!
//! | Route | Success | Failure |
//! |-------|---------|---------|
//! | `GET /v1/teams` | 200 | |
//! | `POST /v1/teams` | 201 | 400, 409 |
//! | `GET/PUT/DELETE /v1/teams/{id}` | 200 / 200 / 204 | 400, 404 |
//! | `GET /v1/assets` | 200 | 400 |
//! | `POST /v1/assets` | 201 | 400, 409 |
//! | `GET/PUT/DELETE /v1/assets/{id}` | 200 / 200 / 204 | 400, 404 |
//! | `POST /v1/assets/bulk` | 204 | 400, 404 |
//! | `GET /v1/assets/{id}/parents`, `.../children` | 200 | 404 |
//! | `PUT/DELETE /v1/assets/{child}/parents/{parent}` | 201 or 200 / 204 | 400, 404 |
//! | `GET /v1/assets/{id}/owners` | 200 | 404 |
//! | `PUT/DELETE /v1/assets/{asset}/owners/{team}` | 201 or 200 / 204 | 400, 404 |
//! | `GET /v1/universe` | 200 | 404 |
//! | `GET /healthz` | 200 | |

mod assets;
pub mod dto;
mod error;
mod relations;
mod teams;

pub use error::{ApiError, Problem};

use crate::models::Universe;
use crate::services::InventoryService;
use crate::storage::GraphStore;
use crate::{Error, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{MatchedPath, Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
pub struct AppState<S: GraphStore> {
    inventory: InventoryService<S>,
    universe: Arc<Universe>,
}

impl<S: GraphStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inventory: self.inventory.clone(),
            universe: Arc::clone(&self.universe),
        }
    }
}

impl<S: GraphStore> AppState<S> {
    /// Creates the state; every request is scoped to `universe`.
    #[must_use]
    pub fn new(inventory: InventoryService<S>, universe: Universe) -> Self {
        Self {
            inventory,
            universe: Arc::new(universe),
        }
    }
}

impl<S: GraphStore + 'static> AppState<S> {
    /// Runs `f` on the blocking pool.
    async fn run<T, F>(&self, f: F) -> std::result::Result<T, ApiError>
    where
        T: Send + 'static,
        F: FnOnce(&InventoryService<S>, &Universe) -> Result<T> + Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state.inventory, &state.universe))
            .await
            .map_err(|e| ApiError::from(Error::operation_failed("spawn_blocking", e)))?
            .map_err(ApiError::from)
    }
}

/// Unwraps a JSON body, turning rejections into 400 problems.
fn body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> std::result::Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text()))
}

/// Builds the application router.
pub fn router<S: GraphStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/v1/teams", get(teams::list::<S>).post(teams::create::<S>))
        .route(
            "/v1/teams/{id}",
            get(teams::show::<S>)
                .put(teams::update::<S>)
                .delete(teams::remove::<S>),
        )
        .route("/v1/assets", get(assets::list::<S>).post(assets::create::<S>))
        .route("/v1/assets/bulk", post(assets::bulk::<S>))
        .route(
            "/v1/assets/{id}",
            get(assets::show::<S>)
                .put(assets::update::<S>)
                .delete(assets::remove::<S>),
        )
        .route("/v1/assets/{id}/parents", get(relations::parents::<S>))
        .route("/v1/assets/{id}/children", get(relations::children::<S>))
        .route(
            "/v1/assets/{id}/parents/{parent}",
            put(relations::set_parent::<S>).delete(relations::drop_parent::<S>),
        )
        .route("/v1/assets/{id}/owners", get(relations::owners::<S>))
        .route(
            "/v1/assets/{id}/owners/{team}",
            put(relations::set_owner::<S>).delete(relations::drop_owner::<S>),
        )
        .route("/v1/universe", get(universe::<S>))
        .route("/healthz", get(healthz))
        .route_layer(middleware::from_fn(record_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serves the router on `listen` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve<S, F>(state: AppState<S>, listen: SocketAddr, shutdown: F) -> Result<()>
where
    S: GraphStore + 'static,
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| Error::operation_failed("bind", format!("{listen}: {e}")))?;
    tracing::info!(%listen, "Asset inventory API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::operation_failed("serve", e))
}

async fn record_request(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |path| path.as_str().to_string());
    let response = next.run(request).await;
    metrics::counter!(
        "inventory_http_requests_total",
        "route" => route,
        "status" => response.status().as_u16().to_string(),
    )
    .increment(1);
    response
}

async fn healthz() -> &'static str {
    "ok"
}

async fn universe<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
) -> std::result::Result<Json<dto::UniverseResp>, ApiError> {
    let universe = state
        .run(|inventory, universe| inventory.current_universe(universe))
        .await?;
    Ok(Json(universe.into()))
}
