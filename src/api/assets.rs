//! Asset handlers.

use super::dto::{AssetListParams, AssetReq, AssetResp, BulkReq, rfc3339};
use super::{ApiError, AppState, body};
use crate::models::{Asset, AssetFilter, ElementId};
use crate::services::BulkIngestion;
use crate::storage::GraphStore;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

type Result<T> = std::result::Result<T, ApiError>;

fn filter(params: &AssetListParams) -> Result<AssetFilter> {
    let mut filter = AssetFilter::new();
    if let Some(asset_type) = &params.asset_type {
        filter = filter.with_type(asset_type.as_str());
    }
    if let Some(identifier) = &params.identifier {
        filter = filter.with_identifier(identifier.as_str());
    }
    if let Some(valid_at) = &params.valid_at {
        filter = filter.valid_at(rfc3339::parse(valid_at).map_err(ApiError::bad_request)?);
    }
    Ok(filter)
}

pub async fn list<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<AssetListParams>,
) -> Result<Json<Vec<AssetResp>>> {
    let filter = filter(&params)?;
    let page = params.paging().page();
    let assets = state
        .run(move |inventory, universe| inventory.assets(universe, &filter, page))
        .await?;
    Ok(Json(assets.into_iter().map(AssetResp::from).collect()))
}

pub async fn create<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    payload: std::result::Result<Json<AssetReq>, JsonRejection>,
) -> Result<(StatusCode, Json<AssetResp>)> {
    let req = body(payload)?;
    let asset = state
        .run(move |inventory, universe| {
            inventory.add_asset(&Asset::new(req.asset_id), req.expiration, req.timestamp, universe)
        })
        .await
        .map_err(|err| match err.status() {
            StatusCode::CONFLICT => ApiError::new(StatusCode::CONFLICT, "asset already exists"),
            _ => err,
        })?;
    Ok((StatusCode::CREATED, Json(asset.into())))
}

pub async fn show<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<AssetResp>> {
    let asset = state
        .run(move |inventory, _| inventory.asset(&ElementId::new(id)))
        .await?;
    Ok(Json(asset.into()))
}

pub async fn update<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<AssetReq>, JsonRejection>,
) -> Result<Json<AssetResp>> {
    let req = body(payload)?;
    let asset = state
        .run(move |inventory, _| {
            inventory.update_asset(
                &ElementId::new(id),
                &Asset::new(req.asset_id),
                req.expiration,
                req.timestamp,
            )
        })
        .await?;
    Ok(Json(asset.into()))
}

pub async fn remove<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .run(move |inventory, _| inventory.drop_asset(&ElementId::new(id)))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn bulk<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    payload: std::result::Result<Json<BulkReq>, JsonRejection>,
) -> Result<StatusCode> {
    let req = body(payload)?;
    let report = state
        .run(move |inventory, universe| {
            BulkIngestion::new(inventory, universe).ingest(&req.assets)
        })
        .await?;
    tracing::debug!(?report, "Bulk ingestion finished");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_rejects_bad_valid_at() {
        let params = AssetListParams {
            valid_at: Some("tomorrow".to_string()),
            ..AssetListParams::default()
        };
        let err = filter(&params).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_filter_composes() {
        let params = AssetListParams {
            asset_type: Some("host".to_string()),
            valid_at: Some("2021-07-01T00:00:00+00:00".to_string()),
            ..AssetListParams::default()
        };
        let filter = filter(&params).unwrap();
        assert_eq!(filter.asset_type.as_deref(), Some("host"));
        assert!(filter.identifier.is_none());
        assert!(filter.valid_at.is_some());
    }
}
