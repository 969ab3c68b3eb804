//! `parent_of` and `owns` handlers.
//!
//! Relationships are addressed by their endpoints rather than their edge id.

use super::dto::{OwnsReq, OwnsResp, PageParams, ParentOfReq, ParentOfResp};
use super::{ApiError, AppState, body};
use crate::models::{ElementId, Owns, ParentOf};
use crate::storage::GraphStore;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

type Result<T> = std::result::Result<T, ApiError>;

const fn upsert_status(existed: bool) -> StatusCode {
    if existed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    }
}

pub async fn parents<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<ParentOfResp>>> {
    let edges = state
        .run(move |inventory, _| inventory.parents(&ElementId::new(id), params.page()))
        .await?;
    Ok(Json(edges.into_iter().map(ParentOfResp::from).collect()))
}

pub async fn children<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<ParentOfResp>>> {
    let edges = state
        .run(move |inventory, _| inventory.children(&ElementId::new(id), params.page()))
        .await?;
    Ok(Json(edges.into_iter().map(ParentOfResp::from).collect()))
}

pub async fn set_parent<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path((child, parent)): Path<(String, String)>,
    payload: std::result::Result<Json<ParentOfReq>, JsonRejection>,
) -> Result<(StatusCode, Json<ParentOfResp>)> {
    let req = body(payload)?;
    let (edge, existed) = state
        .run(move |inventory, _| {
            inventory.set_parent_of(
                &ParentOf::new(ElementId::new(parent), ElementId::new(child)),
                req.expiration,
                req.timestamp,
            )
        })
        .await?;
    Ok((upsert_status(existed), Json(edge.into())))
}

pub async fn drop_parent<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path((child, parent)): Path<(String, String)>,
) -> Result<StatusCode> {
    state
        .run(move |inventory, _| {
            let edge =
                inventory.parent_of_between(&ElementId::new(parent), &ElementId::new(child))?;
            inventory.drop_parent_of(&edge.eid)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn owners<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<OwnsResp>>> {
    let edges = state
        .run(move |inventory, _| inventory.owners(&ElementId::new(id), params.page()))
        .await?;
    Ok(Json(edges.into_iter().map(OwnsResp::from).collect()))
}

pub async fn set_owner<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path((asset, team)): Path<(String, String)>,
    payload: std::result::Result<Json<OwnsReq>, JsonRejection>,
) -> Result<(StatusCode, Json<OwnsResp>)> {
    let req = body(payload)?;
    let (edge, existed) = state
        .run(move |inventory, _| {
            inventory.set_owns(
                &Owns::new(ElementId::new(team), ElementId::new(asset)),
                req.start_time,
                req.end_time,
            )
        })
        .await?;
    Ok((upsert_status(existed), Json(edge.into())))
}

pub async fn drop_owner<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path((asset, team)): Path<(String, String)>,
) -> Result<StatusCode> {
    state
        .run(move |inventory, _| {
            let edge = inventory.owns_between(&ElementId::new(team), &ElementId::new(asset))?;
            inventory.drop_owns(&edge.eid)
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
