//! Team handlers.

use super::dto::{PageParams, TeamReq, TeamResp};
use super::{ApiError, AppState, body};
use crate::models::{ElementId, Team};
use crate::storage::GraphStore;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

type Result<T> = std::result::Result<T, ApiError>;

pub async fn list<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Query(params): Query<PageParams>,
) -> Result<Json<Vec<TeamResp>>> {
    let teams = state
        .run(move |inventory, universe| inventory.teams(universe, params.page()))
        .await?;
    Ok(Json(teams.into_iter().map(TeamResp::from).collect()))
}

pub async fn create<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    payload: std::result::Result<Json<TeamReq>, JsonRejection>,
) -> Result<(StatusCode, Json<TeamResp>)> {
    let req = body(payload)?;
    let team = state
        .run(move |inventory, universe| {
            inventory.add_team(&Team::new(req.identifier, req.name), universe)
        })
        .await?;
    Ok((StatusCode::CREATED, Json(team.into())))
}

pub async fn show<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<TeamResp>> {
    let team = state
        .run(move |inventory, _| inventory.team(&ElementId::new(id)))
        .await?;
    Ok(Json(team.into()))
}

pub async fn update<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<TeamReq>, JsonRejection>,
) -> Result<Json<TeamResp>> {
    let req = body(payload)?;
    let team = state
        .run(move |inventory, _| {
            inventory.update_team(&ElementId::new(id), &Team::new(req.identifier, req.name))
        })
        .await?;
    Ok(Json(team.into()))
}

pub async fn remove<S: GraphStore + 'static>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state
        .run(move |inventory, _| inventory.drop_team(&ElementId::new(id)))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
