use std::collections::HashSet;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tilewalk_core::pathfinder::PathfindingService;
use tilewalk_core::route_analysis::{self, RouteAdvisor};
use tilewalk_core::{TilePosition, TransportCatalog};
use tracing::{error, info, info_span};

use crate::errors::AppError;
use crate::models::{
    CanReachRequest, CanReachResponse, CompareRoutesRequest, CompareRoutesResponse, FindPathQuery, FindPathRequest,
    FindPathResponse,
};
use crate::state::{AppState, WorldSnapshot};

#[derive(Debug, Serialize)]
pub struct Healthz {
    pub status: &'static str,
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(Healthz { status: "ok" }))
}

pub async fn readyz(State(state): State<AppState>) -> Result<Response, AppError> {
    let snap = state.current.load_full();
    if snap.paths.is_none() {
        return Err(AppError::NotReady("no world loaded".into()));
    }
    Ok((
        StatusCode::OK,
        Json(json!({
            "ready": true,
            "transports": snap.catalog.len(),
            "banks": snap.banks.len(),
            "loaded_at_unix": snap.loaded_at_unix,
        })),
    )
        .into_response())
}

pub async fn version() -> impl IntoResponse {
    let svc_version = env!("CARGO_PKG_VERSION");
    let core_version = tilewalk_core::version();
    (StatusCode::OK, Json(json!({"service_version": svc_version, "core_version": core_version})))
}

fn ready(snap: &WorldSnapshot) -> Result<Arc<PathfindingService>, AppError> {
    snap.paths.clone().ok_or_else(|| AppError::NotReady("no world loaded".into()))
}

/// Searches run on the blocking pool; the pathfinder is synchronous.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| AppError::Internal(e.into()))
}

pub async fn find_path(
    State(state): State<AppState>,
    Query(params): Query<FindPathQuery>,
    Json(req): Json<FindPathRequest>,
) -> Result<Response, AppError> {
    let goals = req.all_goals();
    if goals.is_empty() {
        return Err(AppError::BadRequest("no goal given".into()));
    }
    let span = info_span!("find_path", start = %req.start, goals = goals.len());
    let snap = state.current.load_full();
    let paths = ready(&snap)?;
    let catalog = match req.profile.as_ref() {
        Some(profile) => Arc::new(snap.catalog.usable_by(profile)),
        None => Arc::clone(&snap.catalog),
    };
    let profile = req.profile.clone().unwrap_or_default();
    let start = req.start;

    let response = blocking(move || {
        let _enter = span.enter();
        let goal_set: HashSet<TilePosition> = goals.iter().copied().collect();
        let path = paths.compute_with(start, &goal_set, &catalog);
        let found = path.last().map_or(false, |last| goal_set.contains(&last));
        let transports = route_analysis::transports_for_path(&catalog, &path, 0, None);
        let missing_items = route_analysis::missing_items(&transports, &profile);
        FindPathResponse { found, length: path.len(), path, transports, missing_items }
    })
    .await?;

    info!(found = response.found, path_len = response.length, transports = response.transports.len(), "find_path done");
    if params.only_transports {
        return Ok((StatusCode::OK, Json(response.transports)).into_response());
    }
    Ok((StatusCode::OK, Json(response)).into_response())
}

pub async fn can_reach(
    State(state): State<AppState>,
    Json(req): Json<CanReachRequest>,
) -> Result<Json<CanReachResponse>, AppError> {
    if req.size_x < 1 || req.size_y < 1 {
        return Err(AppError::BadRequest("object size must be at least 1x1".into()));
    }
    let snap = state.current.load_full();
    let paths = ready(&snap)?;
    let catalog: Arc<TransportCatalog> = match req.profile.as_ref() {
        Some(profile) => Arc::new(snap.catalog.usable_by(profile)),
        None => Arc::clone(&snap.catalog),
    };

    let resp = blocking(move || {
        if req.start == req.target {
            return CanReachResponse { reachable: true, total_tiles: Some(1) };
        }
        let path = paths.compute_with(req.start, &HashSet::from([req.target]), &catalog);
        let reachable = route_analysis::path_reaches_area(&path, req.target, req.size_x, req.size_y, 2, 2);
        let tiles = route_analysis::total_tiles(&path, req.target);
        CanReachResponse { reachable, total_tiles: (tiles != i32::MAX).then_some(tiles) }
    })
    .await?;
    Ok(Json(resp))
}

pub async fn compare_routes(
    State(state): State<AppState>,
    Json(req): Json<CompareRoutesRequest>,
) -> Result<Json<CompareRoutesResponse>, AppError> {
    let snap = state.current.load_full();
    let paths = ready(&snap)?;
    let catalog = Arc::clone(&snap.catalog);
    let banks = Arc::clone(&snap.banks);

    let report = blocking(move || {
        let advisor = RouteAdvisor::new(&paths, &catalog, &banks);
        advisor.compare(req.start, req.target, &req.carried, &req.banked)
    })
    .await?;
    info!(direct = report.direct_distance(), banking = report.banking_distance(), "compare_routes done");
    Ok(Json(report.into()))
}

pub async fn reload(State(state): State<AppState>) -> Result<Response, AppError> {
    let reloaded = blocking({
        let state = state.clone();
        move || state.reload()
    })
    .await?;
    match reloaded {
        Ok(snap) => {
            info!(transports = snap.catalog.len(), "snapshot reloaded");
            Ok((
                StatusCode::OK,
                Json(json!({
                    "reloaded": true,
                    "ready": snap.paths.is_some(),
                    "transports": snap.catalog.len(),
                    "loaded_at_unix": snap.loaded_at_unix,
                })),
            )
                .into_response())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "reload failed, keeping previous snapshot");
            Err(AppError::Internal(e))
        }
    }
}
