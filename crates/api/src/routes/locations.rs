//! Read-only region and comuna lookups.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::RegionId;
use domain::{Comuna, Region};
use serde::Serialize;
use services::{ComunaView, RegionWithComunas};
use store::Store;

use super::parse_id;
use crate::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct RegionResponse {
    #[serde(flatten)]
    pub region: Region,
    pub comunas: Vec<Comuna>,
}

#[derive(Serialize)]
pub struct ComunaResponse {
    #[serde(flatten)]
    pub comuna: Comuna,
    pub region_name: String,
}

impl From<RegionWithComunas> for RegionResponse {
    fn from(value: RegionWithComunas) -> Self {
        Self {
            region: value.region,
            comunas: value.comunas,
        }
    }
}

impl From<ComunaView> for ComunaResponse {
    fn from(value: ComunaView) -> Self {
        Self {
            comuna: value.comuna,
            region_name: value.region_name,
        }
    }
}

fn comuna_responses(views: Vec<ComunaView>) -> Json<Vec<ComunaResponse>> {
    Json(views.into_iter().map(ComunaResponse::from).collect())
}

/// GET /locations/regions: active regions, north to south.
pub async fn regions<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<Region>>, ApiError> {
    Ok(Json(state.locations.regions().await?))
}

/// GET /locations/regions/full: regions with their comunas.
pub async fn regions_full<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<RegionResponse>>, ApiError> {
    let regions = state.locations.regions_with_comunas().await?;
    Ok(Json(regions.into_iter().map(RegionResponse::from).collect()))
}

pub async fn region<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<RegionResponse>, ApiError> {
    let id: RegionId = parse_id(&id)?;
    Ok(Json(state.locations.region(id).await?.into()))
}

pub async fn region_comunas<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ComunaResponse>>, ApiError> {
    let id: RegionId = parse_id(&id)?;
    Ok(comuna_responses(state.locations.comunas_of_region(id).await?))
}

pub async fn comunas<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ComunaResponse>>, ApiError> {
    Ok(comuna_responses(state.locations.comunas().await?))
}
