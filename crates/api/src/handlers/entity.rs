//! Handlers for document templates (entities) and their zones.
//!
//! Coordinate-space contract: zones are persisted frame-relative when
//! the entity has a reference frame and image-relative otherwise. The
//! HTTP surface always speaks image-relative coordinates by default;
//! the conversions happen here at the boundary, never in storage or in
//! the client.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use cadrage_core::entity::{validate_zone_name, validate_zone_rect, CoordinateSpace, Entity};
use cadrage_core::error::CoreError;
use cadrage_core::frame::{from_frame_space, to_frame_space, zones_from_frame_space, zones_to_frame_space};
use cadrage_core::geometry::Rect;
use cadrage_core::media;
use cadrage_core::types::DbId;
use cadrage_db::models::entity::{LoadedEntity, UpsertEntity};
use cadrage_db::repositories::EntityRepo;

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/* --------------------------------------------------------------------------
   Payloads
   -------------------------------------------------------------------------- */

/// Optional query filters for loading an entity.
#[derive(Debug, Deserialize)]
pub struct LoadFilters {
    /// Requested coordinate space for the returned zones. Defaults to
    /// image-relative, the space interactive editors work in.
    pub espace: Option<CoordinateSpace>,
}

/// An entity as returned by the API, with the space of its zone
/// coordinates stated explicitly.
#[derive(Debug, Serialize)]
pub struct EntityPayload {
    #[serde(flatten)]
    pub entity: Entity,
    pub espace_coordonnees: CoordinateSpace,
    /// Human-readable notes from the legacy frame migration, when the
    /// stored document needed one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub avertissements: Vec<String>,
}

/// Summary returned after a save.
#[derive(Debug, Serialize)]
pub struct SaveSummary {
    pub nom: String,
    pub nombre_zones: usize,
    pub espace_coordonnees: CoordinateSpace,
}

/// Body for updating a single zone. Coordinates are image-relative.
#[derive(Debug, Deserialize)]
pub struct UpdateZone {
    pub nom: Option<String>,
    pub coords: Option<Rect>,
}

/* --------------------------------------------------------------------------
   Handlers
   -------------------------------------------------------------------------- */

/// GET /entites
///
/// List entity summaries, newest first.
pub async fn list_entities(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let entities = EntityRepo::list(&state.pool).await?;
    Ok(Json(DataResponse { data: entities }))
}

/// POST /entites
///
/// Save an entity (create or overwrite by name). The submitted zone
/// coordinates are image-relative; when a reference frame is present
/// they are converted to frame space before persisting, so the stored
/// coordinates survive recalibration of the frame.
pub async fn save_entity(
    State(state): State<AppState>,
    Json(mut entity): Json<Entity>,
) -> AppResult<impl IntoResponse> {
    entity.assign_zone_ids();
    entity.validate_for_save()?;

    // Resolve the reference image's pixel dimensions when the file is
    // visible to the server. Absence is tolerated; the frame then
    // reports zero-pixel absolute dimensions.
    let image_dimensions = entity
        .reference_image_path
        .as_ref()
        .and_then(|path| media::read_image_dimensions(&state.config.upload_dir.join(path)).ok());

    if let Some(frame) = entity.reference_frame.as_mut() {
        if image_dimensions.is_some() {
            frame.image_base_dimensions = image_dimensions;
        }
        frame.refresh_absolute_dimensions();

        let params = frame.compute_frame();
        if params.is_degenerate() {
            tracing::warn!(
                entity = %entity.name,
                "Reference frame extent collapsed, treating it as the full image"
            );
        }
        entity.zones = zones_to_frame_space(&entity.zones, Some(&params));
    }

    entity.refresh_metadata(image_dimensions);

    let input = UpsertEntity::from_entity(&entity)?;
    let row = EntityRepo::upsert(&state.pool, &input).await?;

    tracing::info!(
        entity = %row.nom,
        zones = entity.zones.len(),
        space = %entity.coordinate_space(),
        "Entity saved"
    );

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: SaveSummary {
                nom: entity.name.clone(),
                nombre_zones: entity.zones.len(),
                espace_coordonnees: entity.coordinate_space(),
            },
        }),
    ))
}

/// GET /entites/{nom}
///
/// Load an entity. The stored frame document is migrated from any
/// legacy shape, and zones are converted to the requested coordinate
/// space (image-relative by default, for editing).
pub async fn get_entity(
    State(state): State<AppState>,
    Path(nom): Path<String>,
    Query(filters): Query<LoadFilters>,
) -> AppResult<impl IntoResponse> {
    let loaded = load_entity(&state, &nom).await?;
    let requested = filters.espace.unwrap_or(CoordinateSpace::ImageRelative);

    let mut entity = loaded.entity;
    let params = entity.reference_frame.as_ref().map(|f| f.compute_frame());

    match requested {
        CoordinateSpace::ImageRelative => {
            entity.zones = zones_from_frame_space(&entity.zones, params.as_ref());
        }
        CoordinateSpace::FrameRelative => {
            if params.is_none() {
                return Err(AppError::BadRequest(format!(
                    "Entity '{nom}' has no reference frame; frame-relative coordinates are undefined"
                )));
            }
            // Persisted zones are already frame-relative.
        }
    }

    Ok(Json(DataResponse {
        data: EntityPayload {
            entity,
            espace_coordonnees: requested,
            avertissements: loaded.warnings.iter().map(|w| w.to_string()).collect(),
        },
    }))
}

/// DELETE /entites/{nom}
pub async fn delete_entity(
    State(state): State<AppState>,
    Path(nom): Path<String>,
) -> AppResult<impl IntoResponse> {
    if !EntityRepo::delete(&state.pool, &nom).await? {
        return Err(not_found(&nom));
    }
    tracing::info!(entity = %nom, "Entity deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /entites/{nom}/cadre
///
/// Recomputed frame parameters for an entity. An entity without a
/// reference frame gets the full-image frame.
pub async fn get_frame_params(
    State(state): State<AppState>,
    Path(nom): Path<String>,
) -> AppResult<impl IntoResponse> {
    let loaded = load_entity(&state, &nom).await?;
    let params = loaded
        .entity
        .reference_frame
        .map(|f| f.compute_frame())
        .unwrap_or_else(|| cadrage_core::anchor::ReferenceFrame::default().compute_frame());
    Ok(Json(DataResponse { data: params }))
}

/// PUT /entites/{nom}/zones/{zone_id}
///
/// Rename a zone and/or replace its coordinates. Incoming coordinates
/// are image-relative and stored in the entity's persisted space.
pub async fn update_zone(
    State(state): State<AppState>,
    Path((nom, zone_id)): Path<(String, DbId)>,
    Json(input): Json<UpdateZone>,
) -> AppResult<impl IntoResponse> {
    let loaded = load_entity(&state, &nom).await?;
    let mut entity = loaded.entity;
    let params = entity.reference_frame.as_ref().map(|f| f.compute_frame());

    let position = entity
        .zones
        .iter()
        .position(|z| z.id == zone_id)
        .ok_or_else(|| {
            AppError::Core(CoreError::NotFound {
                entity: "Zone",
                name: zone_id.to_string(),
            })
        })?;

    if let Some(new_name) = &input.nom {
        validate_zone_name(new_name)?;
        if entity
            .zones
            .iter()
            .any(|z| z.id != zone_id && z.name == *new_name)
        {
            return Err(AppError::Core(CoreError::Conflict(format!(
                "Duplicate zone name '{new_name}'"
            ))));
        }
        entity.zones[position].name = new_name.clone();
    }

    if let Some(coords) = input.coords {
        validate_zone_rect(&coords)?;
        entity.zones[position].coords = match params.as_ref() {
            Some(p) => to_frame_space(coords, p),
            None => coords,
        };
    }

    let zones_json = serde_json::to_value(&entity.zones)
        .map_err(|e| AppError::InternalError(format!("failed to serialize zones: {e}")))?;
    EntityRepo::update_zones(&state.pool, &nom, &zones_json)
        .await?
        .ok_or_else(|| not_found(&nom))?;

    // Echo the zone back in image space, the space the caller edits in.
    let stored = &entity.zones[position];
    let echoed = match params.as_ref() {
        Some(p) => stored.with_coords(from_frame_space(stored.coords, p)),
        None => stored.clone(),
    };
    Ok(Json(DataResponse { data: echoed }))
}

/// DELETE /entites/{nom}/zones/{zone_id}
///
/// Remove a zone. The last zone cannot be removed; an entity always
/// keeps at least one.
pub async fn delete_zone(
    State(state): State<AppState>,
    Path((nom, zone_id)): Path<(String, DbId)>,
) -> AppResult<impl IntoResponse> {
    let loaded = load_entity(&state, &nom).await?;
    let mut entity = loaded.entity;

    if !entity.zones.iter().any(|z| z.id == zone_id) {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Zone",
            name: zone_id.to_string(),
        }));
    }
    if entity.zones.len() == 1 {
        return Err(AppError::Core(CoreError::Validation(
            "Cannot delete the last zone of an entity".to_string(),
        )));
    }

    entity.zones.retain(|z| z.id != zone_id);

    let zones_json = serde_json::to_value(&entity.zones)
        .map_err(|e| AppError::InternalError(format!("failed to serialize zones: {e}")))?;
    EntityRepo::update_zones(&state.pool, &nom, &zones_json)
        .await?
        .ok_or_else(|| not_found(&nom))?;

    tracing::info!(entity = %nom, zone_id, "Zone deleted");
    Ok(StatusCode::NO_CONTENT)
}

/* --------------------------------------------------------------------------
   Helpers
   -------------------------------------------------------------------------- */

fn not_found(nom: &str) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Entity",
        name: nom.to_string(),
    })
}

/// Fetch an entity row by name and hydrate it, running the legacy
/// frame migration.
async fn load_entity(state: &AppState, nom: &str) -> AppResult<LoadedEntity> {
    let row = EntityRepo::find_by_name(&state.pool, nom)
        .await?
        .ok_or_else(|| not_found(nom))?;
    let loaded = row.into_domain()?;
    if !loaded.warnings.is_empty() {
        tracing::info!(
            entity = %nom,
            warnings = loaded.warnings.len(),
            "Stored frame document was migrated from a legacy format"
        );
    }
    Ok(loaded)
}
