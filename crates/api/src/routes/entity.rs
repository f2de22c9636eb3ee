//! Route definitions for entities, zones, and detection passes.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{detection, entity};
use crate::state::AppState;

/// Entity and detection routes, mounted under `/api/v1`.
///
/// ```text
/// GET    /entites                          list_entities
/// POST   /entites                          save_entity
/// GET    /entites/{nom}                    get_entity (?espace)
/// DELETE /entites/{nom}                    delete_entity
/// GET    /entites/{nom}/cadre              get_frame_params
/// PUT    /entites/{nom}/zones/{zone_id}    update_zone
/// DELETE /entites/{nom}/zones/{zone_id}    delete_zone
/// POST   /detecter-etiquettes              detect_anchors
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/entites",
            get(entity::list_entities).post(entity::save_entity),
        )
        .route(
            "/entites/{nom}",
            get(entity::get_entity).delete(entity::delete_entity),
        )
        .route("/entites/{nom}/cadre", get(entity::get_frame_params))
        .route(
            "/entites/{nom}/zones/{zone_id}",
            put(entity::update_zone).delete(entity::delete_zone),
        )
        .route("/detecter-etiquettes", post(detection::detect_anchors))
}
