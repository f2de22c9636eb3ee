pub mod entity;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /entites                          list (GET), save (POST)
/// /entites/{nom}                    load (GET), delete (DELETE)
/// /entites/{nom}/cadre              recomputed frame parameters (GET)
/// /entites/{nom}/zones/{zone_id}    update (PUT), delete (DELETE)
///
/// /detecter-etiquettes              run a detection pass (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(entity::router())
}
