//! Entity row model and DTOs.
//!
//! Zones and the reference frame live in JSONB columns; this module
//! owns the boundary between rows and the domain model, including the
//! legacy-format migration that runs on every load.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use cadrage_core::entity::{Entity, EntityMetadata, Zone};
use cadrage_core::migration::{migrate_frame, FrameData, MigrationWarning};
use cadrage_core::types::{DbId, Timestamp};
use cadrage_core::CoreError;

/// A row from the `entities` table.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EntityRow {
    pub id: DbId,
    pub nom: String,
    pub description: Option<String>,
    pub image_reference: Option<String>,
    pub zones: serde_json::Value,
    pub cadre_reference: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An entity hydrated from a row, with any migration warnings the
/// stored frame document produced.
#[derive(Debug, Clone)]
pub struct LoadedEntity {
    pub id: DbId,
    pub entity: Entity,
    pub warnings: Vec<MigrationWarning>,
}

impl EntityRow {
    /// Hydrate the domain entity.
    ///
    /// The stored frame document may be in a legacy shape (combined
    /// `gauche_bas` anchor, or the `origine`/`largeur`/`hauteur`
    /// scheme); it is migrated to the current four-anchor form here, so
    /// callers only ever see current-format frames.
    pub fn into_domain(self) -> Result<LoadedEntity, CoreError> {
        let zones: Vec<Zone> = serde_json::from_value(self.zones).map_err(|e| {
            CoreError::Internal(format!("stored zones for '{}' are malformed: {e}", self.nom))
        })?;

        let metadata: Option<EntityMetadata> = match self.metadata {
            Some(value) => serde_json::from_value(value).map_err(|e| {
                CoreError::Internal(format!(
                    "stored metadata for '{}' is malformed: {e}",
                    self.nom
                ))
            })?,
            None => None,
        };

        let (reference_frame, warnings) = match self.cadre_reference {
            Some(value) => {
                let data: FrameData = serde_json::from_value(value).map_err(|e| {
                    CoreError::Internal(format!(
                        "stored frame for '{}' is malformed: {e}",
                        self.nom
                    ))
                })?;
                let outcome = migrate_frame(data);
                (Some(outcome.frame), outcome.warnings)
            }
            None => (None, Vec::new()),
        };

        Ok(LoadedEntity {
            id: self.id,
            entity: Entity {
                name: self.nom,
                description: self.description.unwrap_or_default(),
                created_at: Some(self.created_at),
                reference_image_path: self.image_reference,
                zones,
                reference_frame,
                metadata,
            },
            warnings,
        })
    }
}

/// Column values for inserting or replacing an entity.
#[derive(Debug, Clone, Deserialize)]
pub struct UpsertEntity {
    pub nom: String,
    pub description: Option<String>,
    pub image_reference: Option<String>,
    pub zones: serde_json::Value,
    pub cadre_reference: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
}

impl UpsertEntity {
    /// Serialize a domain entity into column values.
    pub fn from_entity(entity: &Entity) -> Result<Self, CoreError> {
        let zones = serde_json::to_value(&entity.zones)
            .map_err(|e| CoreError::Internal(format!("failed to serialize zones: {e}")))?;
        let cadre_reference = entity
            .reference_frame
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| CoreError::Internal(format!("failed to serialize frame: {e}")))?;
        let metadata = entity
            .metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| CoreError::Internal(format!("failed to serialize metadata: {e}")))?;

        Ok(Self {
            nom: entity.name.clone(),
            description: if entity.description.is_empty() {
                None
            } else {
                Some(entity.description.clone())
            },
            image_reference: entity.reference_image_path.clone(),
            zones,
            cadre_reference,
            metadata,
        })
    }
}

/// Summary row for listings: everything except the JSONB payloads.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct EntitySummaryRow {
    pub id: DbId,
    pub nom: String,
    pub description: Option<String>,
    pub nombre_zones: i64,
    pub created_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use cadrage_core::anchor::{AnchorDirection, ReferenceFrame};
    use cadrage_core::geometry::Rect;

    fn row(zones: serde_json::Value, cadre: Option<serde_json::Value>) -> EntityRow {
        EntityRow {
            id: 1,
            nom: "passeport_dz".to_string(),
            description: Some("Passeport algérien".to_string()),
            image_reference: Some("passeport_dz.png".to_string()),
            zones,
            cadre_reference: cadre,
            metadata: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn row_without_frame_hydrates_image_relative() {
        let zones = serde_json::json!([
            { "nom": "mrz", "coords": [0.05, 0.8, 0.95, 0.95] }
        ]);
        let loaded = row(zones, None).into_domain().unwrap();

        assert!(loaded.entity.reference_frame.is_none());
        assert!(loaded.warnings.is_empty());
        assert_eq!(loaded.entity.zones.len(), 1);
        assert_eq!(loaded.entity.zones[0].coords, Rect::new(0.05, 0.8, 0.95, 0.95));
    }

    #[test]
    fn current_format_frame_hydrates_without_warnings() {
        let cadre = serde_json::to_value(ReferenceFrame::default()).unwrap();
        let loaded = row(serde_json::json!([]), Some(cadre))
            .into_domain()
            .unwrap();
        assert!(loaded.warnings.is_empty());
        assert!(loaded.entity.reference_frame.is_some());
    }

    #[test]
    fn legacy_combined_anchor_is_migrated_on_load() {
        let cadre = serde_json::json!({
            "haut": { "labels": [], "position_base": [0.5, 0.1] },
            "droite": { "labels": [], "position_base": [0.9, 0.5] },
            "gauche_bas": { "labels": ["PIED"], "position_base": [0.1, 0.9] }
        });
        let loaded = row(serde_json::json!([]), Some(cadre))
            .into_domain()
            .unwrap();

        let frame = loaded.entity.reference_frame.unwrap();
        assert_eq!(
            frame.anchor(AnchorDirection::Left).position_base.x,
            0.1
        );
        assert_eq!(
            frame.anchor(AnchorDirection::Bottom).position_base.y,
            0.9
        );
        assert!(!loaded.warnings.is_empty());
    }

    #[test]
    fn malformed_zones_is_an_internal_error() {
        let result = row(serde_json::json!({ "not": "a list" }), None).into_domain();
        assert!(matches!(result, Err(CoreError::Internal(_))));
    }

    #[test]
    fn upsert_round_trips_entity_payloads() {
        let entity = Entity {
            name: "cni".to_string(),
            description: String::new(),
            created_at: None,
            reference_image_path: None,
            zones: vec![Zone {
                id: 1,
                name: "numero".to_string(),
                coords: Rect::new(0.1, 0.1, 0.5, 0.2),
                kind: Default::default(),
                lang: None,
                preprocess: None,
                expected_values: None,
            }],
            reference_frame: Some(ReferenceFrame::default()),
            metadata: None,
        };

        let upsert = UpsertEntity::from_entity(&entity).unwrap();
        assert_eq!(upsert.nom, "cni");
        assert!(upsert.description.is_none());
        assert!(upsert.cadre_reference.is_some());

        let zones: Vec<Zone> = serde_json::from_value(upsert.zones).unwrap();
        assert_eq!(zones, entity.zones);
    }
}
