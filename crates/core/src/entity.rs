//! Entity and zone data model.
//!
//! An entity is a named document template: a reference image, an
//! ordered set of OCR zones, and an optional reference frame. The
//! persisted JSON keeps the historical French field names (`nom`,
//! `valeurs_attendues`, `cadre_reference`, …).
//!
//! Coordinate-space invariant: when `cadre_reference` is present, all
//! persisted zone coordinates are frame-relative; when absent they are
//! image-relative. The space is uniform per entity and exposed
//! explicitly as [`CoordinateSpace`], never inferred from
//! coordinate magnitudes.

use serde::{Deserialize, Serialize};

use crate::anchor::ReferenceFrame;
use crate::error::CoreError;
use crate::geometry::Rect;
use crate::media::ImageDimensions;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Minimum width/height of a freshly drawn zone, in host drawing-space
/// units (canvas pixels). Enforced by interactive callers at creation
/// time; persisted zones are not re-checked against it.
pub const MIN_ZONE_DRAW_SIZE: f64 = 10.0;

/// Maximum length of an entity or zone name.
pub const MAX_NAME_LENGTH: usize = 128;

// ---------------------------------------------------------------------------
// Zone kind
// ---------------------------------------------------------------------------

/// What a zone's content is expected to be.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    #[default]
    Text,
    Qrcode,
    Barcode,
}

impl ZoneKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Qrcode => "qrcode",
            Self::Barcode => "barcode",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "qrcode" => Some(Self::Qrcode),
            "barcode" => Some(Self::Barcode),
            _ => None,
        }
    }

    /// All valid zone kind strings.
    pub const ALL: &'static [&'static str] = &["text", "qrcode", "barcode"];
}

impl std::fmt::Display for ZoneKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Coordinate space
// ---------------------------------------------------------------------------

/// The coordinate space a set of zone rectangles is expressed in.
///
/// Uniform per entity: frame-relative exactly when a reference frame is
/// configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Fractions of the whole image's width/height.
    ImageRelative,
    /// Fractions of the reference frame's width/height.
    FrameRelative,
}

impl CoordinateSpace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImageRelative => "image_relative",
            Self::FrameRelative => "frame_relative",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "image_relative" => Some(Self::ImageRelative),
            "frame_relative" => Some(Self::FrameRelative),
            _ => None,
        }
    }
}

impl std::fmt::Display for CoordinateSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Zone
// ---------------------------------------------------------------------------

/// A rectangular extraction zone on a document template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Unique within the owning entity. Zero means "not yet assigned";
    /// [`Entity::assign_zone_ids`] fills it in before a save.
    #[serde(default)]
    pub id: DbId,

    #[serde(rename = "nom")]
    pub name: String,

    /// `[x1, y1, x2, y2]`, image-relative or frame-relative per the
    /// owning entity's [`CoordinateSpace`].
    pub coords: Rect,

    #[serde(rename = "type", default)]
    pub kind: ZoneKind,

    /// OCR language hint (e.g. `fra`, `ara+fra`). Carried through
    /// untouched; irrelevant to geometry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,

    /// OCR preprocessing hint. Carried through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocess: Option<String>,

    /// Accepted content values, a validation hint for OCR consumers.
    #[serde(
        rename = "valeurs_attendues",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub expected_values: Option<Vec<String>>,
}

impl Zone {
    /// Return a copy of this zone with different coordinates. Used by
    /// the frame transform so authored coordinates are never mutated in
    /// place.
    pub fn with_coords(&self, coords: Rect) -> Self {
        Self {
            coords,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Entity
// ---------------------------------------------------------------------------

/// Persisted metadata block, refreshed at save time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub nombre_zones: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,
}

/// A named document template with its zones and optional frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "nom")]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(
        rename = "date_creation",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<Timestamp>,

    #[serde(
        rename = "image_reference",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_image_path: Option<String>,

    #[serde(default)]
    pub zones: Vec<Zone>,

    #[serde(
        rename = "cadre_reference",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub reference_frame: Option<ReferenceFrame>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EntityMetadata>,
}

impl Entity {
    /// The space the entity's persisted zone coordinates are in.
    pub fn coordinate_space(&self) -> CoordinateSpace {
        if self.reference_frame.is_some() {
            CoordinateSpace::FrameRelative
        } else {
            CoordinateSpace::ImageRelative
        }
    }

    /// Assign identifiers to zones submitted without one (id 0). Fresh
    /// ids start above the highest id already in use, so existing zone
    /// references stay valid.
    pub fn assign_zone_ids(&mut self) {
        let mut next = self.zones.iter().map(|z| z.id).max().unwrap_or(0) + 1;
        for zone in &mut self.zones {
            if zone.id == 0 {
                zone.id = next;
                next += 1;
            }
        }
    }

    /// Validate the entity for saving: non-empty name, at least one
    /// zone, unique zone names and ids, finite normalized zone
    /// rectangles.
    pub fn validate_for_save(&self) -> Result<(), CoreError> {
        validate_entity_name(&self.name)?;

        if self.zones.is_empty() {
            return Err(CoreError::Validation(
                "An entity must have at least one zone".to_string(),
            ));
        }

        let mut seen_names = std::collections::HashSet::new();
        let mut seen_ids = std::collections::HashSet::new();
        for zone in &self.zones {
            validate_zone_name(&zone.name)?;
            if !seen_names.insert(zone.name.as_str()) {
                return Err(CoreError::Conflict(format!(
                    "Duplicate zone name '{}'",
                    zone.name
                )));
            }
            // Zone ids address zones in update and delete requests; a
            // duplicate would make the later zone unreachable.
            if !seen_ids.insert(zone.id) {
                return Err(CoreError::Conflict(format!(
                    "Duplicate zone id {}",
                    zone.id
                )));
            }
            validate_zone_rect(&zone.coords)?;
        }

        Ok(())
    }

    /// Refresh the persisted metadata block (zone count and reference
    /// image dimensions).
    pub fn refresh_metadata(&mut self, image_dimensions: Option<ImageDimensions>) {
        self.metadata = Some(EntityMetadata {
            nombre_zones: self.zones.len(),
            image_dimensions,
        });
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate an entity name: non-empty and within length limits.
pub fn validate_entity_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Entity name cannot be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Entity name exceeds maximum length of {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a zone name: non-empty and within length limits.
pub fn validate_zone_name(name: &str) -> Result<(), CoreError> {
    if name.trim().is_empty() {
        return Err(CoreError::Validation(
            "Zone name cannot be empty".to_string(),
        ));
    }
    if name.len() > MAX_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Zone name exceeds maximum length of {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Validate a zone rectangle: finite, with `x1 <= x2` and `y1 <= y2`.
pub fn validate_zone_rect(rect: &Rect) -> Result<(), CoreError> {
    if !rect.is_finite() {
        return Err(CoreError::InvalidGeometry(
            "Zone coordinates must be finite".to_string(),
        ));
    }
    if rect.x1 > rect.x2 || rect.y1 > rect.y2 {
        return Err(CoreError::InvalidGeometry(format!(
            "Zone corners are not normalized: ({}, {}, {}, {})",
            rect.x1, rect.y1, rect.x2, rect.y2
        )));
    }
    Ok(())
}

/// Check a freshly drawn zone against the minimum drawing-space size.
///
/// `width`/`height` are in host drawing-space units (canvas pixels).
pub fn validate_drawn_size(width: f64, height: f64) -> Result<(), CoreError> {
    if width <= MIN_ZONE_DRAW_SIZE || height <= MIN_ZONE_DRAW_SIZE {
        return Err(CoreError::Validation(format!(
            "Zone too small: must exceed {MIN_ZONE_DRAW_SIZE} drawing units per side"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn zone(id: DbId, name: &str) -> Zone {
        Zone {
            id,
            name: name.to_string(),
            coords: Rect::new(0.1, 0.1, 0.4, 0.2),
            kind: ZoneKind::Text,
            lang: None,
            preprocess: None,
            expected_values: None,
        }
    }

    fn entity_with_zones(zones: Vec<Zone>) -> Entity {
        Entity {
            name: "passeport_dz".to_string(),
            description: String::new(),
            created_at: None,
            reference_image_path: None,
            zones,
            reference_frame: None,
            metadata: None,
        }
    }

    // -- ZoneKind ----------------------------------------------------------

    #[test]
    fn zone_kind_round_trip() {
        for s in ZoneKind::ALL {
            let kind = ZoneKind::from_str(s).unwrap();
            assert_eq!(kind.as_str(), *s);
        }
    }

    #[test]
    fn zone_kind_unknown_returns_none() {
        assert!(ZoneKind::from_str("signature").is_none());
    }

    #[test]
    fn zone_kind_defaults_to_text() {
        assert_eq!(ZoneKind::default(), ZoneKind::Text);
    }

    // -- CoordinateSpace ---------------------------------------------------

    #[test]
    fn coordinate_space_round_trip() {
        for space in [CoordinateSpace::ImageRelative, CoordinateSpace::FrameRelative] {
            assert_eq!(CoordinateSpace::from_str(space.as_str()), Some(space));
        }
    }

    #[test]
    fn space_follows_frame_presence() {
        let mut entity = entity_with_zones(vec![zone(1, "mrz")]);
        assert_eq!(entity.coordinate_space(), CoordinateSpace::ImageRelative);

        entity.reference_frame = Some(ReferenceFrame::default());
        assert_eq!(entity.coordinate_space(), CoordinateSpace::FrameRelative);
    }

    // -- validate_for_save -------------------------------------------------

    #[test]
    fn valid_entity_passes() {
        let entity = entity_with_zones(vec![zone(1, "mrz"), zone(2, "photo")]);
        assert!(entity.validate_for_save().is_ok());
    }

    #[test]
    fn empty_name_rejected() {
        let mut entity = entity_with_zones(vec![zone(1, "mrz")]);
        entity.name = "  ".to_string();
        assert_matches!(entity.validate_for_save(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn no_zones_rejected() {
        let entity = entity_with_zones(Vec::new());
        let err = entity.validate_for_save().unwrap_err();
        assert!(err.to_string().contains("at least one zone"));
    }

    #[test]
    fn duplicate_zone_names_rejected() {
        let entity = entity_with_zones(vec![zone(1, "mrz"), zone(2, "mrz")]);
        assert_matches!(entity.validate_for_save(), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn duplicate_zone_ids_rejected() {
        // Updates and deletes address zones by id; two zones sharing
        // one would leave the second unreachable.
        let entity = entity_with_zones(vec![zone(7, "mrz"), zone(7, "photo")]);
        assert_matches!(entity.validate_for_save(), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn empty_zone_name_rejected() {
        let entity = entity_with_zones(vec![zone(1, "")]);
        assert_matches!(entity.validate_for_save(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn non_finite_zone_coords_rejected() {
        let mut bad = zone(1, "mrz");
        bad.coords = Rect::new(0.0, 0.0, f64::NAN, 0.5);
        let entity = entity_with_zones(vec![bad]);
        assert_matches!(
            entity.validate_for_save(),
            Err(CoreError::InvalidGeometry(_))
        );
    }

    #[test]
    fn inverted_zone_coords_rejected() {
        let mut bad = zone(1, "mrz");
        bad.coords = Rect::new(0.9, 0.1, 0.2, 0.3);
        let entity = entity_with_zones(vec![bad]);
        assert_matches!(
            entity.validate_for_save(),
            Err(CoreError::InvalidGeometry(_))
        );
    }

    // -- assign_zone_ids ---------------------------------------------------

    #[test]
    fn assign_zone_ids_fills_unassigned_above_existing_max() {
        let mut entity = entity_with_zones(vec![zone(0, "mrz"), zone(5, "photo"), zone(0, "numero")]);
        entity.assign_zone_ids();

        assert_eq!(entity.zones[0].id, 6);
        assert_eq!(entity.zones[1].id, 5);
        assert_eq!(entity.zones[2].id, 7);
        assert!(entity.validate_for_save().is_ok());
    }

    #[test]
    fn assign_zone_ids_leaves_assigned_ids_untouched() {
        let mut entity = entity_with_zones(vec![zone(1, "mrz"), zone(2, "photo")]);
        entity.assign_zone_ids();
        assert_eq!(entity.zones[0].id, 1);
        assert_eq!(entity.zones[1].id, 2);
    }

    // -- validate_drawn_size -----------------------------------------------

    #[test]
    fn drawn_size_above_minimum_accepted() {
        assert!(validate_drawn_size(11.0, 40.0).is_ok());
    }

    #[test]
    fn drawn_size_at_or_below_minimum_rejected() {
        assert!(validate_drawn_size(10.0, 40.0).is_err());
        assert!(validate_drawn_size(40.0, 4.0).is_err());
    }

    // -- refresh_metadata --------------------------------------------------

    #[test]
    fn refresh_metadata_counts_zones() {
        let mut entity = entity_with_zones(vec![zone(1, "mrz"), zone(2, "photo")]);
        entity.refresh_metadata(Some(ImageDimensions { width: 800, height: 600 }));

        let meta = entity.metadata.unwrap();
        assert_eq!(meta.nombre_zones, 2);
        assert_eq!(meta.image_dimensions.unwrap().width, 800);
    }

    // -- serde wire shape --------------------------------------------------

    #[test]
    fn zone_serializes_with_french_keys() {
        let mut z = zone(7, "numero");
        z.expected_values = Some(vec!["A".to_string(), "B".to_string()]);
        let json = serde_json::to_value(&z).unwrap();

        assert_eq!(json["nom"], "numero");
        assert_eq!(json["type"], "text");
        assert_eq!(json["coords"], serde_json::json!([0.1, 0.1, 0.4, 0.2]));
        assert_eq!(json["valeurs_attendues"], serde_json::json!(["A", "B"]));
        // Unset OCR hints are omitted.
        assert!(json.get("lang").is_none());
        assert!(json.get("preprocess").is_none());
    }

    #[test]
    fn zone_deserializes_with_defaults() {
        // Minimal persisted zone: no id, no type, no hints.
        let json = serde_json::json!({
            "nom": "mrz",
            "coords": [0.05, 0.8, 0.95, 0.95]
        });
        let z: Zone = serde_json::from_value(json).unwrap();
        assert_eq!(z.id, 0);
        assert_eq!(z.kind, ZoneKind::Text);
        assert!(z.expected_values.is_none());
    }

    #[test]
    fn entity_round_trips_through_json() {
        let mut entity = entity_with_zones(vec![zone(1, "mrz")]);
        entity.description = "Passeport algérien".to_string();
        entity.reference_frame = Some(ReferenceFrame::default());
        entity.refresh_metadata(None);

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["nom"], "passeport_dz");
        assert!(json.get("cadre_reference").is_some());

        let back: Entity = serde_json::from_value(json).unwrap();
        assert_eq!(back, entity);
    }
}
