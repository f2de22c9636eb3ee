//! Legacy reference-frame migration.
//!
//! Two older persisted schemas predate the four-anchor frame:
//!
//! - the combined `gauche_bas` anchor (one landmark encoding both the
//!   left X and the bottom Y), alongside `haut` and `droite`;
//! - the oldest `origine`/`largeur`/`hauteur` scheme.
//!
//! [`migrate_frame`] upgrades either into the canonical four-anchor
//! [`ReferenceFrame`], exactly once at load time. Detection is purely
//! structural (which keys are present), never a version number. When
//! current and legacy keys coexist, current keys win and legacy keys
//! are ignored. Ambiguity never blocks a load: missing information is
//! filled with directional defaults and surfaced as warnings.

use serde::{Deserialize, Serialize};

use crate::anchor::{AbsoluteDimensions, Anchor, AnchorDirection, ReferenceFrame};
use crate::geometry::Point;
use crate::media::ImageDimensions;

// ---------------------------------------------------------------------------
// Raw persisted shape
// ---------------------------------------------------------------------------

/// A persisted `cadre_reference` document as found on disk, current and
/// legacy keys all optional. This is the input to [`migrate_frame`];
/// current logic never writes the legacy keys back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub haut: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub droite: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gauche: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bas: Option<Anchor>,

    /// Combined left-bottom anchor from the 3-anchor scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gauche_bas: Option<Anchor>,

    /// Oldest scheme: origin / width / height anchors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origine: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub largeur: Option<Anchor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hauteur: Option<Anchor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_dimensions: Option<ImageDimensions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions_absolues: Option<AbsoluteDimensions>,
}

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Non-blocking findings surfaced during migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationWarning {
    /// The combined `gauche_bas` anchor was split into independent left
    /// and bottom anchors, both inheriting its label set. The detector
    /// may now match the same landmark for both.
    CombinedAnchorSplit,

    /// The `origine`/`largeur`/`hauteur` scheme was converted; the
    /// mapping is approximate since the old scheme never captured true
    /// left/bottom landmarks.
    LegacyOriginScheme,

    /// An anchor could not be reconstructed from the legacy data and
    /// was set to its directional default.
    AnchorDefaulted(AnchorDirection),
}

impl std::fmt::Display for MigrationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CombinedAnchorSplit => write!(
                f,
                "combined gauche_bas anchor split into gauche and bas; \
                 both share its labels"
            ),
            Self::LegacyOriginScheme => write!(
                f,
                "obsolete origine/largeur/hauteur frame converted; \
                 positions are approximate and should be verified"
            ),
            Self::AnchorDefaulted(direction) => write!(
                f,
                "anchor '{direction}' missing from legacy data; \
                 using its default edge position"
            ),
        }
    }
}

/// Result of a frame migration: the canonical frame plus any warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationOutcome {
    pub frame: ReferenceFrame,
    pub warnings: Vec<MigrationWarning>,
}

// ---------------------------------------------------------------------------
// Migration
// ---------------------------------------------------------------------------

/// Upgrade a raw persisted frame into the four-anchor model.
///
/// Never fails; see the module docs for the scheme-detection rules.
pub fn migrate_frame(data: FrameData) -> MigrationOutcome {
    let mut warnings = Vec::new();

    let has_current = data.haut.is_some()
        || data.droite.is_some()
        || data.gauche.is_some()
        || data.bas.is_some();

    // A lone gauche_bas still identifies the 3-anchor scheme; its
    // labels must survive the split even when haut/droite are missing.
    let (top, right, left, bottom) = if has_current || data.gauche_bas.is_some() {
        let top = take_or_default(data.haut, AnchorDirection::Top, &mut warnings);
        let right = take_or_default(data.droite, AnchorDirection::Right, &mut warnings);

        let (left, bottom) = if data.gauche.is_some() || data.bas.is_some() {
            // Current format; any legacy keys are ignored.
            (
                take_or_default(data.gauche, AnchorDirection::Left, &mut warnings),
                take_or_default(data.bas, AnchorDirection::Bottom, &mut warnings),
            )
        } else if let Some(combined) = data.gauche_bas {
            warnings.push(MigrationWarning::CombinedAnchorSplit);
            split_combined_anchor(&combined)
        } else {
            (
                take_or_default(None, AnchorDirection::Left, &mut warnings),
                take_or_default(None, AnchorDirection::Bottom, &mut warnings),
            )
        };

        (top, right, left, bottom)
    } else if data.origine.is_some() || data.largeur.is_some() || data.hauteur.is_some() {
        warnings.push(MigrationWarning::LegacyOriginScheme);

        let top = take_or_default(data.origine, AnchorDirection::Top, &mut warnings);
        let right = take_or_default(data.largeur, AnchorDirection::Right, &mut warnings);

        // The old scheme never captured a left landmark; the left anchor
        // gets its default with no labels. The height anchor becomes the
        // bottom anchor wholesale.
        let left = Anchor::default_for(AnchorDirection::Left);
        let bottom = take_or_default(data.hauteur, AnchorDirection::Bottom, &mut warnings);

        (top, right, left, bottom)
    } else {
        // Present but empty frame document: all defaults.
        for direction in AnchorDirection::ALL {
            warnings.push(MigrationWarning::AnchorDefaulted(direction));
        }
        (
            Anchor::default_for(AnchorDirection::Top),
            Anchor::default_for(AnchorDirection::Right),
            Anchor::default_for(AnchorDirection::Left),
            Anchor::default_for(AnchorDirection::Bottom),
        )
    };

    MigrationOutcome {
        frame: ReferenceFrame {
            top,
            right,
            left,
            bottom,
            image_base_dimensions: data.image_base_dimensions,
            dimensions_absolues: data.dimensions_absolues,
        },
        warnings,
    }
}

/// Use the anchor if present; otherwise its directional default, with a
/// warning.
fn take_or_default(
    anchor: Option<Anchor>,
    direction: AnchorDirection,
    warnings: &mut Vec<MigrationWarning>,
) -> Anchor {
    match anchor {
        Some(a) => a,
        None => {
            warnings.push(MigrationWarning::AnchorDefaulted(direction));
            Anchor::default_for(direction)
        }
    }
}

/// Split a combined left-bottom anchor: left keeps its X (Y defaulted
/// to the edge midpoint), bottom keeps its Y (X defaulted). Both
/// inherit the combined label set; there is no information to decide
/// which labels belonged to which edge.
fn split_combined_anchor(combined: &Anchor) -> (Anchor, Anchor) {
    let left = Anchor {
        labels: combined.labels.clone(),
        position_base: Point::new(combined.position_base.x, 0.5),
        template_coords: None,
        detected_bbox: None,
    };
    let bottom = Anchor {
        labels: combined.labels.clone(),
        position_base: Point::new(0.5, combined.position_base.y),
        template_coords: None,
        detected_bbox: None,
    };
    (left, bottom)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
