//! Four-anchor reference frame (cadre de référence).
//!
//! A document template carries up to four named anchor landmarks
//! (top, right, left, bottom). Each anchor is located either by text
//! labels or by an image template region; its calibrated position on
//! the reference image defines one edge of an axis-aligned frame. The
//! frame in turn defines the origin and scale for frame-relative zone
//! coordinates (see [`crate::frame`]).
//!
//! Every direction always has an anchor: unconfigured directions sit at
//! the canonical edge midpoints, so the frame degenerates to the full
//! image rather than becoming undefined.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geometry::{Point, Rect};
use crate::media::ImageDimensions;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Below this relative extent a frame dimension is treated as collapsed
/// and replaced by the full-image fallback of `1.0`.
pub const MIN_FRAME_EXTENT: f64 = 1e-3;

// ---------------------------------------------------------------------------
// Anchor direction
// ---------------------------------------------------------------------------

/// The four anchor directions. Wire names are French, matching the
/// persisted entity format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorDirection {
    /// `haut`: defines the frame's minimum Y.
    #[serde(rename = "haut")]
    Top,
    /// `droite`: defines the frame's maximum X.
    #[serde(rename = "droite")]
    Right,
    /// `gauche`: defines the frame's minimum X.
    #[serde(rename = "gauche")]
    Left,
    /// `bas`: defines the frame's maximum Y.
    #[serde(rename = "bas")]
    Bottom,
}

impl AnchorDirection {
    /// Return the direction name as used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top => "haut",
            Self::Right => "droite",
            Self::Left => "gauche",
            Self::Bottom => "bas",
        }
    }

    /// Parse a wire direction string. Returns `None` for unknown values.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "haut" => Some(Self::Top),
            "droite" => Some(Self::Right),
            "gauche" => Some(Self::Left),
            "bas" => Some(Self::Bottom),
            _ => None,
        }
    }

    /// All four directions, in wire order.
    pub const ALL: [AnchorDirection; 4] =
        [Self::Top, Self::Right, Self::Left, Self::Bottom];

    /// Canonical position for an unconfigured anchor: the midpoint of
    /// the reference image edge this direction names.
    pub fn default_position(&self) -> Point {
        match self {
            Self::Top => Point::new(0.5, 0.0),
            Self::Right => Point::new(1.0, 0.5),
            Self::Left => Point::new(0.0, 0.5),
            Self::Bottom => Point::new(0.5, 1.0),
        }
    }
}

impl std::fmt::Display for AnchorDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Anchor
// ---------------------------------------------------------------------------

/// One reference landmark (étiquette de référence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Text strings a detector should search for near this anchor.
    #[serde(default)]
    pub labels: Vec<String>,

    /// Calibrated position on the reference image, in `[0,1]²` units.
    pub position_base: Point,

    /// Optional image-relative sub-rectangle used for visual template
    /// matching instead of (or in addition to) text labels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_coords: Option<Rect>,

    /// Where the anchor was last found on a specific instance image.
    /// Diagnostic only; frame computation uses `position_base`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_bbox: Option<Rect>,
}

impl Anchor {
    /// The default (unconfigured) anchor for a direction.
    pub fn default_for(direction: AnchorDirection) -> Self {
        Self {
            labels: Vec::new(),
            position_base: direction.default_position(),
            template_coords: None,
            detected_bbox: None,
        }
    }

    /// An anchor is configured when it has at least one label or a
    /// template region. Unconfigured anchors are never sent to the
    /// detector and keep their directional default.
    pub fn is_configured(&self) -> bool {
        !self.labels.is_empty() || self.template_coords.is_some()
    }
}

// ---------------------------------------------------------------------------
// Frame parameters
// ---------------------------------------------------------------------------

/// Derived frame geometry, recomputed on demand from the four anchors.
///
/// `angle` is always `0.0`: the frame is strictly axis-aligned, no
/// rotation correction is performed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameParams {
    /// Left anchor X, in image-relative units.
    pub origin_x: f64,
    /// Top anchor Y, in image-relative units.
    pub origin_y: f64,
    /// `|right.x - left.x|`, or `1.0` when collapsed.
    pub width_rel: f64,
    /// `|bottom.y - top.y|`, or `1.0` when collapsed.
    pub height_rel: f64,
    /// Frame width in pixels of the reference image; `0` when the
    /// reference dimensions are unknown.
    pub width_px: u32,
    /// Frame height in pixels; `0` when the reference dimensions are unknown.
    pub height_px: u32,
    /// Always `0.0` degrees.
    pub angle: f64,
    /// True when the horizontal extent collapsed to the fallback.
    pub degenerate_width: bool,
    /// True when the vertical extent collapsed to the fallback.
    pub degenerate_height: bool,
}

impl FrameParams {
    /// Whether either extent hit the full-image fallback. Callers may
    /// warn the user; the frame itself stays usable.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate_width || self.degenerate_height
    }
}

/// Absolute frame dimensions as persisted (`dimensions_absolues`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbsoluteDimensions {
    /// Frame width in pixels (largeur).
    pub largeur: u32,
    /// Frame height in pixels (hauteur).
    pub hauteur: u32,
    /// Rotation in degrees; always 0 for an axis-aligned frame.
    pub angle: f64,
}

// ---------------------------------------------------------------------------
// Reference frame
// ---------------------------------------------------------------------------

/// The cadre de référence: exactly one anchor per direction, plus the
/// pixel dimensions of the image the anchors were calibrated against.
///
/// This is a plain value object; it is queried by the frame transform
/// and mutated only through the explicit operations below. Reactivity,
/// redraws and persistence are the caller's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    #[serde(rename = "haut")]
    pub top: Anchor,
    #[serde(rename = "droite")]
    pub right: Anchor,
    #[serde(rename = "gauche")]
    pub left: Anchor,
    #[serde(rename = "bas")]
    pub bottom: Anchor,

    /// Width/height of the reference image, in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_dimensions: Option<ImageDimensions>,

    /// Cached absolute frame dimensions, refreshed at save time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions_absolues: Option<AbsoluteDimensions>,
}

impl Default for ReferenceFrame {
    fn default() -> Self {
        Self {
            top: Anchor::default_for(AnchorDirection::Top),
            right: Anchor::default_for(AnchorDirection::Right),
            left: Anchor::default_for(AnchorDirection::Left),
            bottom: Anchor::default_for(AnchorDirection::Bottom),
            image_base_dimensions: None,
            dimensions_absolues: None,
        }
    }
}

impl ReferenceFrame {
    /// Borrow the anchor for a direction.
    pub fn anchor(&self, direction: AnchorDirection) -> &Anchor {
        match direction {
            AnchorDirection::Top => &self.top,
            AnchorDirection::Right => &self.right,
            AnchorDirection::Left => &self.left,
            AnchorDirection::Bottom => &self.bottom,
        }
    }

    /// Mutably borrow the anchor for a direction.
    pub fn anchor_mut(&mut self, direction: AnchorDirection) -> &mut Anchor {
        match direction {
            AnchorDirection::Top => &mut self.top,
            AnchorDirection::Right => &mut self.right,
            AnchorDirection::Left => &mut self.left,
            AnchorDirection::Bottom => &mut self.bottom,
        }
    }

    /// Set an anchor's calibrated position.
    ///
    /// Only finiteness is enforced. Values slightly outside `[0,1]` are
    /// accepted: a landmark just off-canvas is a legitimate calibration.
    pub fn set_position(
        &mut self,
        direction: AnchorDirection,
        position: Point,
    ) -> Result<(), CoreError> {
        let position = Point::validated(position.x, position.y)?;
        self.anchor_mut(direction).position_base = position;
        Ok(())
    }

    /// Replace an anchor's label set and template region.
    ///
    /// Clearing both leaves the anchor unconfigured; it will sit at its
    /// directional default the next time it is reset.
    pub fn configure(
        &mut self,
        direction: AnchorDirection,
        labels: Vec<String>,
        template_coords: Option<Rect>,
    ) -> Result<(), CoreError> {
        if let Some(rect) = &template_coords {
            if !rect.is_finite() {
                return Err(CoreError::InvalidGeometry(
                    "template region corners must be finite".to_string(),
                ));
            }
        }
        let anchor = self.anchor_mut(direction);
        anchor.labels = labels;
        anchor.template_coords = template_coords;
        Ok(())
    }

    /// Restore the canonical edge midpoint for a direction and clear
    /// any previously detected bounding box. Labels and template region
    /// are kept.
    pub fn reset_to_default(&mut self, direction: AnchorDirection) {
        let anchor = self.anchor_mut(direction);
        anchor.position_base = direction.default_position();
        anchor.detected_bbox = None;
    }

    /// Compute the derived frame parameters. Never fails: collapsed
    /// extents fall back to the full image and are flagged.
    pub fn compute_frame(&self) -> FrameParams {
        let raw_width = (self.right.position_base.x - self.left.position_base.x).abs();
        let raw_height = (self.bottom.position_base.y - self.top.position_base.y).abs();

        let degenerate_width = raw_width < MIN_FRAME_EXTENT;
        let degenerate_height = raw_height < MIN_FRAME_EXTENT;

        let width_rel = if degenerate_width { 1.0 } else { raw_width };
        let height_rel = if degenerate_height { 1.0 } else { raw_height };

        let (width_px, height_px) = match self.image_base_dimensions {
            Some(dims) => (
                (width_rel * f64::from(dims.width)).round() as u32,
                (height_rel * f64::from(dims.height)).round() as u32,
            ),
            None => (0, 0),
        };

        FrameParams {
            origin_x: self.left.position_base.x,
            origin_y: self.top.position_base.y,
            width_rel,
            height_rel,
            width_px,
            height_px,
            angle: 0.0,
            degenerate_width,
            degenerate_height,
        }
    }

    /// Refresh the persisted `dimensions_absolues` cache from the
    /// current anchors. Called immediately before saving an entity.
    pub fn refresh_absolute_dimensions(&mut self) {
        let params = self.compute_frame();
        self.dimensions_absolues = Some(AbsoluteDimensions {
            largeur: params.width_px,
            hauteur: params.height_px,
            angle: params.angle,
        });
    }

    /// Directions that currently have at least one label or a template
    /// region, i.e. the set a detection pass would query.
    pub fn configured_directions(&self) -> Vec<AnchorDirection> {
        AnchorDirection::ALL
            .into_iter()
            .filter(|d| self.anchor(*d).is_configured())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
