//! Anchor-resolution protocol.
//!
//! This core never performs detection; it defines the contract with the
//! external detector service and applies its results. A detection pass
//! queries only configured anchors (those with labels or a template
//! region) and is applied atomically: either all four anchors reflect
//! the new pass (detected position or directional default) or, on
//! error, none do.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::anchor::{AnchorDirection, ReferenceFrame};
use crate::error::CoreError;
use crate::geometry::{Point, Rect};
use crate::media::ImageDimensions;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Search configuration for one anchor: text labels and/or an image
/// template region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnchorQuery {
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_coords: Option<Rect>,
}

/// A detection request: the instance image to search and the queries,
/// keyed by wire direction name (`haut`, `droite`, `gauche`, `bas`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRequest {
    pub filename: String,
    pub etiquettes: BTreeMap<String, AnchorQuery>,
}

impl DetectionRequest {
    /// True when no anchor is configured: nothing to send; the frame
    /// is the full image and the detector must not be called.
    pub fn is_empty(&self) -> bool {
        self.etiquettes.is_empty()
    }
}

/// Build the detection request for a frame. Unconfigured anchors are
/// never included.
pub fn build_detection_request(filename: &str, frame: &ReferenceFrame) -> DetectionRequest {
    let mut etiquettes = BTreeMap::new();
    for direction in AnchorDirection::ALL {
        let anchor = frame.anchor(direction);
        if anchor.is_configured() {
            etiquettes.insert(
                direction.as_str().to_string(),
                AnchorQuery {
                    labels: anchor.labels.clone(),
                    template_coords: anchor.template_coords,
                },
            );
        }
    }
    DetectionRequest {
        filename: filename.to_string(),
        etiquettes,
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// The detector's answer for one anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedPosition {
    pub x: f64,
    pub y: f64,
    pub found: bool,
    /// The matched text, when text-label matching succeeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Observed bounding box on the instance image, image-relative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<Rect>,
}

/// A complete detection report for one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    #[serde(default)]
    pub toutes_trouvees: bool,
    #[serde(default)]
    pub positions: BTreeMap<String, DetectedPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_dimensions: Option<ImageDimensions>,
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

/// Apply a detection report to a frame, atomically.
///
/// Every direction is updated in one pass: a found anchor takes its
/// detected position and bounding box; an anchor reported not-found, or
/// absent from the report (unconfigured, never queried), reverts to its
/// directional default with its bounding box cleared. The frame is
/// therefore always computable after a pass.
///
/// If any reported position is non-finite the whole report is rejected
/// and the frame is left untouched.
pub fn apply_detection(
    frame: &mut ReferenceFrame,
    report: &DetectionReport,
) -> Result<(), CoreError> {
    // Resolve all four targets before mutating anything.
    let mut resolved: Vec<(AnchorDirection, Point, Option<Rect>)> = Vec::with_capacity(4);
    for direction in AnchorDirection::ALL {
        match report.positions.get(direction.as_str()) {
            Some(pos) if pos.found => {
                let point = Point::validated(pos.x, pos.y).map_err(|_| {
                    CoreError::Detection(format!(
                        "detector returned a non-finite position for '{direction}'"
                    ))
                })?;
                if let Some(bbox) = &pos.bbox {
                    if !bbox.is_finite() {
                        return Err(CoreError::Detection(format!(
                            "detector returned a non-finite bounding box for '{direction}'"
                        )));
                    }
                }
                resolved.push((direction, point, pos.bbox));
            }
            _ => resolved.push((direction, direction.default_position(), None)),
        }
    }

    for (direction, position, bbox) in resolved {
        let anchor = frame.anchor_mut(direction);
        anchor.position_base = position;
        anchor.detected_bbox = bbox;
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

    fn found(x: f64, y: f64) -> DetectedPosition {
        DetectedPosition {
            x,
            y,
            found: true,
            text: None,
            bbox: None,
        }
    }

    fn not_found() -> DetectedPosition {
        DetectedPosition {
            x: 0.0,
            y: 0.0,
            found: false,
            text: None,
            bbox: None,
        }
    }

    // -- build_detection_request -------------------------------------------

    #[test]
    fn unconfigured_anchors_are_not_queried() {
        let mut frame = ReferenceFrame::default();
        frame
            .configure(AnchorDirection::Top, vec!["PASSEPORT".to_string()], None)
            .unwrap();

        let request = build_detection_request("scan_001.jpg", &frame);
        assert_eq!(request.filename, "scan_001.jpg");
        assert_eq!(request.etiquettes.len(), 1);
        assert!(request.etiquettes.contains_key("haut"));
    }

    #[test]
    fn template_only_anchor_is_queried() {
        let mut frame = ReferenceFrame::default();
        frame
            .configure(
                AnchorDirection::Left,
                Vec::new(),
                Some(Rect::new(0.0, 0.4, 0.1, 0.6)),
            )
            .unwrap();

        let request = build_detection_request("scan.jpg", &frame);
        let query = request.etiquettes.get("gauche").unwrap();
        assert!(query.labels.is_empty());
        assert!(query.template_coords.is_some());
    }

    #[test]
    fn fully_default_frame_yields_empty_request() {
        let request = build_detection_request("scan.jpg", &ReferenceFrame::default());
        assert!(request.is_empty());
    }

    #[test]
    fn request_serializes_direction_keys() {
        let mut frame = ReferenceFrame::default();
        frame
            .configure(AnchorDirection::Bottom, vec!["SIGNATURE".to_string()], None)
            .unwrap();

        let json = serde_json::to_value(build_detection_request("f.png", &frame)).unwrap();
        assert_eq!(json["filename"], "f.png");
        assert_eq!(
            json["etiquettes"]["bas"]["labels"],
            serde_json::json!(["SIGNATURE"])
        );
    }

    // -- apply_detection ---------------------------------------------------

    #[test]
    fn partial_detection_uses_defaults_for_missing() {
        // Top and right configured; right not found on this instance.
        let mut frame = ReferenceFrame::default();
        frame
            .configure(AnchorDirection::Top, vec!["TITRE".to_string()], None)
            .unwrap();
        frame
            .configure(AnchorDirection::Right, vec!["REF".to_string()], None)
            .unwrap();

        let report = DetectionReport {
            toutes_trouvees: false,
            positions: BTreeMap::from([
                ("haut".to_string(), found(0.52, 0.03)),
                ("droite".to_string(), not_found()),
            ]),
            image_dimensions: None,
        };

        apply_detection(&mut frame, &report).unwrap();

        assert_eq!(
            frame.anchor(AnchorDirection::Top).position_base,
            Point::new(0.52, 0.03)
        );
        assert_eq!(
            frame.anchor(AnchorDirection::Right).position_base,
            Point::new(1.0, 0.5)
        );

        let params = frame.compute_frame();
        assert_eq!(params.origin_x, 0.0);
        assert_eq!(params.origin_y, 0.03);
        assert_eq!(params.width_rel, 1.0);
        assert!((params.height_rel - 0.97).abs() < 1e-12);
    }

    #[test]
    fn found_anchor_records_bbox() {
        let mut frame = ReferenceFrame::default();
        let report = DetectionReport {
            toutes_trouvees: true,
            positions: BTreeMap::from([(
                "haut".to_string(),
                DetectedPosition {
                    x: 0.5,
                    y: 0.04,
                    found: true,
                    text: Some("PASSEPORT".to_string()),
                    bbox: Some(Rect::new(0.4, 0.02, 0.6, 0.06)),
                },
            )]),
            image_dimensions: None,
        };

        apply_detection(&mut frame, &report).unwrap();
        assert_eq!(
            frame.anchor(AnchorDirection::Top).detected_bbox,
            Some(Rect::new(0.4, 0.02, 0.6, 0.06))
        );
    }

    #[test]
    fn new_pass_clears_stale_bboxes() {
        let mut frame = ReferenceFrame::default();
        frame.anchor_mut(AnchorDirection::Left).detected_bbox =
            Some(Rect::new(0.0, 0.4, 0.1, 0.6));

        // A pass that says nothing about the left anchor resets it.
        apply_detection(&mut frame, &DetectionReport::default()).unwrap();
        assert!(frame.anchor(AnchorDirection::Left).detected_bbox.is_none());
    }

    #[test]
    fn empty_report_resets_all_anchors_to_defaults() {
        let mut frame = ReferenceFrame::default();
        frame
            .set_position(AnchorDirection::Top, Point::new(0.3, 0.2))
            .unwrap();

        apply_detection(&mut frame, &DetectionReport::default()).unwrap();

        for direction in AnchorDirection::ALL {
            assert_eq!(
                frame.anchor(direction).position_base,
                direction.default_position()
            );
        }
        // Degenerate full-image mode is valid, not an error.
        let params = frame.compute_frame();
        assert_eq!((params.width_rel, params.height_rel), (1.0, 1.0));
    }

    #[test]
    fn non_finite_position_rejects_whole_report() {
        let mut frame = ReferenceFrame::default();
        frame
            .set_position(AnchorDirection::Top, Point::new(0.3, 0.2))
            .unwrap();
        let before = frame.clone();

        let report = DetectionReport {
            toutes_trouvees: true,
            positions: BTreeMap::from([
                ("haut".to_string(), found(0.5, 0.1)),
                ("bas".to_string(), found(f64::NAN, 0.9)),
            ]),
            image_dimensions: None,
        };

        assert_matches!(
            apply_detection(&mut frame, &report),
            Err(CoreError::Detection(_))
        );
        // No partial mutation: the frame is exactly as before.
        assert_eq!(frame, before);
    }

    // -- serde -------------------------------------------------------------

    #[test]
    fn report_deserializes_detector_response() {
        let json = serde_json::json!({
            "toutes_trouvees": false,
            "positions": {
                "haut": { "x": 0.52, "y": 0.03, "found": true, "text": "PASSEPORT",
                          "bbox": [0.45, 0.01, 0.6, 0.05] },
                "droite": { "x": 0.0, "y": 0.0, "found": false }
            },
            "image_dimensions": { "width": 1240, "height": 1754 }
        });

        let report: DetectionReport = serde_json::from_value(json).unwrap();
        assert!(!report.toutes_trouvees);
        assert!(report.positions["haut"].found);
        assert_eq!(report.positions["haut"].text.as_deref(), Some("PASSEPORT"));
        assert!(!report.positions["droite"].found);
        assert_eq!(report.image_dimensions.unwrap().width, 1240);
    }
}
