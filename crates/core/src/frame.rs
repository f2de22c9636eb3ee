//! Bidirectional zone coordinate transform.
//!
//! Converts zone rectangles between image-relative and frame-relative
//! coordinate spaces given resolved [`FrameParams`]. Applied at two
//! points in the entity lifecycle: image→frame immediately before
//! persisting (only when a reference frame is configured) and
//! frame→image immediately after loading for editing. With no frame
//! both directions are pass-through.
//!
//! No clamping anywhere: a zone outside the computed frame legitimately
//! maps outside `[0,1]` and is preserved so downstream consumers can
//! detect it.

use crate::anchor::FrameParams;
use crate::entity::Zone;
use crate::geometry::Rect;

/// Map an image-relative rectangle into frame-relative coordinates.
///
/// Each corner maps independently: `v' = (v - origin) / extent`.
pub fn to_frame_space(rect: Rect, frame: &FrameParams) -> Rect {
    Rect::new(
        (rect.x1 - frame.origin_x) / frame.width_rel,
        (rect.y1 - frame.origin_y) / frame.height_rel,
        (rect.x2 - frame.origin_x) / frame.width_rel,
        (rect.y2 - frame.origin_y) / frame.height_rel,
    )
}

/// Map a frame-relative rectangle back to image-relative coordinates.
///
/// Inverse affine of [`to_frame_space`]: `v = v' * extent + origin`.
pub fn from_frame_space(rect: Rect, frame: &FrameParams) -> Rect {
    Rect::new(
        rect.x1 * frame.width_rel + frame.origin_x,
        rect.y1 * frame.height_rel + frame.origin_y,
        rect.x2 * frame.width_rel + frame.origin_x,
        rect.y2 * frame.height_rel + frame.origin_y,
    )
}

/// Project zones into frame space, producing derived copies.
///
/// `None` means no reference frame is configured; the zones are
/// returned unchanged (their coordinates are already the persisted
/// space).
pub fn zones_to_frame_space(zones: &[Zone], frame: Option<&FrameParams>) -> Vec<Zone> {
    match frame {
        Some(params) => zones
            .iter()
            .map(|z| z.with_coords(to_frame_space(z.coords, params)))
            .collect(),
        None => zones.to_vec(),
    }
}

/// Project zones from frame space back to image space, producing
/// derived copies. Pass-through when no frame is configured.
pub fn zones_from_frame_space(zones: &[Zone], frame: Option<&FrameParams>) -> Vec<Zone> {
    match frame {
        Some(params) => zones
            .iter()
            .map(|z| z.with_coords(from_frame_space(z.coords, params)))
            .collect(),
        None => zones.to_vec(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::{AnchorDirection, ReferenceFrame};
    use crate::entity::ZoneKind;
    use crate::geometry::Point;

    /// Round-trip tolerance per coordinate component.
    const EPSILON: f64 = 1e-6;

    fn frame_params(origin: (f64, f64), width: f64, height: f64) -> FrameParams {
        FrameParams {
            origin_x: origin.0,
            origin_y: origin.1,
            width_rel: width,
            height_rel: height,
            width_px: 0,
            height_px: 0,
            angle: 0.0,
            degenerate_width: false,
            degenerate_height: false,
        }
    }

    fn zone(name: &str, coords: Rect) -> Zone {
        Zone {
            id: 1,
            name: name.to_string(),
            coords,
            kind: ZoneKind::Text,
            lang: None,
            preprocess: None,
            expected_values: None,
        }
    }

    fn assert_rect_close(a: Rect, b: Rect) {
        assert!((a.x1 - b.x1).abs() < EPSILON, "x1: {} vs {}", a.x1, b.x1);
        assert!((a.y1 - b.y1).abs() < EPSILON, "y1: {} vs {}", a.y1, b.y1);
        assert!((a.x2 - b.x2).abs() < EPSILON, "x2: {} vs {}", a.x2, b.x2);
        assert!((a.y2 - b.y2).abs() < EPSILON, "y2: {} vs {}", a.y2, b.y2);
    }

    // -- to_frame_space ----------------------------------------------------

    #[test]
    fn zone_conversion_example() {
        // Frame origin (0.2, 0.1), width 0.6, height 0.7.
        let f = frame_params((0.2, 0.1), 0.6, 0.7);
        let converted = to_frame_space(Rect::new(0.5, 0.45, 0.7, 0.6), &f);

        assert_rect_close(
            converted,
            Rect::new(0.5, 0.5, 0.8333333333333334, 0.7142857142857143),
        );
    }

    #[test]
    fn default_frame_is_identity() {
        let f = ReferenceFrame::default().compute_frame();
        let r = Rect::new(0.12, 0.34, 0.56, 0.78);
        assert_rect_close(to_frame_space(r, &f), r);
        assert_rect_close(from_frame_space(r, &f), r);
    }

    #[test]
    fn zones_outside_frame_map_outside_unit_square() {
        // A zone left of the frame origin maps to negative X, preserved.
        let f = frame_params((0.5, 0.5), 0.4, 0.4);
        let converted = to_frame_space(Rect::new(0.1, 0.1, 0.3, 0.3), &f);
        assert!(converted.x1 < 0.0);
        assert!(converted.y1 < 0.0);
    }

    // -- round trip --------------------------------------------------------

    #[test]
    fn round_trip_within_tolerance() {
        let f = frame_params((0.2, 0.1), 0.6, 0.7);
        let rects = [
            Rect::new(0.5, 0.45, 0.7, 0.6),
            Rect::new(0.0, 0.0, 1.0, 1.0),
            // Components outside [0,1] round-trip too.
            Rect::new(-0.3, -0.2, 1.4, 1.9),
            Rect::new(0.33, 0.33, 0.33, 0.33),
        ];
        for r in rects {
            assert_rect_close(from_frame_space(to_frame_space(r, &f), &f), r);
        }
    }

    #[test]
    fn round_trip_with_detected_frame() {
        let mut frame = ReferenceFrame::default();
        frame
            .set_position(AnchorDirection::Top, Point::new(0.52, 0.03))
            .unwrap();
        frame
            .set_position(AnchorDirection::Left, Point::new(0.07, 0.5))
            .unwrap();
        frame
            .set_position(AnchorDirection::Right, Point::new(0.93, 0.5))
            .unwrap();
        frame
            .set_position(AnchorDirection::Bottom, Point::new(0.5, 0.96))
            .unwrap();

        let f = frame.compute_frame();
        let r = Rect::new(0.25, 0.4, 0.6, 0.55);
        assert_rect_close(from_frame_space(to_frame_space(r, &f), &f), r);
    }

    // -- zone-slice helpers ------------------------------------------------

    #[test]
    fn zone_helpers_produce_derived_copies() {
        let f = frame_params((0.2, 0.1), 0.6, 0.7);
        let zones = vec![zone("mrz", Rect::new(0.5, 0.45, 0.7, 0.6))];

        let converted = zones_to_frame_space(&zones, Some(&f));

        // Original is untouched.
        assert_eq!(zones[0].coords, Rect::new(0.5, 0.45, 0.7, 0.6));
        // Copy is converted, other fields intact.
        assert_eq!(converted[0].name, "mrz");
        assert!((converted[0].coords.x1 - 0.5).abs() < EPSILON);
    }

    #[test]
    fn no_frame_is_pass_through() {
        let zones = vec![
            zone("a", Rect::new(0.1, 0.1, 0.2, 0.2)),
            zone("b", Rect::new(0.3, 0.3, 0.4, 0.4)),
        ];
        assert_eq!(zones_to_frame_space(&zones, None), zones);
        assert_eq!(zones_from_frame_space(&zones, None), zones);
    }

    #[test]
    fn zones_round_trip_through_both_helpers() {
        let f = frame_params((0.15, 0.05), 0.7, 0.85);
        let zones = vec![
            zone("numero", Rect::new(0.2, 0.1, 0.5, 0.2)),
            zone("photo", Rect::new(0.6, 0.3, 0.9, 0.7)),
        ];

        let there = zones_to_frame_space(&zones, Some(&f));
        let back = zones_from_frame_space(&there, Some(&f));

        for (orig, round) in zones.iter().zip(&back) {
            assert_rect_close(round.coords, orig.coords);
        }
    }
}
