//! Handler for anchor-detection passes.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

use cadrage_core::anchor::{FrameParams, ReferenceFrame};
use cadrage_core::detection::{apply_detection, build_detection_request, DetectionReport};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for a detection pass: the instance image to search and the
/// frame whose anchors define the queries.
#[derive(Debug, Deserialize)]
pub struct DetectAnchorsRequest {
    pub filename: String,
    #[serde(rename = "cadre_reference")]
    pub frame: ReferenceFrame,
}

/// Result of a detection pass: the updated frame and its recomputed
/// parameters. The submitted frame is never stored; persisting the
/// result is a separate, explicit save.
#[derive(Debug, Serialize)]
pub struct DetectAnchorsResponse {
    #[serde(rename = "cadre_reference")]
    pub frame: ReferenceFrame,
    pub params: FrameParams,
    pub toutes_trouvees: bool,
}

/// POST /detecter-etiquettes
///
/// Run one detection pass. With zero configured anchors the detector
/// is not called at all; every anchor reverts to its directional
/// default and the frame is the full image.
pub async fn detect_anchors(
    State(state): State<AppState>,
    Json(input): Json<DetectAnchorsRequest>,
) -> AppResult<impl IntoResponse> {
    let mut frame = input.frame;
    let request = build_detection_request(&input.filename, &frame);

    let report = if request.is_empty() {
        tracing::info!(
            filename = %input.filename,
            "No anchors configured, using the full-image frame"
        );
        DetectionReport::default()
    } else {
        state.detector.detect(&request).await?
    };

    apply_detection(&mut frame, &report)?;

    let params = frame.compute_frame();
    if params.is_degenerate() {
        tracing::warn!(
            filename = %input.filename,
            "Detected frame extent collapsed, treating it as the full image"
        );
    }

    tracing::info!(
        filename = %input.filename,
        toutes_trouvees = report.toutes_trouvees,
        "Detection pass applied"
    );

    Ok(Json(DataResponse {
        data: DetectAnchorsResponse {
            frame,
            params,
            toutes_trouvees: report.toutes_trouvees,
        },
    }))
}
