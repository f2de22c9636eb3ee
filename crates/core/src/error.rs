//! Domain error type shared across the workspace.

/// Errors produced by the domain core.
///
/// The API layer maps each variant to an HTTP status code; see
/// `cadrage-api::error`. Two conditions deliberately do *not* appear
/// here: a degenerate frame (width/height collapsing to ~0) is reported
/// through diagnostic flags on [`crate::anchor::FrameParams`], and an
/// ambiguous legacy migration surfaces as warnings on
/// [`crate::migration::MigrationOutcome`]. Neither blocks the operation.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A named resource does not exist.
    #[error("{entity} '{name}' not found")]
    NotFound { entity: &'static str, name: String },

    /// Input failed a domain validation rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Non-finite or otherwise malformed coordinate input. Rejected at
    /// the boundary, never silently coerced.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The operation conflicts with existing state (e.g. duplicate name).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The anchor detector collaborator failed. The frame is left in its
    /// last-known-good state.
    #[error("Detection failed: {0}")]
    Detection(String),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}
