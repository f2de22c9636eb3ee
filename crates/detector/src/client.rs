//! HTTP client for the anchor-detection endpoint, using [`reqwest`].

use cadrage_core::detection::{DetectionReport, DetectionRequest};

/// HTTP client for a single detection service instance.
pub struct DetectorClient {
    client: reqwest::Client,
    base_url: String,
}

/// Errors from the detection service layer.
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Detection service error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl DetectorClient {
    /// Create a new client for a detection service.
    ///
    /// * `base_url` - Base HTTP URL, e.g. `http://host:5001`.
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    /// Run one detection pass.
    ///
    /// Sends a `POST /api/detecter-etiquettes` request with the anchor
    /// queries and returns the per-direction report. Callers must not
    /// invoke this with an empty request; short-circuit to defaults
    /// instead.
    pub async fn detect(&self, request: &DetectionRequest) -> Result<DetectionReport, DetectorError> {
        tracing::debug!(
            filename = %request.filename,
            anchors = request.etiquettes.len(),
            "Submitting detection request"
        );

        let response = self
            .client
            .post(format!("{}/api/detecter-etiquettes", self.base_url))
            .json(request)
            .send()
            .await?;

        let report: DetectionReport = Self::parse_response(response).await?;

        tracing::debug!(
            toutes_trouvees = report.toutes_trouvees,
            positions = report.positions.len(),
            "Detection pass completed"
        );
        Ok(report)
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, or capture the
    /// status and body text for diagnostics.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, DetectorError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(DetectorError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, DetectorError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
