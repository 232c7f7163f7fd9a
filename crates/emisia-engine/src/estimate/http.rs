//! HTTP-backed estimation adapter.
//!
//! Posts the estimate request as JSON to a configured endpoint and expects a
//! reply of the shape:
//!
//! ```json
//! { "factor": { "value": 2.31, "unit": "kg", "source": "llm", "rationale": "..." } }
//! ```
//!
//! or `{ "factor": null }` when the capability has no answer. Every transport
//! or format problem (timeout, non-2xx status, unparseable body) collapses
//! to `None`. The request timeout is bounded at the client, so Layer 3 can
//! never block a resolution indefinitely.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use emisia_core::{EmisiaError, EmisiaResult};

use super::{EstimateRequest, EstimatedFactor, Estimator};

/// Estimator speaking JSON-over-HTTP to an external estimation service.
pub struct HttpEstimator {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpEstimator {
    /// Build an estimator with a bounded per-request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> EmisiaResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                EmisiaError::invalid_argument(format!("estimator client build failed: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn request(&self, request: &EstimateRequest) -> Result<Option<EstimatedFactor>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .context("estimator request failed")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("estimator returned status {status}");
        }

        let body = response.text().context("estimator body unreadable")?;
        Ok(parse_estimate_body(&body))
    }
}

impl Estimator for HttpEstimator {
    fn estimate(&self, request: &EstimateRequest) -> Option<EstimatedFactor> {
        match self.request(request) {
            Ok(factor) => factor,
            Err(e) => {
                tracing::warn!(error = %e, "estimation request failed; treating as no response");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct EstimateBody {
    factor: Option<EstimatedFactor>,
}

/// Parse a reply body. Anything malformed is `None`, as is a well-formed
/// reply proposing a non-positive value.
pub(crate) fn parse_estimate_body(body: &str) -> Option<EstimatedFactor> {
    let parsed: EstimateBody = serde_json::from_str(body).ok()?;
    parsed.factor.filter(|f| f.is_usable())
}
