// insight-core/src/application/outcome.rs

use serde::Serialize;

use crate::application::reports::Payload;

/// Result of one pipeline run. Nothing in here is an error: the boundary turns
/// every variant into a 200 response.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Real data, computed now or served from the cache.
    Fresh { payload: Payload, cached: bool },
    /// The source was reachable in principle but failed; demo data instead.
    Degraded { payload: Payload, reason: String },
    /// The source lacks credentials or config; fetch was never attempted.
    Unconfigured { payload: Payload, reason: String },
}

impl PipelineOutcome {
    pub fn payload(&self) -> &Payload {
        match self {
            PipelineOutcome::Fresh { payload, .. }
            | PipelineOutcome::Degraded { payload, .. }
            | PipelineOutcome::Unconfigured { payload, .. } => payload,
        }
    }

    pub fn is_demo(&self) -> bool {
        !matches!(self, PipelineOutcome::Fresh { .. })
    }

    pub fn is_cached(&self) -> bool {
        matches!(self, PipelineOutcome::Fresh { cached: true, .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PipelineOutcome::Fresh { cached: true, .. } => "cached",
            PipelineOutcome::Fresh { cached: false, .. } => "fresh",
            PipelineOutcome::Degraded { .. } => "degraded",
            PipelineOutcome::Unconfigured { .. } => "unconfigured",
        }
    }

    pub fn into_envelope(self) -> Envelope {
        match self {
            PipelineOutcome::Fresh { payload, cached } => Envelope::Live {
                data: payload,
                cached,
            },
            PipelineOutcome::Degraded { payload, reason } => Envelope::Demo {
                error: "Failed to fetch analytics data".to_string(),
                message: Some(reason),
                demo: true,
                data: payload,
            },
            PipelineOutcome::Unconfigured { payload, reason } => Envelope::Demo {
                error: "Analytics source not configured".to_string(),
                message: Some(reason),
                demo: true,
                data: payload,
            },
        }
    }
}

/// Wire shape:
/// - `{ "data": ..., "cached": bool }`
/// - `{ "error": ..., "message"?: ..., "demo": true, "data": ... }`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Live {
        data: Payload,
        cached: bool,
    },
    Demo {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        demo: bool,
        data: Payload,
    },
}

impl Envelope {
    /// Degraded responses are still successes for the transport.
    pub const fn status_code(&self) -> u16 {
        200
    }

    pub fn data(&self) -> &Payload {
        match self {
            Envelope::Live { data, .. } | Envelope::Demo { data, .. } => data,
        }
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, Envelope::Demo { .. })
    }
}

impl From<PipelineOutcome> for Envelope {
    fn from(outcome: PipelineOutcome) -> Self {
        outcome.into_envelope()
    }
}
