//! Error taxonomy for the analysis pipelines.
//!
//! Every stage of a pipeline reports failure through [`PipelineError`]; the
//! orchestrator stops at the first one and hands it back to the caller.

use thiserror::Error;

/// Errors surfaced by a pipeline stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The dashboard API could not be reached or answered with a non-200 status.
    #[error("failed to fetch {domain} data: {reason}")]
    Fetch { domain: &'static str, reason: String },

    /// The dashboard answered, but the payload lacks the `results` collection.
    #[error("invalid {scope} {domain} data format: {reason}")]
    MalformedData {
        domain: &'static str,
        scope: &'static str,
        reason: String,
    },

    /// A ranking or averaging step was handed zero records.
    #[error("cannot {operation} an empty {domain} collection")]
    EmptyCollection {
        domain: &'static str,
        operation: &'static str,
    },

    /// The narrative service is not usable with the current configuration.
    #[error("{0}")]
    ServiceConfiguration(String),

    /// The narrative service failed while generating the report.
    #[error("narrative generation failed: {0}")]
    Generation(String),

    /// A report structure could not be rendered as JSON.
    #[error("failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Writing a report artifact to disk failed.
    #[error("failed to write {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// True for failures that mean "the source had nothing usable".
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            PipelineError::Fetch { .. } | PipelineError::MalformedData { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PipelineError::Fetch {
            domain: "inspection",
            reason: "HTTP 404 Not Found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch inspection data: HTTP 404 Not Found"
        );

        let err = PipelineError::EmptyCollection {
            domain: "inspection",
            operation: "rank",
        };
        assert_eq!(err.to_string(), "cannot rank an empty inspection collection");
    }

    #[test]
    fn test_no_data_classification() {
        let fetch = PipelineError::Fetch {
            domain: "zero muster",
            reason: "timeout".to_string(),
        };
        let malformed = PipelineError::MalformedData {
            domain: "zero muster",
            scope: "state",
            reason: "missing `results`".to_string(),
        };
        let generation = PipelineError::Generation("overloaded".to_string());

        assert!(fetch.is_no_data());
        assert!(malformed.is_no_data());
        assert!(!generation.is_no_data());
    }
}
