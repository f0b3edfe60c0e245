//! Rendering of prediction results.

use anyhow::Result;
use picoplaca_core::{Prediction, PredictionError};
use serde::Serialize;

use crate::cli::OutputFormat;

/// JSON body for a refused prediction.
#[derive(Debug, Serialize)]
struct ErrorReport<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

impl<'a> From<&'a PredictionError> for ErrorReport<'a> {
    fn from(error: &'a PredictionError) -> Self {
        Self {
            error: error.code(),
            message: error.to_string(),
            reason: error.reason(),
        }
    }
}

/// Render a prediction result in the requested format.
pub fn render(result: &Result<Prediction, PredictionError>, format: OutputFormat) -> Result<String> {
    let rendered = match (format, result) {
        (OutputFormat::Text, Ok(prediction)) => prediction.to_string(),
        (OutputFormat::Text, Err(error)) => error.to_string(),
        (OutputFormat::Json, Ok(prediction)) => serde_json::to_string_pretty(prediction)?,
        (OutputFormat::Json, Err(error)) => serde_json::to_string_pretty(&ErrorReport::from(error))?,
    };
    Ok(rendered)
}
