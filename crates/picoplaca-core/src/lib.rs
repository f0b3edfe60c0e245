//! # picoplaca-core
//!
//! Deterministic pico y placa restriction predictor.
//!
//! Given a plate, a date and a time, this crate answers whether the vehicle
//! is banned from the road under a weekday policy (which last plate digits
//! are restricted on which weekday) and a list of restricted time windows.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same rules and input always produce the same result
//! 2. **Validated**: Inputs and rules are checked in a fixed order and the
//!    first failure is reported
//! 3. **No side effects**: A prediction never prints or exits; rendering is
//!    left to the caller
//!
//! ## Example
//!
//! ```rust
//! use picoplaca_core::{RestrictionConfig, RestrictionEvaluator};
//!
//! let mut evaluator = RestrictionEvaluator::from_config(&RestrictionConfig::default());
//! evaluator.set_param("DATE", "2020/09/10");
//! evaluator.set_param("TIME", "07:15");
//! evaluator.set_param("PLATE", "PCM6027");
//!
//! match evaluator.predict() {
//!     Ok(prediction) => println!("{}", prediction),
//!     Err(error) => println!("{}", error),
//! }
//! ```

pub mod config;
pub mod evaluator;
pub mod patterns;
pub mod policy;
pub mod schedule;
pub mod types;

// Re-export main types at crate root
pub use chrono_tz::Tz;
pub use config::{ConfigError, RestrictionConfig};
pub use evaluator::{RestrictionEvaluator, Rules, DEFAULT_TIMEZONE};
pub use policy::{Policy, PolicyDefinition};
pub use schedule::{Schedule, ScheduleDefinition, TimeWindow};
pub use types::{EvaluationInput, Param, Prediction, UnknownParam};

use thiserror::Error;

/// Reasons a prediction is refused, in the order they are checked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PredictionError {
    #[error("Invalid date format, please use YYYY/MM/DD format.")]
    InvalidDateFormat,

    #[error("Invalid time format, please use the 24 hours HH:MM format.")]
    InvalidTimeFormat,

    #[error("Invalid plate format, please use AAA9999 format.")]
    InvalidPlateFormat,

    #[error("Invalid policy definition.")]
    InvalidPolicyDefinition { reason: String },

    #[error("Invalid schedule definition.")]
    InvalidScheduleDefinition { reason: String },
}

impl PredictionError {
    /// Stable identifier for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            PredictionError::InvalidDateFormat => "invalid_date_format",
            PredictionError::InvalidTimeFormat => "invalid_time_format",
            PredictionError::InvalidPlateFormat => "invalid_plate_format",
            PredictionError::InvalidPolicyDefinition { .. } => "invalid_policy_definition",
            PredictionError::InvalidScheduleDefinition { .. } => "invalid_schedule_definition",
        }
    }

    /// Detail for definition errors.
    pub fn reason(&self) -> Option<&str> {
        match self {
            PredictionError::InvalidPolicyDefinition { reason }
            | PredictionError::InvalidScheduleDefinition { reason } => Some(reason.as_str()),
            _ => None,
        }
    }
}

/// Predict one input against a set of rules.
///
/// This is the main entry point when the caller already holds the inputs.
///
/// # Arguments
///
/// * `config` - Timezone, policy and schedule
/// * `input` - Date, time and plate to evaluate
///
/// # Returns
///
/// A `Prediction` when every check passes, otherwise the first
/// `PredictionError` in cascade order.
pub fn predict(
    config: &RestrictionConfig,
    input: &EvaluationInput,
) -> Result<Prediction, PredictionError> {
    let mut evaluator = RestrictionEvaluator::from_config(config);
    evaluator.set(Param::Date, input.date.as_str());
    evaluator.set(Param::Time, input.time.as_str());
    evaluator.set(Param::Plate, input.plate.as_str());
    evaluator.predict()
}
