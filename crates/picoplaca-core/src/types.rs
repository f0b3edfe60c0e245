//! Core types for restriction predictions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::TimeWindow;

/// The named inputs a prediction needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Param {
    /// Calendar date, `YYYY/MM/DD`
    Date,
    /// Clock time, `HH:MM`
    Time,
    /// License plate, `AAA9999`
    Plate,
}

impl Param {
    /// The case-sensitive name used by `set_param`.
    pub fn name(&self) -> &'static str {
        match self {
            Param::Date => "DATE",
            Param::Time => "TIME",
            Param::Plate => "PLATE",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for a parameter name that is not DATE, TIME or PLATE.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown parameter: {0}")]
pub struct UnknownParam(pub String);

impl FromStr for Param {
    type Err = UnknownParam;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DATE" => Ok(Param::Date),
            "TIME" => Ok(Param::Time),
            "PLATE" => Ok(Param::Plate),
            other => Err(UnknownParam(other.to_string())),
        }
    }
}

/// Raw inputs for one prediction. Nothing is checked until evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationInput {
    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub time: String,

    #[serde(default)]
    pub plate: String,
}

impl EvaluationInput {
    pub fn new(
        date: impl Into<String>,
        time: impl Into<String>,
        plate: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            time: time.into(),
            plate: plate.into(),
        }
    }

    /// Store a value under the given parameter.
    pub fn set(&mut self, param: Param, value: impl Into<String>) {
        let slot = match param {
            Param::Date => &mut self.date,
            Param::Time => &mut self.time,
            Param::Plate => &mut self.plate,
        };
        *slot = value.into();
    }

    /// Read the value stored under the given parameter.
    pub fn get(&self, param: Param) -> &str {
        match param {
            Param::Date => &self.date,
            Param::Time => &self.time,
            Param::Plate => &self.plate,
        }
    }
}

/// Outcome of a successful prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Plate as supplied
    pub plate: String,

    /// Date as supplied
    pub date: String,

    /// Time as supplied
    pub time: String,

    /// Whether the vehicle may not be on the road
    pub restricted: bool,

    /// Day of week, 0 = Sunday .. 6 = Saturday
    pub weekday: u32,

    /// Last digit of the plate
    pub last_digit: u8,

    /// The first window containing the time, when the digit was banned that day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_window: Option<TimeWindow>,

    /// Date and time anchored in the configured timezone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_time: Option<DateTime<FixedOffset>>,
}

impl fmt::Display for Prediction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The vehicle {} is{} restricted to be on the road on {} {}",
            self.plate,
            if self.restricted { "" } else { " not" },
            self.date,
            self.time
        )
    }
}
