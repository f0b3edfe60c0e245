//! Restricted time windows.
//!
//! A schedule is a list of `[start, end]` pairs of `HH:MM` strings. Both
//! bounds are inclusive. Windows are checked in the order given.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::patterns::{format_minutes, parse_time};
use crate::policy::kind;
use crate::PredictionError;

/// A schedule as supplied by the caller, not yet validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScheduleDefinition(Value);

impl ScheduleDefinition {
    /// Wrap an arbitrary document.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The raw document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Check the structure and build the typed schedule.
    ///
    /// Every window must hold exactly two valid `HH:MM` strings. An empty
    /// list is accepted.
    pub fn validate(&self) -> Result<Schedule, PredictionError> {
        let Value::Array(frames) = &self.0 else {
            return Err(invalid(format!("expected a list, found {}", kind(&self.0))));
        };

        let windows = frames
            .iter()
            .enumerate()
            .map(|(index, frame)| parse_window(index, frame))
            .collect::<Result<Vec<_>, _>>()?;

        if windows.is_empty() {
            debug!("schedule has no windows, nothing will be restricted");
        }

        Ok(Schedule { windows })
    }
}

fn parse_window(index: usize, frame: &Value) -> Result<TimeWindow, PredictionError> {
    let Value::Array(bounds) = frame else {
        return Err(invalid(format!(
            "window {}: expected a [start, end] pair, found {}",
            index,
            kind(frame)
        )));
    };

    let [start, end] = bounds.as_slice() else {
        return Err(invalid(format!(
            "window {}: expected 2 times, found {}",
            index,
            bounds.len()
        )));
    };

    let minutes = |bound: &Value| {
        bound
            .as_str()
            .and_then(parse_time)
            .ok_or_else(|| invalid(format!("window {}: {} is not an HH:MM time", index, bound)))
    };

    Ok(TimeWindow {
        start: minutes(start)?,
        end: minutes(end)?,
    })
}

fn invalid(reason: String) -> PredictionError {
    debug!(%reason, "schedule rejected");
    PredictionError::InvalidScheduleDefinition { reason }
}

impl Default for ScheduleDefinition {
    fn default() -> Self {
        Self(Value::Array(Vec::new()))
    }
}

impl From<Value> for ScheduleDefinition {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Vec<[&str; 2]>> for ScheduleDefinition {
    fn from(windows: Vec<[&str; 2]>) -> Self {
        let frames = windows
            .into_iter()
            .map(|[start, end]| Value::from(vec![start, end]))
            .collect();
        Self(Value::Array(frames))
    }
}

/// An inclusive range of minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    #[serde(serialize_with = "as_clock")]
    pub start: u32,

    #[serde(serialize_with = "as_clock")]
    pub end: u32,
}

impl TimeWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Whether the minute falls inside the window, bounds included.
    pub fn contains(&self, minutes: u32) -> bool {
        minutes >= self.start && minutes <= self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}",
            format_minutes(self.start),
            format_minutes(self.end)
        )
    }
}

fn as_clock<S: Serializer>(minutes: &u32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_minutes(*minutes))
}

/// A validated schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    windows: Vec<TimeWindow>,
}

impl Schedule {
    /// The first window containing the minute.
    pub fn find(&self, minutes: u32) -> Option<&TimeWindow> {
        self.windows.iter().find(|window| window.contains(minutes))
    }

    pub fn windows(&self) -> &[TimeWindow] {
        &self.windows
    }
}
