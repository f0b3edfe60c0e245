//! Weekday restriction policy.
//!
//! A policy says which last plate digits are banned on which weekday. It is
//! stored as the document the caller supplied and only becomes a typed
//! [`Policy`] once [`PolicyDefinition::validate`] accepts its structure.
//!
//! Two shapes are accepted:
//! - a list, where the position is the weekday index: `[[], [1, 2], ...]`
//! - a map keyed by the weekday index written as a decimal integer:
//!   `{"1": [1, 2], "2": [3, 4]}`

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::PredictionError;

/// Number of empty slots an unconfigured evaluator starts with.
const UNCONFIGURED_SLOTS: usize = 10;

/// A policy as supplied by the caller, not yet validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyDefinition(Value);

impl PolicyDefinition {
    /// Wrap an arbitrary document.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The raw document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Check the structure and build the typed policy.
    ///
    /// Every key must be an integer and every value a list of integers.
    pub fn validate(&self) -> Result<Policy, PredictionError> {
        let entries: Vec<(i64, &Value)> = match &self.0 {
            Value::Array(days) => days
                .iter()
                .enumerate()
                .map(|(index, digits)| (index as i64, digits))
                .collect(),
            Value::Object(days) => days
                .iter()
                .map(|(key, digits)| {
                    parse_weekday_key(key)
                        .map(|weekday| (weekday, digits))
                        .ok_or_else(|| invalid(format!("key {:?} is not an integer", key)))
                })
                .collect::<Result<_, _>>()?,
            other => {
                return Err(invalid(format!(
                    "expected a list or a map, found {}",
                    kind(other)
                )))
            }
        };

        let mut days = BTreeMap::new();
        for (weekday, digits) in entries {
            let Value::Array(items) = digits else {
                return Err(invalid(format!(
                    "weekday {}: expected a list of digits, found {}",
                    weekday,
                    kind(digits)
                )));
            };

            let mut set = BTreeSet::new();
            for item in items {
                match item.as_i64() {
                    Some(digit) => {
                        set.insert(digit);
                    }
                    // Above i64::MAX, so it can never be a plate digit
                    None if item.is_u64() => {}
                    None => {
                        return Err(invalid(format!(
                            "weekday {}: {} is not an integer",
                            weekday, item
                        )))
                    }
                }
            }
            days.insert(weekday, set);
        }

        Ok(Policy { days })
    }
}

impl Default for PolicyDefinition {
    fn default() -> Self {
        Self(Value::Array(vec![
            Value::Array(Vec::new());
            UNCONFIGURED_SLOTS
        ]))
    }
}

impl From<Value> for PolicyDefinition {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

impl From<Vec<Vec<i64>>> for PolicyDefinition {
    fn from(days: Vec<Vec<i64>>) -> Self {
        Self(Value::from(days))
    }
}

impl From<BTreeMap<i64, Vec<i64>>> for PolicyDefinition {
    fn from(days: BTreeMap<i64, Vec<i64>>) -> Self {
        let map = days
            .into_iter()
            .map(|(weekday, digits)| (weekday.to_string(), Value::from(digits)))
            .collect();
        Self(Value::Object(map))
    }
}

/// A validated policy: weekday index to restricted last digits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    days: BTreeMap<i64, BTreeSet<i64>>,
}

impl Policy {
    /// Restricted digits for a weekday, if the weekday has an entry.
    pub fn restricted_digits(&self, weekday: u32) -> Option<&BTreeSet<i64>> {
        self.days.get(&i64::from(weekday))
    }

    /// Whether the digit is banned on the weekday.
    pub fn is_restricted(&self, weekday: u32, digit: u8) -> bool {
        self.restricted_digits(weekday)
            .is_some_and(|digits| digits.contains(&i64::from(digit)))
    }

    /// Weekday indices that have an entry.
    pub fn weekdays(&self) -> impl Iterator<Item = i64> + '_ {
        self.days.keys().copied()
    }
}

/// Map keys are integers only when written the way the integer prints
/// (`"1"`, `"-1"`), never `"01"` or `" 1"`.
fn parse_weekday_key(key: &str) -> Option<i64> {
    key.parse::<i64>()
        .ok()
        .filter(|weekday| weekday.to_string() == key)
}

fn invalid(reason: String) -> PredictionError {
    debug!(%reason, "policy rejected");
    PredictionError::InvalidPolicyDefinition { reason }
}

pub(crate) fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}
