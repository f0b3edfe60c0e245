//! Rule file loading and validation.
//!
//! Rule files are YAML or JSON documents checked against
//! `schema/rules.schema.json` before they are deserialized. The schema only
//! fixes the document shape; policy and schedule contents are checked by the
//! evaluator when a prediction runs.

mod parser;
mod schema;

pub use parser::{ConfigError, RestrictionConfig};
pub use schema::{is_valid_rules, validate_rules_schema};
