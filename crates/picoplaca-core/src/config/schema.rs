//! JSON Schema validation for rule files.
//!
//! Rule files are validated against schema/rules.schema.json before they
//! are deserialized.

use std::sync::OnceLock;

use jsonschema::Validator;
use serde_json::Value;

const RULES_SCHEMA: &str = include_str!("../../../../schema/rules.schema.json");

static VALIDATOR: OnceLock<Result<Validator, String>> = OnceLock::new();

/// The compiled rules schema. Built on first use; a broken embedded schema
/// is reported on every call.
fn validator() -> Result<&'static Validator, String> {
    VALIDATOR
        .get_or_init(|| {
            let schema: Value = serde_json::from_str(RULES_SCHEMA)
                .map_err(|e| format!("rules schema is not valid JSON: {e}"))?;
            jsonschema::options()
                .build(&schema)
                .map_err(|e| format!("rules schema does not compile: {e}"))
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Validate a rule document against the schema.
///
/// Returns every violation found, each prefixed with the JSON pointer of the
/// offending value (`(root)` for the document itself).
pub fn validate_rules_schema(rules: &Value) -> Result<(), Vec<String>> {
    let validator = validator().map_err(|e| vec![e])?;

    let violations: Vec<String> = validator
        .iter_errors(rules)
        .map(|violation| {
            let path = violation.instance_path.to_string();
            let path = if path.is_empty() { "(root)" } else { path.as_str() };
            format!("{path}: {violation}")
        })
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Whether a rule document matches the schema.
pub fn is_valid_rules(rules: &Value) -> bool {
    validator().is_ok_and(|v| v.is_valid(rules))
}
