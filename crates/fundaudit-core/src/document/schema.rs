//! JSON Schema validation for document bundles.
//!
//! Bundles are validated against spec/document.schema.json before
//! deserialization so that malformed reader output fails loudly at the
//! boundary instead of surfacing as odd rule verdicts.

use std::sync::OnceLock;

/// Embedded bundle schema (loaded at compile time).
const BUNDLE_SCHEMA_JSON: &str = include_str!("../../../../spec/document.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

fn get_validator() -> Result<&'static jsonschema::Validator, String> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = match serde_json::from_str(BUNDLE_SCHEMA_JSON) {
            Ok(value) => value,
            Err(err) => return Err(format!("invalid schema JSON: {err}")),
        };
        match jsonschema::options().build(&schema_value) {
            Ok(validator) => Ok(validator),
            Err(err) => Err(format!("failed to compile schema: {err}")),
        }
    });
    match result {
        Ok(validator) => Ok(validator),
        Err(err) => Err(err.clone()),
    }
}

/// Validate a bundle JSON value against the embedded schema.
///
/// Returns the full list of validation error messages on failure.
pub fn validate_bundle_schema(bundle: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|err| vec![err])?;
    let errors: Vec<String> = validator
        .iter_errors(bundle)
        .map(|err| format!("{} at {}", err, err.instance_path))
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_bundle_passes() {
        let value = serde_json::json!({
            "fid": "doc-1",
            "mold": "public_fund",
            "paragraphs": [
                { "index": 0, "page": 1, "text": "基金合同" }
            ]
        });
        assert!(validate_bundle_schema(&value).is_ok());
    }

    #[test]
    fn missing_fid_fails() {
        let value = serde_json::json!({
            "mold": "public_fund",
            "paragraphs": []
        });
        let errors = validate_bundle_schema(&value).unwrap_err();
        assert!(!errors.is_empty());
    }

    #[test]
    fn unknown_mold_fails() {
        let value = serde_json::json!({
            "fid": "doc-1",
            "mold": "private_equity",
            "paragraphs": []
        });
        assert!(validate_bundle_schema(&value).is_err());
    }

    #[test]
    fn additional_properties_fail() {
        let value = serde_json::json!({
            "fid": "doc-1",
            "mold": "public_fund",
            "paragraphs": [],
            "unexpected": true
        });
        assert!(validate_bundle_schema(&value).is_err());
    }
}
