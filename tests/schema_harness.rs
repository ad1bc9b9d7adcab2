use figma_mcp_server::schema::{validate_json, SchemaValidationError};

const WHOAMI_ARGS: &str = r#"{
  "type": "object",
  "properties": { "apiKey": { "type": "string", "minLength": 1 } },
  "required": ["apiKey"]
}"#;

#[test]
fn json_schema_harness_validates_instance() {
    validate_json(WHOAMI_ARGS, r#"{ "apiKey": "figd_token" }"#).expect("schema validation failed");
}

#[test]
fn json_schema_harness_reports_violation() {
    let err = validate_json(WHOAMI_ARGS, r#"{ "apiKey": "" }"#).unwrap_err();
    assert!(matches!(err, SchemaValidationError::ValidationFailed(_)));
}

#[test]
fn json_schema_harness_rejects_malformed_instance() {
    let err = validate_json(WHOAMI_ARGS, "{").unwrap_err();
    assert!(matches!(err, SchemaValidationError::SchemaParse(_)));
}
