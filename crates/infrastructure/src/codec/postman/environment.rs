//! Postman environment files (`*.postman_environment.json`).

use courier_application::{CodecError, ImportWarning};
use courier_domain::environment::{Environment, Variable};
use courier_domain::settings::ImportLimits;
use serde_json::Value;

use crate::codec::check_size;

use super::types::{PostmanEnvVariable, value_text};

/// An imported environment and the entries that could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentImport {
    /// The imported variable set
    pub environment: Environment,
    /// Skipped entries
    pub warnings: Vec<ImportWarning>,
}

pub(super) fn decode_environment(
    bytes: &[u8],
    limits: &ImportLimits,
) -> Result<EnvironmentImport, CodecError> {
    check_size(bytes, limits)?;
    let document: Value =
        serde_json::from_slice(bytes).map_err(|e| CodecError::Malformed(e.to_string()))?;
    let Value::Object(root) = document else {
        return Err(CodecError::invalid("environment", "must be a JSON object"));
    };
    let Some(name) = root.get("name").and_then(Value::as_str) else {
        return Err(CodecError::invalid("name", "must be a string"));
    };
    let values: &[Value] = match root.get("values") {
        None => &[],
        Some(Value::Array(values)) => values,
        Some(_) => return Err(CodecError::invalid("values", "must be an array")),
    };

    let mut environment = Environment::new(name);
    if let Some(id) = root.get("id").and_then(Value::as_str) {
        environment.id = id.to_string();
    }

    let mut warnings = Vec::new();
    for (index, value) in values.iter().enumerate() {
        match serde_json::from_value::<PostmanEnvVariable>(value.clone()) {
            Ok(var) => {
                let text = value_text(var.value.as_ref());
                let variable = if var.enabled {
                    Variable::new(text)
                } else {
                    Variable::disabled(text)
                };
                environment.variables.insert(var.key, variable);
            }
            Err(e) => warnings.push(ImportWarning::error(
                format!("{name}/values[{index}]"),
                format!("malformed variable: {e}"),
            )),
        }
    }

    Ok(EnvironmentImport {
        environment,
        warnings,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn decode(document: &Value) -> Result<EnvironmentImport, CodecError> {
        decode_environment(document.to_string().as_bytes(), &ImportLimits::default())
    }

    #[test]
    fn test_environment_values() {
        let imported = decode(&json!({
            "id": "env-1",
            "name": "Staging",
            "values": [
                {"key": "base", "value": "https://staging.test", "type": "default", "enabled": true},
                {"key": "token", "value": "s3cret", "type": "secret"},
                {"key": "old", "value": "x", "enabled": false},
                {"key": "port", "value": 8080},
                {"value": "no key"}
            ],
            "_postman_variable_scope": "environment"
        }))
        .unwrap();

        let environment = &imported.environment;
        assert_eq!(environment.id, "env-1");
        assert_eq!(environment.name, "Staging");
        assert_eq!(environment.get("base"), Some("https://staging.test"));
        assert_eq!(environment.get("token"), Some("s3cret"));
        assert_eq!(environment.get("old"), None);
        assert_eq!(environment.variables["old"], Variable::disabled("x"));
        assert_eq!(environment.get("port"), Some("8080"));
        assert_eq!(imported.warnings.len(), 1);
        assert_eq!(imported.warnings[0].path, "Staging/values[4]");
    }

    #[test]
    fn test_environment_shape_errors() {
        assert_eq!(
            decode(&json!({"values": []})).unwrap_err(),
            CodecError::invalid("name", "must be a string")
        );
        assert_eq!(
            decode(&json!({"name": "x", "values": {}})).unwrap_err(),
            CodecError::invalid("values", "must be an array")
        );
    }
}
