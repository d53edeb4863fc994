//! Semantic validation for parsed function configuration values.

use std::collections::HashSet;

use anyhow::{bail, Result};
use tableflow_sdk::destination::DestinationPlugin;
use tableflow_sdk::local::{
    LocalDestinationConfig, LocalFileDestination, LocalFileSource, LocalSourceConfig,
};
use tableflow_sdk::source::SourcePlugin;

use crate::config::types::FunctionConfig;

fn validate_parameters(config: &FunctionConfig, errors: &mut Vec<String>) {
    let mut seen = HashSet::new();
    for (i, name) in config.parameters.iter().enumerate() {
        if name.trim().is_empty() {
            errors.push(format!("Parameter {i} has an empty name"));
        } else if !seen.insert(name.as_str()) {
            errors.push(format!("Duplicate parameter '{name}'"));
        }
    }
}

fn validate_source(config: &FunctionConfig, errors: &mut Vec<String>) {
    let source = &config.source;
    if source.use_ref.trim().is_empty() {
        errors.push("Source plugin reference (use) must not be empty".to_string());
        return;
    }
    if source.use_ref != LocalFileSource::IDENTIFIER {
        errors.push(format!("Unknown source plugin '{}'", source.use_ref));
        return;
    }
    let local: LocalSourceConfig = match serde_json::from_value(source.config.clone()) {
        Ok(local) => local,
        Err(e) => {
            errors.push(format!("source: invalid config: {e}"));
            return;
        }
    };
    if let Err(e) = local.validate() {
        errors.push(format!("source: {e}"));
    }
    if local.parameter_count() != config.parameters.len() {
        errors.push(format!(
            "source produces {} parameter(s) but function '{}' declares {}",
            local.parameter_count(),
            config.function,
            config.parameters.len()
        ));
    }
}

fn validate_destination(config: &FunctionConfig, errors: &mut Vec<String>) {
    let destination = &config.destination;
    if destination.use_ref.trim().is_empty() {
        errors.push("Destination plugin reference (use) must not be empty".to_string());
        return;
    }
    if destination.use_ref != LocalFileDestination::IDENTIFIER {
        errors.push(format!("Unknown destination plugin '{}'", destination.use_ref));
        return;
    }
    let local: LocalDestinationConfig = match serde_json::from_value(destination.config.clone()) {
        Ok(local) => local,
        Err(e) => {
            errors.push(format!("destination: invalid config: {e}"));
            return;
        }
    };
    if let Err(e) = local.validate() {
        errors.push(format!("destination: {e}"));
    }
    // The configured function forwards parameter i to output i.
    if local.tables.len() != config.parameters.len() {
        errors.push(format!(
            "destination declares {} table(s) but function '{}' has {} output(s)",
            local.tables.len(),
            config.function,
            config.parameters.len()
        ));
    }
}

/// Validate a parsed function configuration.
/// Returns `Ok(())` if valid, Err with all validation errors if not.
///
/// # Errors
///
/// Returns an error listing all validation failures found in the config.
pub fn validate_function(config: &FunctionConfig) -> Result<()> {
    let mut errors = Vec::new();

    if config.version != "1.0" {
        errors.push(format!(
            "Unsupported function version '{}', expected '1.0'",
            config.version
        ));
    }

    if config.function.trim().is_empty() {
        errors.push("Function name must not be empty".to_string());
    }

    validate_parameters(config, &mut errors);
    validate_source(config, &mut errors);
    validate_destination(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        bail!("Function validation failed:\n  - {}", errors.join("\n  - "));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parser::parse_function_str;

    fn valid_yaml() -> &'static str {
        r#"
version: "1.0"
function: test_function
parameters: [customers, orders]
source:
  use: local-file-source
  config:
    directory: ./in
    files: [customers.parquet]
    incremental:
      extension: parquet
destination:
  use: local-file-destination
  config:
    directory: ./out
    tables: [customers, orders]
"#
    }

    fn validation_error(yaml: &str) -> String {
        let config = parse_function_str(yaml).unwrap();
        validate_function(&config).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_function_passes() {
        let config = parse_function_str(valid_yaml()).unwrap();
        assert!(validate_function(&config).is_ok());
    }

    #[test]
    fn test_wrong_version_fails() {
        let err = validation_error(&valid_yaml().replace("\"1.0\"", "\"2.0\""));
        assert!(err.contains("Unsupported function version"));
    }

    #[test]
    fn test_empty_function_name_fails() {
        let err = validation_error(&valid_yaml().replace("test_function", "\"\""));
        assert!(err.contains("Function name must not be empty"));
    }

    #[test]
    fn test_duplicate_parameter_fails() {
        let err = validation_error(
            &valid_yaml().replace("[customers, orders]\nsource", "[orders, orders]\nsource"),
        );
        assert!(err.contains("Duplicate parameter 'orders'"), "got: {err}");
    }

    #[test]
    fn test_unknown_plugins_fail() {
        let yaml = valid_yaml()
            .replace("use: local-file-source", "use: s3-source")
            .replace("use: local-file-destination", "use: warehouse");
        let err = validation_error(&yaml);
        assert!(err.contains("Unknown source plugin 's3-source'"));
        assert!(err.contains("Unknown destination plugin 'warehouse'"));
    }

    #[test]
    fn test_parameter_count_mismatch_fails() {
        let yaml = valid_yaml().replace("    incremental:\n      extension: parquet\n", "");
        let err = validation_error(&yaml);
        assert!(err.contains("source produces 1 parameter(s)"), "got: {err}");
    }

    #[test]
    fn test_table_count_mismatch_fails() {
        let yaml = valid_yaml().replace("tables: [customers, orders]", "tables: [customers]");
        let err = validation_error(&yaml);
        assert!(err.contains("destination declares 1 table(s)"), "got: {err}");
    }

    #[test]
    fn test_invalid_plugin_config_fails() {
        let yaml = valid_yaml().replace("directory: ./out", "dir: ./out");
        let err = validation_error(&yaml);
        assert!(err.contains("destination: invalid config"), "got: {err}");
    }

    #[test]
    fn test_all_errors_reported_together() {
        let yaml = valid_yaml()
            .replace("\"1.0\"", "\"9.9\"")
            .replace("use: local-file-source", "use: nope");
        let err = validation_error(&yaml);
        assert!(err.contains("Unsupported function version"));
        assert!(err.contains("Unknown source plugin"));
    }
}
