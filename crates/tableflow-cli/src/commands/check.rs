use std::path::Path;

use anyhow::{Context, Result};

use tableflow_engine::config::{parser, validator};

/// Execute the `check` command: parse and validate a function config.
pub fn execute(function_path: &Path) -> Result<()> {
    let config = parser::parse_function(function_path)
        .with_context(|| format!("Failed to parse function: {}", function_path.display()))?;
    validator::validate_function(&config)?;

    println!("Function '{}': OK", config.function);
    println!("  Source:      {}", config.source.use_ref);
    println!("  Destination: {}", config.destination.use_ref);
    println!("  Parameters:  {}", config.parameters.join(", "));
    Ok(())
}
