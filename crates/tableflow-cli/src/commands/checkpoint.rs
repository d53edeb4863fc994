use std::path::Path;

use anyhow::{Context, Result};

use tableflow_engine::config::parser;
use tableflow_engine::orchestrator;

fn load(function_path: &Path) -> Result<tableflow_engine::config::types::FunctionConfig> {
    parser::parse_function(function_path)
        .with_context(|| format!("Failed to parse function: {}", function_path.display()))
}

/// Execute `checkpoint show`.
pub fn show(function_path: &Path) -> Result<()> {
    let config = load(function_path)?;
    match orchestrator::show_checkpoint(&config)? {
        Some(record) => {
            println!("Checkpoint for '{}':", config.function);
            for (key, value) in record.values.iter() {
                println!("  {key} = {value}");
            }
            if let Some(run_id) = record.run_id {
                println!("  (run {run_id}, updated {})", record.updated_at);
            } else {
                println!("  (updated {})", record.updated_at);
            }
        }
        None => println!("No checkpoint for '{}'.", config.function),
    }
    Ok(())
}

/// Execute `checkpoint reset`.
pub fn reset(function_path: &Path) -> Result<()> {
    let config = load(function_path)?;
    if orchestrator::reset_checkpoint(&config)? {
        println!("Checkpoint for '{}' reset.", config.function);
    } else {
        println!("No checkpoint for '{}'.", config.function);
    }
    Ok(())
}
