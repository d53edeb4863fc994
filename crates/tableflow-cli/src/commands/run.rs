use std::path::Path;

use anyhow::{Context, Result};

use tableflow_engine::config::parser;
use tableflow_engine::orchestrator;

/// Execute the `run` command: parse the function and run it once.
pub fn execute(function_path: &Path, json: bool) -> Result<()> {
    let config = parser::parse_function(function_path)
        .with_context(|| format!("Failed to parse function: {}", function_path.display()))?;

    tracing::info!(
        function = config.function,
        source = config.source.use_ref,
        destination = config.destination.use_ref,
        parameters = config.parameters.len(),
        "Function loaded"
    );

    let result = orchestrator::run_configured(&config)?;

    println!("Function '{}' completed successfully.", config.function);
    println!("  Run:             {}", result.run_id);
    println!("  Parameters:      {}", result.parameters);
    println!("  Frames read:     {}", result.frames_read);
    println!("  Rows read:       {}", result.rows_read);
    println!("  Results written: {}", result.results_written);
    match &result.checkpoint {
        Some(values) => println!("  Checkpoint:      {values}"),
        None => println!("  Checkpoint:      unchanged"),
    }
    println!("  Duration:        {:.2}s", result.duration_secs);
    println!("    Source:        {:.3}s", result.source_duration_secs);
    println!("    Function:      {:.3}s", result.function_duration_secs);
    println!("    Destination:   {:.3}s", result.dest_duration_secs);

    if json {
        let summary = serde_json::json!({
            "function": config.function,
            "run_id": result.run_id,
            "parameters": result.parameters,
            "frames_read": result.frames_read,
            "rows_read": result.rows_read,
            "results_written": result.results_written,
            "checkpoint": result.checkpoint.as_ref().map(|v| v.as_map()),
            "duration_secs": result.duration_secs,
            "source_duration_secs": result.source_duration_secs,
            "function_duration_secs": result.function_duration_secs,
            "dest_duration_secs": result.dest_duration_secs,
        });
        println!("{summary}");
    }

    Ok(())
}
