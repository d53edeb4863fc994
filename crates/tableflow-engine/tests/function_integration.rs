//! Integration tests for configured function runs against real Parquet
//! files and an on-disk state backend.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use arrow::array::Int64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use tableflow_engine::config::parser;
use tableflow_engine::{
    identity, reset_checkpoint, run_configured, run_function, show_checkpoint, FnFunction,
    PipelineError, RunOptions,
};
use tableflow_sdk::errors::ErrorKind;
use tableflow_sdk::local::{
    IncrementalConfig, LocalDestinationConfig, LocalFileDestination, LocalFileSource,
    LocalSourceConfig, LAST_FILE_KEY,
};
use tableflow_sdk::plugin::PluginKind;
use tableflow_sdk::prelude::*;
use tableflow_state::{SqliteStateBackend, StateBackend};
use tableflow_types::state::FunctionId;

fn write_parquet(path: &Path, ids: Vec<i64>) {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
    let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(Int64Array::from(ids))]).unwrap();
    let mut writer = ArrowWriter::try_new(File::create(path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

fn parquet_rows(path: &Path) -> usize {
    ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
        .unwrap()
        .build()
        .unwrap()
        .map(|batch| batch.unwrap().num_rows())
        .sum()
}

/// Incremental function layout under one temporary root.
struct Fixture {
    root: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("in")).unwrap();
        Self { root }
    }

    fn input(&self, name: &str) -> std::path::PathBuf {
        self.root.path().join("in").join(name)
    }

    fn output(&self, name: &str) -> std::path::PathBuf {
        self.root.path().join("out").join(name)
    }

    fn config(&self) -> tableflow_engine::config::types::FunctionConfig {
        let root = self.root.path().display();
        let yaml = format!(
            r#"
version: "1.0"
function: daily_orders
parameters: [orders]
source:
  use: local-file-source
  config:
    directory: {root}/in
    incremental:
      extension: parquet
destination:
  use: local-file-destination
  config:
    directory: {root}/out
    tables: [orders]
state:
  backend: sqlite
  connection: {root}/state.db
working_dir: {root}/work
"#
        );
        parser::parse_function_str(&yaml).expect("fixture yaml must parse")
    }

    fn source(&self) -> LocalFileSource {
        LocalFileSource::new(LocalSourceConfig {
            directory: self.root.path().join("in"),
            files: Vec::new(),
            incremental: Some(IncrementalConfig {
                extension: "parquet".into(),
            }),
        })
        .unwrap()
    }

    fn destination(&self, tables: &[&str]) -> LocalFileDestination {
        LocalFileDestination::new(LocalDestinationConfig {
            directory: self.root.path().join("out"),
            tables: tables.iter().map(|t| t.to_string()).collect(),
        })
        .unwrap()
    }
}

/// Destination whose delivery always fails.
struct BrokenDestination;

impl DestinationPlugin for BrokenDestination {
    const IDENTIFIER: &'static str = "broken";

    fn chunk(&mut self, _: &Path, _: &[Value]) -> Result<Value, PluginError> {
        Err(PluginError::connector("disk full"))
    }
}

/// Writes its input into the working directory without creating it first.
struct StagingSource;

impl SourcePlugin for StagingSource {
    const IDENTIFIER: &'static str = "staging";

    fn chunk(&mut self, working_dir: &Path, _: &mut Offset) -> Result<Value, PluginError> {
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
        let batch = RecordBatch::try_new(schema.clone(), vec![Arc::new(Int64Array::from(vec![7]))])?;
        let mut writer = ArrowWriter::try_new(File::create(working_dir.join("a.parquet"))?, schema, None)?;
        writer.write(&batch)?;
        writer.close()?;
        Ok(Value::from("a.parquet"))
    }
}

/// Stages a marker file in the working directory without creating it first.
struct StagingDestination;

impl DestinationPlugin for StagingDestination {
    const IDENTIFIER: &'static str = "staging";

    fn chunk(&mut self, working_dir: &Path, _: &[Value]) -> Result<Value, PluginError> {
        std::fs::write(working_dir.join("marker"), b"x")?;
        Ok(Value::from("marker"))
    }
}

#[test]
fn test_plugins_can_write_into_working_dir_directly() {
    let state = SqliteStateBackend::in_memory().unwrap();
    let result = run_function(
        &FunctionId::new("staged"),
        &mut StagingSource,
        &mut identity("staged", vec!["a".into()]),
        &mut StagingDestination,
        &state,
        &RunOptions::default(),
    )
    .expect("stage folders are created by the runner");
    assert_eq!(result.frames_read, 1);
    assert_eq!(result.rows_read, 1);
}

#[test]
fn test_null_results_are_not_counted_as_written() {
    let fx = Fixture::new();
    write_parquet(&fx.input("a.parquet"), vec![1]);
    let state = SqliteStateBackend::in_memory().unwrap();

    let mut function = FnFunction::new(
        "drop_all",
        vec!["orders".into()],
        vec!["orders".into()],
        |_| Ok(vec![Value::Null]),
    );
    let result = run_function(
        &FunctionId::new("drop_all"),
        &mut fx.source(),
        &mut function,
        &mut fx.destination(&["orders"]),
        &state,
        &RunOptions::default(),
    )
    .unwrap();
    assert_eq!(result.frames_read, 1);
    assert_eq!(result.results_written, 0);
}

#[test]
fn test_static_file_stays_out_of_incremental_checkpoint() {
    let fx = Fixture::new();
    write_parquet(&fx.input("zones.parquet"), vec![1, 2]);
    write_parquet(&fx.input("orders-001.parquet"), vec![10]);
    let root = fx.root.path();
    let mut config = fx.config();
    config.parameters = vec!["zones".into(), "orders".into()];
    config.source.config = serde_json::json!({
        "directory": root.join("in"),
        "files": ["zones.parquet"],
        "incremental": { "extension": "parquet" },
    });
    config.destination.config = serde_json::json!({
        "directory": root.join("out"),
        "tables": ["zones", "orders"],
    });

    let first = run_configured(&config).unwrap();
    assert_eq!(first.frames_read, 2);
    assert_eq!(
        first.checkpoint.as_ref().and_then(|v| v.get(LAST_FILE_KEY)),
        Some("orders-001.parquet")
    );

    write_parquet(&fx.input("orders-002.parquet"), vec![20, 30]);
    let second = run_configured(&config).unwrap();
    assert_eq!(second.frames_read, 2);
    assert_eq!(second.rows_read, 4);
    assert_eq!(
        second.checkpoint.as_ref().and_then(|v| v.get(LAST_FILE_KEY)),
        Some("orders-002.parquet")
    );
    assert_eq!(parquet_rows(&fx.output("orders_0.parquet")), 2);
}

#[test]
fn test_incremental_runs_pick_up_only_new_files() {
    let fx = Fixture::new();
    write_parquet(&fx.input("2024-01.parquet"), vec![1, 2]);
    write_parquet(&fx.input("2024-02.parquet"), vec![3]);
    let config = fx.config();

    let first = run_configured(&config).expect("first run");
    assert_eq!(first.parameters, 1);
    assert_eq!(first.frames_read, 2);
    assert_eq!(first.rows_read, 3);
    assert_eq!(first.results_written, 1);
    assert_eq!(
        first.checkpoint.as_ref().and_then(|v| v.get(LAST_FILE_KEY)),
        Some("2024-02.parquet")
    );
    assert_eq!(parquet_rows(&fx.output("orders_0.parquet")), 2);
    assert_eq!(parquet_rows(&fx.output("orders_1.parquet")), 1);

    write_parquet(&fx.input("2024-03.parquet"), vec![4, 5, 6]);
    let second = run_configured(&config).expect("second run");
    assert_eq!(second.frames_read, 1);
    assert_eq!(second.rows_read, 3);
    assert_eq!(parquet_rows(&fx.output("orders_0.parquet")), 3);

    let record = show_checkpoint(&config).unwrap().expect("checkpoint persisted");
    assert_eq!(record.values.get(LAST_FILE_KEY), Some("2024-03.parquet"));
    assert_eq!(record.run_id, Some(second.run_id));

    // Nothing new: the run succeeds and the checkpoint stays where it was.
    let third = run_configured(&config).expect("third run");
    assert_eq!(third.frames_read, 0);
    assert!(!third.checkpoint_committed());
    let record = show_checkpoint(&config).unwrap().unwrap();
    assert_eq!(record.run_id, Some(second.run_id));
}

#[test]
fn test_kept_working_dir_holds_staged_files() {
    let fx = Fixture::new();
    write_parquet(&fx.input("a.parquet"), vec![1]);
    let result = run_configured(&fx.config()).unwrap();

    let run_dir = fx
        .root
        .path()
        .join("work")
        .join("daily_orders")
        .join(format!("run-{}", result.run_id));
    assert!(run_dir.join("source").join("a.parquet").is_file());
}

#[test]
fn test_reset_checkpoint_replays_all_files() {
    let fx = Fixture::new();
    write_parquet(&fx.input("a.parquet"), vec![1]);
    write_parquet(&fx.input("b.parquet"), vec![2]);
    let config = fx.config();

    assert_eq!(run_configured(&config).unwrap().frames_read, 2);
    assert_eq!(run_configured(&config).unwrap().frames_read, 0);

    assert!(reset_checkpoint(&config).unwrap());
    assert!(show_checkpoint(&config).unwrap().is_none());
    assert!(!reset_checkpoint(&config).unwrap());
    assert_eq!(run_configured(&config).unwrap().frames_read, 2);
}

#[test]
fn test_registration_values_seed_first_run() {
    let fx = Fixture::new();
    write_parquet(&fx.input("2024-01.parquet"), vec![1]);
    write_parquet(&fx.input("2024-02.parquet"), vec![2]);
    let mut config = fx.config();
    config.source.initial_values.insert(LAST_FILE_KEY, "2024-01.parquet");

    let result = run_configured(&config).unwrap();
    assert_eq!(result.frames_read, 1);
}

#[test]
fn test_decorator_values_ignore_persisted_checkpoint() {
    let fx = Fixture::new();
    write_parquet(&fx.input("a.parquet"), vec![1]);
    let mut config = fx.config();
    config.source.use_decorator_values = true;

    assert_eq!(run_configured(&config).unwrap().frames_read, 1);
    assert_eq!(run_configured(&config).unwrap().frames_read, 1);
}

#[test]
fn test_failed_destination_leaves_checkpoint_unchanged() {
    let fx = Fixture::new();
    write_parquet(&fx.input("a.parquet"), vec![1]);
    let state = SqliteStateBackend::in_memory().unwrap();
    let id = FunctionId::new("broken_fn");

    let err = run_function(
        &id,
        &mut fx.source(),
        &mut identity("broken_fn", vec!["orders".into()]),
        &mut BrokenDestination,
        &state,
        &RunOptions::default(),
    )
    .unwrap_err();

    match &err {
        PipelineError::Plugin { kind, plugin, .. } => {
            assert_eq!(*kind, PluginKind::Destination);
            assert_eq!(*plugin, "broken");
        }
        other => panic!("expected plugin error, got {other:?}"),
    }
    assert_eq!(err.plugin_error_kind(), Some(ErrorKind::Connector));
    assert!(state.get_checkpoint(&id).unwrap().is_none());
}

#[test]
fn test_failed_function_leaves_checkpoint_unchanged() {
    let fx = Fixture::new();
    write_parquet(&fx.input("a.parquet"), vec![1]);
    let state = SqliteStateBackend::in_memory().unwrap();
    let id = FunctionId::new("failing_fn");

    let mut function = FnFunction::new(
        "failing_fn",
        vec!["orders".into()],
        vec!["orders".into()],
        |_| anyhow::bail!("division by zero"),
    );
    let err = run_function(
        &id,
        &mut fx.source(),
        &mut function,
        &mut fx.destination(&["orders"]),
        &state,
        &RunOptions::default(),
    )
    .unwrap_err();

    assert!(matches!(err, PipelineError::Function { .. }));
    assert!(err.to_string().contains("division by zero"), "got: {err}");
    assert!(state.get_checkpoint(&id).unwrap().is_none());
    assert!(!fx.output("orders_0.parquet").exists());
}

#[test]
fn test_source_parameter_count_must_match_function() {
    let fx = Fixture::new();
    let state = SqliteStateBackend::in_memory().unwrap();

    let err = run_function(
        &FunctionId::new("two_params"),
        &mut fx.source(),
        &mut identity("two_params", vec!["a".into(), "b".into()]),
        &mut fx.destination(&["a", "b"]),
        &state,
        &RunOptions::default(),
    )
    .unwrap_err();

    match err {
        PipelineError::ParameterMismatch {
            expected, actual, ..
        } => {
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("expected parameter mismatch, got {other:?}"),
    }
}

#[test]
fn test_destination_arity_checked_before_delivery() {
    let fx = Fixture::new();
    write_parquet(&fx.input("a.parquet"), vec![1]);
    let state = SqliteStateBackend::in_memory().unwrap();
    let id = FunctionId::new("fan_out");

    let mut function = FnFunction::new(
        "fan_out",
        vec!["orders".into()],
        vec!["left".into(), "right".into()],
        |inputs: Vec<Value>| Ok(vec![inputs[0].clone(), Value::Null]),
    );
    let err = run_function(
        &id,
        &mut fx.source(),
        &mut function,
        &mut fx.destination(&["orders"]),
        &state,
        &RunOptions::default(),
    )
    .unwrap_err();

    assert_eq!(err.plugin_error_kind(), Some(ErrorKind::Arity));
    assert!(!fx.root.path().join("out").exists());
    assert!(state.get_checkpoint(&id).unwrap().is_none());
}

#[test]
fn test_invalid_config_is_rejected_before_running() {
    let fx = Fixture::new();
    let mut config = fx.config();
    config.parameters.push("extra".into());

    let err = run_configured(&config).unwrap_err();
    assert!(matches!(err, PipelineError::Infrastructure(_)));
    assert!(
        err.to_string().contains("Function validation failed"),
        "got: {err}"
    );
    assert!(!fx.root.path().join("state.db").exists());
}
