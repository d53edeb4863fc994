use std::sync::Arc;

use arrow::array::Int64Array;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use proptest::prelude::*;
use tableflow_sdk::errors::ErrorKind;
use tableflow_sdk::frame::Frame;
use tableflow_sdk::value::{validate_chunk_output, validate_frame_output, Param, Value};

fn frame() -> Frame {
    let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int64, false)]));
    let batch = RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1]))]).unwrap();
    Frame::from_batch(batch)
}

fn path_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        "[a-z]{1,8}\\.parquet".prop_map(Value::from),
    ]
}

fn path_position() -> impl Strategy<Value = Value> {
    prop_oneof![
        path_leaf(),
        prop::collection::vec(path_leaf(), 0..4).prop_map(Value::List),
    ]
}

fn frame_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![Just(Value::Null), Just(Value::Frame(frame()))]
}

fn frame_position() -> impl Strategy<Value = Value> {
    prop_oneof![
        frame_leaf(),
        prop::collection::vec(frame_leaf(), 0..4).prop_map(Value::List),
    ]
}

proptest! {
    #[test]
    fn conforming_chunk_output_keeps_positions(positions in prop::collection::vec(path_position(), 0..6)) {
        let params = validate_chunk_output(Value::List(positions.clone())).unwrap();
        prop_assert_eq!(params.len(), positions.len());
        for (param, position) in params.iter().zip(&positions) {
            match (param, position) {
                (Param::Single(None), Value::Null) => {}
                (Param::Single(Some(p)), Value::Path(q)) => prop_assert_eq!(p, q),
                (Param::Multiple(items), Value::List(values)) => {
                    prop_assert_eq!(items.len(), values.len());
                }
                (param, position) => prop_assert!(false, "{param:?} does not mirror {position}"),
            }
        }
    }

    #[test]
    fn doubly_nested_list_is_rejected(
        positions in prop::collection::vec(path_position(), 0..6),
        leaf in path_leaf(),
        at in any::<prop::sample::Index>(),
    ) {
        let mut positions = positions;
        let index = at.index(positions.len() + 1);
        positions.insert(index, Value::List(vec![Value::List(vec![leaf])]));

        let err = validate_chunk_output(Value::List(positions)).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::TypeShape);
        let expected = format!("position {index}[0]");
        prop_assert!(err.to_string().contains(&expected));
    }

    #[test]
    fn frames_never_pass_as_paths(
        positions in prop::collection::vec(path_position(), 0..6),
        at in any::<prop::sample::Index>(),
    ) {
        let mut positions = positions;
        let index = at.index(positions.len() + 1);
        positions.insert(index, Value::Frame(frame()));
        prop_assert!(validate_chunk_output(Value::List(positions)).is_err());
    }

    #[test]
    fn conforming_frame_output_is_accepted(values in prop::collection::vec(frame_position(), 0..6)) {
        prop_assert!(validate_frame_output(&values).is_ok());
    }

    #[test]
    fn paths_never_pass_as_frames(
        values in prop::collection::vec(frame_position(), 0..6),
        at in any::<prop::sample::Index>(),
        wrap in any::<bool>(),
    ) {
        let mut values = values;
        let index = at.index(values.len() + 1);
        let path = Value::from("a.parquet");
        values.insert(index, if wrap { Value::List(vec![path]) } else { path });

        let err = validate_frame_output(&values).unwrap_err();
        prop_assert_eq!(err.kind(), ErrorKind::TypeShape);
    }
}
