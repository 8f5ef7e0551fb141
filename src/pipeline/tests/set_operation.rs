// Copyright 2025 Chunkflow Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! End-to-end tests of the set operation cascade through a full pipeline:
//! value sources, the set operation processor, and a collecting sink driven
//! by the cooperative scheduler.

use std::collections::HashSet;
use std::sync::Arc;

use chunkflow_common::array::{DataChunk, I32Array};
use chunkflow_common::catalog::{Field, Schema};
use chunkflow_common::test_prelude::DataChunkTestExt;
use chunkflow_common::types::{DataType, Datum, ScalarRefImpl};
use chunkflow_pipeline::pipeline::Pipeline;
use chunkflow_pipeline::port::connect;
use chunkflow_pipeline::processors::{
    BufferSink, SetOperationProcessor, SetOperator, ValuesProcessor,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn ii_schema() -> Schema {
    Schema::new(vec![
        Field::with_name(DataType::Int32, "a"),
        Field::with_name(DataType::Int32, "b"),
    ])
}

/// Wires sources, the set operation processor, and a sink into a pipeline,
/// runs it to completion, and returns the collected output chunks.
fn run_cascade(
    schema: &Schema,
    operators: Vec<SetOperator>,
    key_columns: &[&str],
    inputs: Vec<Vec<DataChunk>>,
) -> Vec<DataChunk> {
    let mut pipeline = Pipeline::new();

    let mut input_ports = Vec::new();
    for chunks in inputs {
        let (tx, rx) = connect();
        pipeline.add_processor(Box::new(ValuesProcessor::new(chunks, tx)));
        input_ports.push(rx);
    }

    let (out_tx, out_rx) = connect();
    let processor =
        SetOperationProcessor::new(schema, operators, key_columns, input_ports, out_tx).unwrap();
    pipeline.add_processor(Box::new(processor));

    let sink = BufferSink::new(out_rx);
    let handle = sink.handle();
    pipeline.add_processor(Box::new(sink));

    pipeline.run().unwrap();

    let mut collected = handle.lock();
    collected.drain(..).collect()
}

fn collect_rows(chunks: &[DataChunk]) -> Vec<Vec<Datum>> {
    let mut rows = Vec::new();
    for chunk in chunks {
        for idx in 0..chunk.cardinality() {
            rows.push(
                chunk
                    .row_at(idx)
                    .into_iter()
                    .map(|datum| datum.map(ScalarRefImpl::into_scalar_impl))
                    .collect(),
            );
        }
    }
    rows
}

fn assert_rows_eq(actual: &[DataChunk], expected: &DataChunk) {
    assert_eq!(
        collect_rows(actual),
        collect_rows(std::slice::from_ref(expected))
    );
}

#[test]
fn test_intersect() {
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect],
        &[],
        vec![
            vec![DataChunk::from_pretty(
                "i i
                 1 1
                 2 2
                 3 3",
            )],
            vec![DataChunk::from_pretty(
                "i i
                 2 2
                 3 3
                 4 4",
            )],
        ],
    );
    assert_rows_eq(
        &output,
        &DataChunk::from_pretty(
            "i i
             2 2
             3 3",
        ),
    );
}

#[test]
fn test_except() {
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Except],
        &[],
        vec![
            vec![DataChunk::from_pretty(
                "i i
                 1 1
                 2 2
                 3 3",
            )],
            vec![DataChunk::from_pretty(
                "i i
                 2 2
                 3 3
                 4 4",
            )],
        ],
    );
    assert_rows_eq(
        &output,
        &DataChunk::from_pretty(
            "i i
             1 1",
        ),
    );
}

#[test]
fn test_chained_intersect_except() {
    // L INTERSECT M EXCEPT R
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect, SetOperator::Except],
        &[],
        vec![
            vec![DataChunk::from_pretty(
                "i i
                 1 1
                 2 2
                 3 3
                 4 4",
            )],
            vec![DataChunk::from_pretty(
                "i i
                 2 2
                 3 3
                 4 4
                 5 5",
            )],
            vec![DataChunk::from_pretty(
                "i i
                 3 3",
            )],
        ],
    );
    assert_rows_eq(
        &output,
        &DataChunk::from_pretty(
            "i i
             2 2
             4 4",
        ),
    );
}

#[test]
fn test_key_column_subset() {
    // keys restricted to column `a`: rows that agree on `a` are equal for
    // set purposes, and all matching left rows survive, duplicates included
    let left = || {
        vec![DataChunk::from_pretty(
            "i i
             1 10
             1 20
             2 30",
        )]
    };
    let right = || {
        vec![DataChunk::from_pretty(
            "i i
             1 99",
        )]
    };

    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect],
        &["a"],
        vec![left(), right()],
    );
    assert_rows_eq(
        &output,
        &DataChunk::from_pretty(
            "i i
             1 10
             1 20",
        ),
    );

    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Except],
        &["a"],
        vec![left(), right()],
    );
    assert_rows_eq(
        &output,
        &DataChunk::from_pretty(
            "i i
             2 30",
        ),
    );
}

#[test]
fn test_empty_right_side() {
    let left = || {
        vec![DataChunk::from_pretty(
            "i i
             1 1
             2 2",
        )]
    };

    // probing an empty set: INTERSECT keeps nothing
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect],
        &[],
        vec![left(), vec![]],
    );
    assert!(collect_rows(&output).is_empty());

    // and EXCEPT keeps everything
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Except],
        &[],
        vec![left(), vec![]],
    );
    assert_rows_eq(
        &output,
        &DataChunk::from_pretty(
            "i i
             1 1
             2 2",
        ),
    );

    // same through a zero-row right chunk instead of no chunk at all
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect],
        &[],
        vec![left(), vec![DataChunk::from_pretty("i i")]],
    );
    assert!(collect_rows(&output).is_empty());
}

#[test]
fn test_empty_left_side() {
    for operator in [SetOperator::Intersect, SetOperator::Except] {
        let output = run_cascade(
            &ii_schema(),
            vec![operator],
            &[],
            vec![
                vec![],
                vec![DataChunk::from_pretty(
                    "i i
                     1 1",
                )],
            ],
        );
        assert!(collect_rows(&output).is_empty());
    }
}

#[test]
fn test_multi_chunk_left_preserves_chunk_boundaries() {
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect],
        &[],
        vec![
            vec![
                DataChunk::from_pretty(
                    "i i
                     1 1
                     2 2",
                ),
                DataChunk::from_pretty(
                    "i i
                     3 3
                     2 2",
                ),
            ],
            vec![DataChunk::from_pretty(
                "i i
                 2 2",
            )],
        ],
    );
    // one output chunk per surviving left chunk, in pull order
    assert_eq!(output.len(), 2);
    assert_rows_eq(
        &output[..1],
        &DataChunk::from_pretty(
            "i i
             2 2",
        ),
    );
    assert_rows_eq(
        &output[1..],
        &DataChunk::from_pretty(
            "i i
             2 2",
        ),
    );
}

#[test]
fn test_zero_row_chunk_mid_stream() {
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Except],
        &[],
        vec![
            vec![
                DataChunk::from_pretty(
                    "i i
                     1 1",
                ),
                DataChunk::from_pretty("i i"),
                DataChunk::from_pretty(
                    "i i
                     2 2
                     3 3",
                ),
            ],
            vec![DataChunk::from_pretty(
                "i i
                 2 2",
            )],
        ],
    );
    assert_eq!(
        collect_rows(&output),
        collect_rows(&[DataChunk::from_pretty(
            "i i
             1 1
             3 3",
        )])
    );
}

#[test]
fn test_intersect_self_preserves_left_duplicates() {
    // the right-side set collapses duplicates, while every matching left
    // row survives, so A INTERSECT A = A
    let a = || {
        vec![DataChunk::from_pretty(
            "i i
             1 1
             1 1
             2 2",
        )]
    };
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect],
        &[],
        vec![a(), a()],
    );
    assert_rows_eq(
        &output,
        &DataChunk::from_pretty(
            "i i
             1 1
             1 1
             2 2",
        ),
    );
}

#[test]
fn test_except_self_is_empty() {
    let a = || {
        vec![DataChunk::from_pretty(
            "i i
             1 1
             2 2",
        )]
    };
    let output = run_cascade(&ii_schema(), vec![SetOperator::Except], &[], vec![a(), a()]);
    assert!(collect_rows(&output).is_empty());
}

#[test]
fn test_except_then_intersect_is_empty() {
    // (A EXCEPT B) INTERSECT B = ∅
    let a = vec![DataChunk::from_pretty(
        "i i
         1 1
         2 2
         3 3",
    )];
    let b = || {
        vec![DataChunk::from_pretty(
            "i i
             2 2",
        )]
    };
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Except, SetOperator::Intersect],
        &[],
        vec![a, b(), b()],
    );
    assert!(collect_rows(&output).is_empty());
}

#[test]
fn test_cascade_equals_two_stage_run() {
    // A op1 B op2 C equals applying op2 with right side C to the result of
    // A op1 B
    let a = vec![DataChunk::from_pretty(
        "i i
         1 1
         2 2
         3 3
         4 4
         2 2",
    )];
    let b = || {
        vec![DataChunk::from_pretty(
            "i i
             2 2
             3 3
             5 5",
        )]
    };
    let c = || {
        vec![DataChunk::from_pretty(
            "i i
             3 3
             6 6",
        )]
    };

    let chained = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect, SetOperator::Except],
        &[],
        vec![a.clone(), b(), c()],
    );

    let first = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect],
        &[],
        vec![a, b()],
    );
    let second = run_cascade(
        &ii_schema(),
        vec![SetOperator::Except],
        &[],
        vec![first, c()],
    );

    assert_eq!(collect_rows(&chained), collect_rows(&second));
}

#[test]
fn test_multi_chunk_left_through_internal_pair() {
    // the first pair's survivors span several chunks; the internal pair
    // must see all of them
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect, SetOperator::Except],
        &[],
        vec![
            vec![
                DataChunk::from_pretty(
                    "i i
                     1 1
                     2 2",
                ),
                DataChunk::from_pretty(
                    "i i
                     3 3
                     4 4",
                ),
            ],
            vec![DataChunk::from_pretty(
                "i i
                 2 2
                 3 3
                 4 4
                 5 5",
            )],
            vec![DataChunk::from_pretty(
                "i i
                 3 3",
            )],
        ],
    );
    assert_eq!(
        collect_rows(&output),
        collect_rows(&[DataChunk::from_pretty(
            "i i
             2 2
             4 4",
        )])
    );
}

#[test]
fn test_null_keys_compare_equal() {
    let output = run_cascade(
        &ii_schema(),
        vec![SetOperator::Intersect],
        &[],
        vec![
            vec![DataChunk::from_pretty(
                "i i
                 1 .
                 . .
                 1 1",
            )],
            vec![DataChunk::from_pretty(
                "i i
                 1 .
                 . .",
            )],
        ],
    );
    assert_eq!(
        collect_rows(&output),
        collect_rows(&[DataChunk::from_pretty(
            "i i
             1 .
             . .",
        )])
    );
}

#[test]
fn test_varchar_keys() {
    let schema = Schema::new(vec![
        Field::with_name(DataType::Varchar, "k"),
        Field::with_name(DataType::Int64, "v"),
    ]);
    let output = run_cascade(
        &schema,
        vec![SetOperator::Except],
        &[],
        vec![
            vec![DataChunk::from_pretty(
                "T I
                 foo 1
                 bar 2
                 baz 3",
            )],
            vec![DataChunk::from_pretty(
                "T I
                 bar 2",
            )],
        ],
    );
    assert_eq!(
        collect_rows(&output),
        collect_rows(&[DataChunk::from_pretty(
            "T I
             foo 1
             baz 3",
        )])
    );
}

fn chunk_of(rows: &[(i32, i32)]) -> DataChunk {
    let a: I32Array = rows.iter().map(|(a, _)| Some(*a)).collect();
    let b: I32Array = rows.iter().map(|(_, b)| Some(*b)).collect();
    DataChunk::new(
        vec![Arc::new(a.into()), Arc::new(b.into())],
        rows.len(),
    )
}

/// Naive reference model: materialize each right side into a set and fold
/// the operators left to right over row vectors.
fn reference_cascade(inputs: &[Vec<(i32, i32)>], operators: &[SetOperator]) -> Vec<(i32, i32)> {
    let mut left = inputs[0].clone();
    for (pos, operator) in operators.iter().enumerate() {
        let right: HashSet<(i32, i32)> = inputs[pos + 1].iter().copied().collect();
        left.retain(|row| match operator {
            SetOperator::Intersect => right.contains(row),
            SetOperator::Except => !right.contains(row),
        });
    }
    left
}

#[test]
fn test_randomized_against_reference_model() {
    let mut rng = StdRng::seed_from_u64(0xc0ffee);

    for _ in 0..50 {
        let num_operators = rng.gen_range(1..=3);
        let operators: Vec<SetOperator> = (0..num_operators)
            .map(|_| {
                if rng.gen_bool(0.5) {
                    SetOperator::Intersect
                } else {
                    SetOperator::Except
                }
            })
            .collect();

        let inputs: Vec<Vec<(i32, i32)>> = (0..=num_operators)
            .map(|_| {
                let len = rng.gen_range(0..30);
                (0..len)
                    .map(|_| (rng.gen_range(0..8), rng.gen_range(0..4)))
                    .collect()
            })
            .collect();

        let expected = reference_cascade(&inputs, &operators);

        // deliver each input in randomly sized chunks
        let chunked: Vec<Vec<DataChunk>> = inputs
            .iter()
            .map(|rows| {
                let mut chunks = Vec::new();
                let mut rest = rows.as_slice();
                while !rest.is_empty() {
                    let take = rng.gen_range(1..=rest.len());
                    chunks.push(chunk_of(&rest[..take]));
                    rest = &rest[take..];
                }
                chunks
            })
            .collect();

        let output = run_cascade(&ii_schema(), operators, &[], chunked);
        let actual: Vec<(i32, i32)> = collect_rows(&output)
            .into_iter()
            .map(|row| {
                let a = match row[0] {
                    Some(chunkflow_common::types::ScalarImpl::Int32(v)) => v,
                    _ => panic!("unexpected datum"),
                };
                let b = match row[1] {
                    Some(chunkflow_common::types::ScalarImpl::Int32(v)) => v,
                    _ => panic!("unexpected datum"),
                };
                (a, b)
            })
            .collect();

        assert_eq!(actual, expected);
    }
}
