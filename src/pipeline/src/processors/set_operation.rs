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

//! The set-combining processor: folds `N + 1` same-schema input streams
//! into one through a left-to-right cascade of `INTERSECT` / `EXCEPT`
//! pairs.
//!
//! Each pair builds a hash set of row keys from its right-side input, then
//! probes it with the left side chunk by chunk. The surviving rows of one
//! pair become the left side of the next; only the last pair's survivors
//! reach the output port.

use chunkflow_common::array::DataChunk;
use chunkflow_common::buffer::{Bitmap, BitmapBuilder};
use chunkflow_common::catalog::Schema;
use chunkflow_common::hash::{
    calc_hash_key_kind, HashKey, HashKeyKind, Key128, Key16, Key256, Key32, Key64, Key8,
    PrecomputedBuildHasher, SerializedKey,
};
use chunkflow_common::types::DataType;
use itertools::Itertools;

use crate::port::{InputPort, OutputPort};
use crate::processor::{Processor, ProcessorStatus};
use crate::{PipelineError, PipelineResult};

/// A binary set operator applied between two adjacent inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Intersect,
    Except,
}

type KeySet<K> = hashbrown::HashSet<K, PrecomputedBuildHasher>;

/// The hash set of right-side row keys for the current pair, with one
/// monomorphised variant per key layout.
///
/// Insertion never removes keys; duplicates collapse. The store is dropped
/// whole at every pair boundary, taking the serialized key bytes with it.
enum KeySetImpl {
    Key8(KeySet<Key8>),
    Key16(KeySet<Key16>),
    Key32(KeySet<Key32>),
    Key64(KeySet<Key64>),
    Key128(KeySet<Key128>),
    Key256(KeySet<Key256>),
    KeySerialized(KeySet<SerializedKey>),
}

struct SetStore {
    kind: HashKeyKind,
    set: KeySetImpl,
}

impl SetStore {
    fn new(key_types: &[DataType]) -> Self {
        let kind = calc_hash_key_kind(key_types);
        let set = match kind {
            HashKeyKind::Key8 => KeySetImpl::Key8(KeySet::default()),
            HashKeyKind::Key16 => KeySetImpl::Key16(KeySet::default()),
            HashKeyKind::Key32 => KeySetImpl::Key32(KeySet::default()),
            HashKeyKind::Key64 => KeySetImpl::Key64(KeySet::default()),
            HashKeyKind::Key128 => KeySetImpl::Key128(KeySet::default()),
            HashKeyKind::Key256 => KeySetImpl::Key256(KeySet::default()),
            HashKeyKind::KeySerialized => KeySetImpl::KeySerialized(KeySet::default()),
        };
        Self { kind, set }
    }

    /// The key layout is a pure function of the key schema, so the kind
    /// chosen at build time must still match at probe time.
    fn verify_kind(&self, key_types: &[DataType]) -> PipelineResult<()> {
        let probed = calc_hash_key_kind(key_types);
        if probed != self.kind {
            return Err(PipelineError::SetKindMismatch {
                built: self.kind,
                probed,
            });
        }
        Ok(())
    }

    /// Inserts every row key of the chunk (build phase).
    fn insert_chunk(&mut self, key_columns: &[usize], chunk: &DataChunk) {
        fn insert_keys<K: HashKey>(set: &mut KeySet<K>, key_columns: &[usize], chunk: &DataChunk) {
            for key in K::build_many(key_columns, chunk) {
                set.insert(key);
            }
        }

        match &mut self.set {
            KeySetImpl::Key8(set) => insert_keys(set, key_columns, chunk),
            KeySetImpl::Key16(set) => insert_keys(set, key_columns, chunk),
            KeySetImpl::Key32(set) => insert_keys(set, key_columns, chunk),
            KeySetImpl::Key64(set) => insert_keys(set, key_columns, chunk),
            KeySetImpl::Key128(set) => insert_keys(set, key_columns, chunk),
            KeySetImpl::Key256(set) => insert_keys(set, key_columns, chunk),
            KeySetImpl::KeySerialized(set) => insert_keys(set, key_columns, chunk),
        }
    }

    /// Probes every row key of the chunk (probe phase), producing the keep
    /// mask and the number of surviving rows.
    fn probe_chunk(
        &self,
        key_columns: &[usize],
        chunk: &DataChunk,
        operator: SetOperator,
    ) -> (Bitmap, usize) {
        fn build_filter<K: HashKey>(
            set: &KeySet<K>,
            key_columns: &[usize],
            chunk: &DataChunk,
            operator: SetOperator,
        ) -> (Bitmap, usize) {
            let mut filter = BitmapBuilder::with_capacity(chunk.cardinality());
            let mut new_rows_num = 0;
            for key in K::build_many(key_columns, chunk) {
                let is_found = set.contains(&key);
                let keep = match operator {
                    SetOperator::Intersect => is_found,
                    SetOperator::Except => !is_found,
                };
                filter.append(keep);
                if keep {
                    new_rows_num += 1;
                }
            }
            (filter.finish(), new_rows_num)
        }

        match &self.set {
            KeySetImpl::Key8(set) => build_filter(set, key_columns, chunk, operator),
            KeySetImpl::Key16(set) => build_filter(set, key_columns, chunk, operator),
            KeySetImpl::Key32(set) => build_filter(set, key_columns, chunk, operator),
            KeySetImpl::Key64(set) => build_filter(set, key_columns, chunk, operator),
            KeySetImpl::Key128(set) => build_filter(set, key_columns, chunk, operator),
            KeySetImpl::Key256(set) => build_filter(set, key_columns, chunk, operator),
            KeySetImpl::KeySerialized(set) => build_filter(set, key_columns, chunk, operator),
        }
    }
}

const FIRST_INPUT: usize = 0;

/// There are always at least two inputs; the number of operators is the
/// number of inputs minus one:
///
/// ```text
/// input[0] {operator[0]} input[1] {operator[1]} input[2] ...
/// ```
pub struct SetOperationProcessor {
    operators: Vec<SetOperator>,
    key_columns_pos: Vec<usize>,
    key_types: Vec<DataType>,
    inputs: Vec<InputPort>,
    output: OutputPort,

    /// Lazily allocated per pair; reset when the pair advances.
    data: Option<SetStore>,
    /// Index of the gap (and operator) currently being folded.
    current_operator_pos: usize,
    /// Cursor over the right-side inputs, `1..=N`.
    second_input: usize,
    /// The right side of the current pair is drained; probing may start.
    finished_second_input: bool,
    /// The left side comes from the previous pair's output, not `input[0]`.
    use_accumulated_input: bool,
    /// Staging slot for the chunk the next `work` call consumes.
    current_input_chunk: Option<DataChunk>,
    /// Probe survivors: pushed downstream during the last pair, carried to
    /// the next pair otherwise.
    current_output_chunk: Option<DataChunk>,
}

impl SetOperationProcessor {
    /// Creates the processor for `operators.len() + 1` connected inputs.
    ///
    /// `key_column_names` selects the columns that define set membership; an
    /// empty slice means every column is a key column. Key selection is
    /// fixed for the lifetime of the processor.
    pub fn new(
        schema: &Schema,
        operators: Vec<SetOperator>,
        key_column_names: &[&str],
        inputs: Vec<InputPort>,
        output: OutputPort,
    ) -> PipelineResult<Self> {
        if operators.is_empty() {
            return Err(PipelineError::NoOperators);
        }
        if inputs.len() != operators.len() + 1 {
            return Err(PipelineError::InputPortMismatch {
                expected: operators.len() + 1,
                actual: inputs.len(),
            });
        }

        let key_columns_pos = if key_column_names.is_empty() {
            (0..schema.len()).collect_vec()
        } else {
            key_column_names
                .iter()
                .map(|name| {
                    schema
                        .position_by_name(name)
                        .ok_or_else(|| PipelineError::UnknownKeyColumn((*name).to_owned()))
                })
                .try_collect()?
        };
        let key_types = key_columns_pos
            .iter()
            .map(|&pos| schema[pos].data_type)
            .collect_vec();

        Ok(Self {
            operators,
            key_columns_pos,
            key_types,
            inputs,
            output,
            data: None,
            current_operator_pos: 0,
            second_input: 1,
            finished_second_input: false,
            use_accumulated_input: false,
            current_input_chunk: None,
            current_output_chunk: None,
        })
    }

    fn is_last_pair(&self) -> bool {
        self.second_input == self.inputs.len() - 1
    }

    fn current_operator(&self) -> PipelineResult<SetOperator> {
        self.operators
            .get(self.current_operator_pos)
            .copied()
            .ok_or(PipelineError::OperatorPosOutOfRange {
                pos: self.current_operator_pos,
                len: self.operators.len(),
            })
    }

    /// Whether the current pair has consumed its whole left side. For the
    /// first pair the left side is `input[0]`; afterwards it is the
    /// single-chunk accumulated buffer.
    fn left_side_exhausted(&self) -> bool {
        self.inputs[FIRST_INPUT].is_finished()
            || (self.use_accumulated_input && self.current_input_chunk.is_none())
    }

    /// Build phase: fold one right-side chunk into the set store.
    fn accumulate(&mut self, chunk: DataChunk) -> PipelineResult<()> {
        let data = self
            .data
            .get_or_insert_with(|| SetStore::new(&self.key_types));
        data.verify_kind(&self.key_types)?;
        data.insert_chunk(&self.key_columns_pos, &chunk);
        Ok(())
    }

    /// Probe phase: keep the left-side rows selected by the current
    /// operator and rebuild the chunk. Probing against an absent store
    /// allocates an empty one: `INTERSECT` then keeps nothing and `EXCEPT`
    /// keeps everything.
    fn filter(&mut self, chunk: DataChunk) -> PipelineResult<DataChunk> {
        let operator = self.current_operator()?;
        let data = self
            .data
            .get_or_insert_with(|| SetStore::new(&self.key_types));
        data.verify_kind(&self.key_types)?;
        let (filter, new_rows_num) = data.probe_chunk(&self.key_columns_pos, &chunk, operator);
        Ok(chunk.filter(&filter, Some(new_rows_num)))
    }
}

impl Processor for SetOperationProcessor {
    fn name(&self) -> &'static str {
        "SetOperationProcessor"
    }

    fn prepare(&mut self) -> PipelineResult<ProcessorStatus> {
        if self.output.is_finished() {
            for input in &self.inputs {
                input.close();
            }
            return Ok(ProcessorStatus::Finished);
        }

        if !self.output.can_push() {
            for input in &self.inputs {
                input.set_not_needed();
            }
            return Ok(ProcessorStatus::PortFull);
        }

        // During the last pair's probe phase the parked result goes
        // downstream; during earlier pairs it stays buffered as the next
        // pair's left side.
        if self.finished_second_input && self.is_last_pair() {
            if let Some(chunk) = self.current_output_chunk.take() {
                tracing::trace!(rows = chunk.cardinality(), "pushing surviving rows");
                self.output.push(chunk);
            }
        }

        if self.finished_second_input {
            if self.left_side_exhausted() {
                self.second_input += 1;

                if self.second_input == self.inputs.len() {
                    if let Some(chunk) = self.current_output_chunk.take() {
                        self.output.push(chunk);
                    }
                    self.output.finish();
                    for input in &self.inputs {
                        input.close();
                    }
                    return Ok(ProcessorStatus::Finished);
                } else {
                    tracing::debug!(
                        operator_pos = self.current_operator_pos + 1,
                        right_input = self.second_input,
                        "advancing to next pair"
                    );
                    self.use_accumulated_input = true;
                    self.data = None;
                    self.finished_second_input = false;
                    self.current_operator_pos += 1;
                }
            }
        } else if self.inputs[self.second_input].is_finished() {
            self.finished_second_input = true;
        }

        if self.current_input_chunk.is_none() {
            if self.finished_second_input && self.use_accumulated_input {
                // the accumulated left side streams through the output slot
                // one chunk at a time
                self.current_input_chunk = self.current_output_chunk.take();
            } else {
                let input = if self.finished_second_input {
                    &self.inputs[FIRST_INPUT]
                } else {
                    &self.inputs[self.second_input]
                };

                input.set_needed();
                if !input.has_data() {
                    return Ok(ProcessorStatus::NeedData);
                }
                self.current_input_chunk = input.pull();
            }
        }

        Ok(ProcessorStatus::Ready)
    }

    fn work(&mut self) -> PipelineResult<()> {
        let Some(chunk) = self.current_input_chunk.take() else {
            // an internal pair whose accumulated left side was empty
            return Ok(());
        };

        if !self.finished_second_input {
            self.accumulate(chunk)?;
        } else {
            let filtered = self.filter(chunk)?;
            // An internal pair's left side may span several chunks while the
            // accumulated buffer holds only one, so survivors are appended
            // rather than overwritten.
            self.current_output_chunk = Some(match self.current_output_chunk.take() {
                Some(parked) => parked.concat_rows(&filtered),
                None => filtered,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chunkflow_common::catalog::{test_utils, Field};
    use chunkflow_common::test_prelude::DataChunkTestExt;

    use super::*;
    use crate::port::connect;

    struct TestWiring {
        feeders: Vec<OutputPort>,
        reader: InputPort,
        processor: SetOperationProcessor,
    }

    fn wire(
        schema: &Schema,
        operators: Vec<SetOperator>,
        key_column_names: &[&str],
    ) -> TestWiring {
        let mut feeders = Vec::new();
        let mut inputs = Vec::new();
        for _ in 0..operators.len() + 1 {
            let (tx, rx) = connect();
            feeders.push(tx);
            inputs.push(rx);
        }
        let (out_tx, out_rx) = connect();
        let processor =
            SetOperationProcessor::new(schema, operators, key_column_names, inputs, out_tx)
                .unwrap();
        TestWiring {
            feeders,
            reader: out_rx,
            processor,
        }
    }

    #[test]
    fn test_structural_validation() {
        let schema = test_utils::ii();
        let (_tx, rx) = connect();
        let (out_tx, _out_rx) = connect();
        let result =
            SetOperationProcessor::new(&schema, vec![], &[], vec![rx], out_tx);
        assert!(matches!(result, Err(PipelineError::NoOperators)));

        let (_tx, rx) = connect();
        let (out_tx, _out_rx) = connect();
        let result = SetOperationProcessor::new(
            &schema,
            vec![SetOperator::Intersect],
            &[],
            vec![rx],
            out_tx,
        );
        assert!(matches!(
            result,
            Err(PipelineError::InputPortMismatch {
                expected: 2,
                actual: 1
            })
        ));

        let schema = Schema::new(vec![
            Field::with_name(DataType::Int32, "a"),
            Field::with_name(DataType::Int32, "b"),
        ]);
        let mut inputs = Vec::new();
        for _ in 0..2 {
            let (_tx, rx) = connect();
            inputs.push(rx);
        }
        let (out_tx, _out_rx) = connect();
        let result = SetOperationProcessor::new(
            &schema,
            vec![SetOperator::Except],
            &["a", "missing"],
            inputs,
            out_tx,
        );
        assert!(matches!(result, Err(PipelineError::UnknownKeyColumn(_))));
    }

    #[test]
    fn test_demands_right_side_first() {
        let mut wiring = wire(&test_utils::ii(), vec![SetOperator::Intersect], &[]);

        assert_eq!(
            wiring.processor.prepare().unwrap(),
            ProcessorStatus::NeedData
        );
        // the build phase wants the right side, not the left
        assert!(wiring.feeders[1].is_needed());
        assert!(!wiring.feeders[0].is_needed());
    }

    #[test]
    fn test_cancellation_closes_inputs() {
        let mut wiring = wire(&test_utils::ii(), vec![SetOperator::Intersect], &[]);

        wiring.reader.close();
        assert_eq!(
            wiring.processor.prepare().unwrap(),
            ProcessorStatus::Finished
        );
        for feeder in &wiring.feeders {
            assert!(feeder.is_finished());
        }
    }

    #[test]
    fn test_port_full_marks_inputs_not_needed() {
        let mut wiring = wire(&test_utils::ii(), vec![SetOperator::Except], &[]);

        // make the scheduler demand data, then stall the output
        assert_eq!(
            wiring.processor.prepare().unwrap(),
            ProcessorStatus::NeedData
        );
        wiring.feeders[1].push(DataChunk::from_pretty(
            "i i
             1 1",
        ));
        assert_eq!(wiring.processor.prepare().unwrap(), ProcessorStatus::Ready);
        wiring.processor.work().unwrap();
        wiring.feeders[1].finish();
        wiring.feeders[0].push(DataChunk::from_pretty(
            "i i
             2 2",
        ));
        assert_eq!(wiring.processor.prepare().unwrap(), ProcessorStatus::Ready);
        wiring.processor.work().unwrap();

        // the filtered chunk is parked; the next tick pushes it downstream,
        // filling the port, and then waits for more left-side data
        assert_eq!(
            wiring.processor.prepare().unwrap(),
            ProcessorStatus::NeedData
        );
        assert!(wiring.reader.has_data());
        assert_eq!(
            wiring.processor.prepare().unwrap(),
            ProcessorStatus::PortFull
        );
        assert!(!wiring.feeders[0].is_needed());
        assert!(!wiring.feeders[1].is_needed());
    }

    #[test]
    fn test_single_pair_drives_to_finish() {
        let mut wiring = wire(&test_utils::ii(), vec![SetOperator::Intersect], &[]);

        wiring.feeders[1].push(DataChunk::from_pretty(
            "i i
             2 2
             3 3",
        ));
        wiring.feeders[1].finish();
        wiring.feeders[0].push(DataChunk::from_pretty(
            "i i
             1 1
             2 2",
        ));
        wiring.feeders[0].finish();

        let mut outputs = Vec::new();
        loop {
            match wiring.processor.prepare().unwrap() {
                ProcessorStatus::Ready => wiring.processor.work().unwrap(),
                ProcessorStatus::Finished => break,
                status => panic!("unexpected status {status:?}"),
            }
            if let Some(chunk) = wiring.reader.pull() {
                outputs.push(chunk);
            }
        }
        while let Some(chunk) = wiring.reader.pull() {
            outputs.push(chunk);
        }
        assert!(wiring.reader.is_finished());

        let total_rows: usize = outputs.iter().map(DataChunk::cardinality).sum();
        assert_eq!(total_rows, 1);
    }
}
