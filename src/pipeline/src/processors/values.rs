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

use std::collections::VecDeque;

use chunkflow_common::array::DataChunk;

use crate::port::OutputPort;
use crate::processor::{Processor, ProcessorStatus};
use crate::PipelineResult;

/// A source that pushes a fixed list of chunks, one per tick, then finishes.
pub struct ValuesProcessor {
    chunks: VecDeque<DataChunk>,
    output: OutputPort,
}

impl ValuesProcessor {
    pub fn new(chunks: Vec<DataChunk>, output: OutputPort) -> Self {
        Self {
            chunks: chunks.into(),
            output,
        }
    }
}

impl Processor for ValuesProcessor {
    fn name(&self) -> &'static str {
        "ValuesProcessor"
    }

    fn prepare(&mut self) -> PipelineResult<ProcessorStatus> {
        if self.output.is_finished() {
            // downstream cancelled; drop what is left
            self.chunks.clear();
            return Ok(ProcessorStatus::Finished);
        }
        if self.chunks.is_empty() {
            self.output.finish();
            return Ok(ProcessorStatus::Finished);
        }
        if !self.output.can_push() {
            return Ok(ProcessorStatus::PortFull);
        }
        Ok(ProcessorStatus::Ready)
    }

    fn work(&mut self) -> PipelineResult<()> {
        if let Some(chunk) = self.chunks.pop_front() {
            self.output.push(chunk);
        }
        Ok(())
    }
}
