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

use std::sync::Arc;

use chunkflow_common::array::DataChunk;
use parking_lot::Mutex;

use crate::port::InputPort;
use crate::processor::{Processor, ProcessorStatus};
use crate::PipelineResult;

/// A sink that collects every chunk it receives into a shared buffer.
pub struct BufferSink {
    input: InputPort,
    collected: Arc<Mutex<Vec<DataChunk>>>,
}

impl BufferSink {
    pub fn new(input: InputPort) -> Self {
        Self {
            input,
            collected: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle to the collected chunks, valid after the pipeline finishes.
    pub fn handle(&self) -> Arc<Mutex<Vec<DataChunk>>> {
        self.collected.clone()
    }
}

impl Processor for BufferSink {
    fn name(&self) -> &'static str {
        "BufferSink"
    }

    fn prepare(&mut self) -> PipelineResult<ProcessorStatus> {
        if self.input.is_finished() {
            return Ok(ProcessorStatus::Finished);
        }
        self.input.set_needed();
        if !self.input.has_data() {
            return Ok(ProcessorStatus::NeedData);
        }
        Ok(ProcessorStatus::Ready)
    }

    fn work(&mut self) -> PipelineResult<()> {
        if let Some(chunk) = self.input.pull() {
            self.collected.lock().push(chunk);
        }
        Ok(())
    }
}
