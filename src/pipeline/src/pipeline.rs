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

use anyhow::anyhow;

use crate::processor::{Processor, ProcessorStatus};
use crate::PipelineResult;

/// A single-threaded cooperative driver over a set of connected processors.
///
/// Each round polls every unfinished processor once and runs `work` for the
/// ready ones. A round in which nothing is ready and nothing finishes means
/// the port graph can no longer make progress, which is a wiring bug.
#[derive(Default)]
pub struct Pipeline {
    processors: Vec<Box<dyn Processor>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_processor(&mut self, processor: Box<dyn Processor>) {
        self.processors.push(processor);
    }

    pub fn run(&mut self) -> PipelineResult<()> {
        let mut finished = vec![false; self.processors.len()];

        while !finished.iter().all(|done| *done) {
            let mut progressed = false;

            for (idx, processor) in self.processors.iter_mut().enumerate() {
                if finished[idx] {
                    continue;
                }
                match processor.prepare()? {
                    ProcessorStatus::Finished => {
                        tracing::debug!(processor = processor.name(), "processor finished");
                        finished[idx] = true;
                        progressed = true;
                    }
                    ProcessorStatus::Ready => {
                        processor.work()?;
                        progressed = true;
                    }
                    ProcessorStatus::NeedData | ProcessorStatus::PortFull => {}
                }
            }

            if !progressed {
                return Err(anyhow!("pipeline stuck: no processor can make progress").into());
            }
        }

        Ok(())
    }
}
