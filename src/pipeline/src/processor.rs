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

use crate::PipelineResult;

/// What a processor asks of the scheduler at a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorStatus {
    /// The processor is done; it will never become ready again.
    Finished,
    /// The output cannot accept a chunk; wake up when it drains.
    PortFull,
    /// The needed input has no buffered chunk; wake up when data arrives.
    NeedData,
    /// `work` can run.
    Ready,
}

/// A pipeline node driven cooperatively by a scheduler.
///
/// The scheduler alternates `prepare` and `work` until `prepare` returns
/// [`ProcessorStatus::Finished`]. `prepare` makes port transitions and
/// stages data but does no heavy computation; `work` runs the staged step to
/// completion without blocking. Neither is ever invoked concurrently on one
/// instance.
pub trait Processor {
    fn name(&self) -> &'static str;

    fn prepare(&mut self) -> PipelineResult<ProcessorStatus>;

    fn work(&mut self) -> PipelineResult<()>;
}
