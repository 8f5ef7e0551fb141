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

//! Single-slot ports connecting processors.
//!
//! A connected pair shares one cell holding at most one chunk. The producer
//! side pushes into the cell and eventually declares itself finished; the
//! consumer side pulls, flags demand, and may close the port to cancel
//! upstream work. All transitions happen between scheduler ticks; ports
//! never block.

use std::sync::Arc;

use chunkflow_common::array::DataChunk;
use parking_lot::Mutex;

#[derive(Default)]
struct PortCell {
    chunk: Option<DataChunk>,
    /// The producer has no more data to push.
    finished: bool,
    /// The consumer no longer wants data.
    closed: bool,
    /// The consumer currently wants data.
    needed: bool,
}

/// Creates a connected output/input port pair.
pub fn connect() -> (OutputPort, InputPort) {
    let cell = Arc::new(Mutex::new(PortCell::default()));
    (
        OutputPort { cell: cell.clone() },
        InputPort { cell },
    )
}

/// The consumer side of a port.
pub struct InputPort {
    cell: Arc<Mutex<PortCell>>,
}

impl InputPort {
    /// Whether the upstream finished and no chunk is left to pull.
    pub fn is_finished(&self) -> bool {
        let cell = self.cell.lock();
        cell.finished && cell.chunk.is_none()
    }

    pub fn has_data(&self) -> bool {
        self.cell.lock().chunk.is_some()
    }

    pub fn set_needed(&self) {
        self.cell.lock().needed = true;
    }

    pub fn set_not_needed(&self) {
        self.cell.lock().needed = false;
    }

    /// Takes the buffered chunk, transferring its ownership to the caller.
    pub fn pull(&self) -> Option<DataChunk> {
        self.cell.lock().chunk.take()
    }

    /// Cancels the upstream: the producer stops, any buffered chunk is
    /// dropped.
    pub fn close(&self) {
        let mut cell = self.cell.lock();
        cell.closed = true;
        cell.needed = false;
        cell.chunk = None;
    }
}

/// The producer side of a port.
pub struct OutputPort {
    cell: Arc<Mutex<PortCell>>,
}

impl OutputPort {
    /// Whether no more chunks can ever flow: the consumer closed the port or
    /// the producer already finished it.
    pub fn is_finished(&self) -> bool {
        let cell = self.cell.lock();
        cell.closed || cell.finished
    }

    pub fn can_push(&self) -> bool {
        let cell = self.cell.lock();
        !cell.closed && !cell.finished && cell.chunk.is_none()
    }

    /// Whether the consumer currently wants data.
    pub fn is_needed(&self) -> bool {
        self.cell.lock().needed
    }

    /// # Panics
    ///
    /// Panics if the port cannot accept a chunk; callers must check
    /// [`OutputPort::can_push`] first.
    pub fn push(&self, chunk: DataChunk) {
        let mut cell = self.cell.lock();
        assert!(!cell.finished, "pushing to a finished port");
        if cell.closed {
            // the consumer is gone; drop the chunk on the floor
            return;
        }
        assert!(cell.chunk.is_none(), "pushing to a full port");
        cell.chunk = Some(chunk);
    }

    /// Declares that no more chunks will be pushed.
    pub fn finish(&self) {
        self.cell.lock().finished = true;
    }
}
