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

use chunkflow_common::hash::HashKeyKind;
use thiserror::Error;

/// Errors of the processor layer.
///
/// Structural errors are reported at construction and prevent the processor
/// from running; the rest surface through `prepare`/`work` and abort the
/// pipeline — there is no local recovery.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("set operation requires at least one operator")]
    NoOperators,

    #[error("expected {expected} input ports, got {actual}")]
    InputPortMismatch { expected: usize, actual: usize },

    #[error("key column {0:?} not found in schema")]
    UnknownKeyColumn(String),

    #[error("operator position {pos} out of range ({len} operators)")]
    OperatorPosOutOfRange { pos: usize, len: usize },

    #[error("hash set variant changed within a pair: built {built:?}, probed {probed:?}")]
    SetKindMismatch {
        built: HashKeyKind,
        probed: HashKeyKind,
    },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
