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

//! Shared data model of the chunkflow pipeline: scalar types, columnar
//! arrays, data chunks, schemas, and the typed hash-key layer used by
//! set-building processors.

pub mod array;
pub mod buffer;
pub mod catalog;
pub mod hash;
pub mod test_prelude;
pub mod types;
pub mod util;
