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

use std::hash::BuildHasher;
use std::sync::Arc;

use itertools::Itertools;

use super::ArrayRef;
use crate::buffer::Bitmap;
use crate::hash::HashCode;
use crate::types::DatumRef;
use crate::util::hash_util::finalize_hashers;
use crate::util::iter_util::ZipEqFast;

/// A bundle of equal-length columns flowing through the pipeline as one
/// unit. Chunks are immutable; columns are shared by reference.
#[derive(Debug, Clone)]
pub struct DataChunk {
    columns: Vec<ArrayRef>,
    cardinality: usize,
}

impl DataChunk {
    /// Assembles a chunk from columns and a row count.
    ///
    /// # Panics
    ///
    /// Panics if any column's length differs from `cardinality`.
    pub fn new(columns: Vec<ArrayRef>, cardinality: usize) -> Self {
        for column in &columns {
            assert_eq!(column.len(), cardinality);
        }
        Self {
            columns,
            cardinality,
        }
    }

    /// Number of rows.
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    /// Number of columns.
    pub fn dimension(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[ArrayRef] {
        &self.columns
    }

    pub fn column_at(&self, idx: usize) -> &ArrayRef {
        &self.columns[idx]
    }

    /// Detaches the chunk into its columns, transferring ownership out.
    pub fn into_columns(self) -> Vec<ArrayRef> {
        self.columns
    }

    pub fn row_at(&self, idx: usize) -> Vec<DatumRef<'_>> {
        self.columns
            .iter()
            .map(|column| column.datum_at(idx))
            .collect()
    }

    /// Rebuilds the chunk keeping only the rows whose mask bit is set.
    /// `size_hint` is the expected surviving row count, if known.
    pub fn filter(self, visibility: &Bitmap, size_hint: Option<usize>) -> DataChunk {
        debug_assert_eq!(visibility.len(), self.cardinality);
        let cardinality = size_hint.unwrap_or_else(|| visibility.count_ones());
        let columns = self
            .into_columns()
            .into_iter()
            .map(|column| Arc::new(column.filter(visibility, Some(cardinality))))
            .collect();
        DataChunk::new(columns, cardinality)
    }

    /// Returns a new chunk with `other`'s rows appended to this chunk's.
    pub fn concat_rows(&self, other: &DataChunk) -> DataChunk {
        let cardinality = self.cardinality + other.cardinality;
        let columns = self
            .columns
            .iter()
            .zip_eq_fast(other.columns.iter())
            .map(|(lhs, rhs)| {
                let mut builder = lhs.create_builder(cardinality);
                builder.append_array(lhs);
                builder.append_array(rhs);
                Arc::new(builder.finish())
            })
            .collect_vec();
        DataChunk::new(columns, cardinality)
    }

    /// Computes one composite hash code per row over the given columns.
    pub fn get_hash_values<H: BuildHasher>(
        &self,
        column_indices: &[usize],
        hasher_builder: H,
    ) -> Vec<HashCode> {
        let mut states = Vec::with_capacity(self.cardinality);
        states.resize_with(self.cardinality, || hasher_builder.build_hasher());
        for &idx in column_indices {
            let column = &self.columns[idx];
            for (row, state) in states.iter_mut().enumerate() {
                column.hash_at(row, state);
            }
        }
        finalize_hashers(&states)
            .into_iter()
            .map(HashCode)
            .collect()
    }
}

impl std::fmt::Display for DataChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "DataChunk {{ cardinality: {} }}", self.cardinality)?;
        for row in 0..self.cardinality {
            writeln!(f, "{:?}", self.row_at(row))?;
        }
        Ok(())
    }
}
