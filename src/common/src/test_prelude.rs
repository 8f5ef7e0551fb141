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

//! Test helpers for constructing chunks from text tables.

use std::sync::Arc;

use crate::array::DataChunk;
use crate::types::{DataType, Datum, ScalarImpl};
use crate::util::iter_util::ZipEqFast;

pub trait DataChunkTestExt {
    /// Parses a chunk from a whitespace-separated text table.
    ///
    /// The first line names the column types:
    /// - `B`: boolean
    /// - `s`: int16
    /// - `i`: int32
    /// - `I`: int64
    /// - `f`: float32
    /// - `F`: float64
    /// - `T`: varchar
    ///
    /// Each following non-empty line is one row; `.` means null. A header
    /// with no rows yields a zero-row chunk.
    ///
    /// # Example
    ///
    /// ```
    /// use chunkflow_common::array::DataChunk;
    /// use chunkflow_common::test_prelude::DataChunkTestExt;
    ///
    /// let chunk = DataChunk::from_pretty(
    ///     "i I T
    ///      1 10 a
    ///      2 .  .",
    /// );
    /// assert_eq!(chunk.cardinality(), 2);
    /// ```
    fn from_pretty(text: &str) -> DataChunk;
}

impl DataChunkTestExt for DataChunk {
    fn from_pretty(text: &str) -> DataChunk {
        let mut lines = text.lines().filter(|line| !line.trim().is_empty());

        let header = lines.next().expect("missing header line");
        let data_types: Vec<DataType> = header
            .split_whitespace()
            .map(|token| match token {
                "B" => DataType::Boolean,
                "s" => DataType::Int16,
                "i" => DataType::Int32,
                "I" => DataType::Int64,
                "f" => DataType::Float32,
                "F" => DataType::Float64,
                "T" => DataType::Varchar,
                _ => panic!("invalid type token: {token:?}"),
            })
            .collect();

        let mut builders = data_types
            .iter()
            .map(|data_type| data_type.create_array_builder(8))
            .collect::<Vec<_>>();
        let mut cardinality = 0;
        for line in lines {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            for ((token, data_type), builder) in tokens
                .iter()
                .zip_eq_fast(&data_types)
                .zip(builders.iter_mut())
            {
                let datum = parse_datum(token, data_type);
                builder.append_datum(datum.as_ref().map(ScalarImpl::as_scalar_ref_impl));
            }
            cardinality += 1;
        }

        let columns = builders
            .into_iter()
            .map(|builder| Arc::new(builder.finish()))
            .collect();
        DataChunk::new(columns, cardinality)
    }
}

fn parse_datum(token: &str, data_type: &DataType) -> Datum {
    if token == "." {
        return None;
    }
    let scalar = match data_type {
        DataType::Boolean => ScalarImpl::Bool(match token {
            "t" | "true" => true,
            "f" | "false" => false,
            _ => panic!("invalid bool: {token:?}"),
        }),
        DataType::Int16 => ScalarImpl::Int16(token.parse().expect("invalid int16")),
        DataType::Int32 => ScalarImpl::Int32(token.parse().expect("invalid int32")),
        DataType::Int64 => ScalarImpl::Int64(token.parse().expect("invalid int64")),
        DataType::Float32 => ScalarImpl::Float32(token.parse().expect("invalid float32")),
        DataType::Float64 => ScalarImpl::Float64(token.parse().expect("invalid float64")),
        DataType::Varchar => ScalarImpl::Utf8(token.to_owned()),
    };
    Some(scalar)
}
