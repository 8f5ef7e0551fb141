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

use std::hash::{BuildHasher, Hasher};

use twox_hash::XxHash64;

/// Seed for row hash codes. Fixed so that hash codes computed from different
/// chunks of one stream agree.
const XXHASH64_SEED: u64 = 0x2345_1234_90ab_cdef;

pub fn finalize_hashers<H: Hasher>(hashers: &[H]) -> Vec<u64> {
    hashers.iter().map(|hasher| hasher.finish()).collect()
}

/// Builds [`XxHash64`] hashers with the fixed seed.
pub struct XxHash64Builder;

impl BuildHasher for XxHash64Builder {
    type Hasher = XxHash64;

    fn build_hasher(&self) -> Self::Hasher {
        XxHash64::with_seed(XXHASH64_SEED)
    }
}
