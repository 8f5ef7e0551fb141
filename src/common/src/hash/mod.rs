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

//! Typed composite hash keys over chunk columns.
//!
//! A hash key packs the key columns of one row into a compact, hashable,
//! comparable value. The physical representation is chosen once per key
//! schema from a closed set of variants (see [`HashKeyKind`]), so the inner
//! build/probe loops of set-building operators stay monomorphic.

mod dispatcher;
mod key;

use std::hash::{BuildHasher, Hasher};

pub use dispatcher::{calc_hash_key_kind, hash_key_size, HashKeyKind, HashKeySize};
pub use key::{
    FixedSizeKey, HashKey, HashKeySer, HeapNullBitmap, Key128, Key16, Key256, Key32, Key64, Key8,
    KeySerialized, NullBitmap, SerializedKey, StackNullBitmap,
};

/// A precomputed per-row hash code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCode(pub u64);

impl HashCode {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// A hasher that simply returns the hash code it was fed.
///
/// Hash keys carry their hash code precomputed from the chunk, so hash
/// tables over them must not hash the key bytes again.
#[derive(Default)]
pub struct PrecomputedHasher {
    hash_code: u64,
}

impl Hasher for PrecomputedHasher {
    fn finish(&self) -> u64 {
        self.hash_code
    }

    fn write_u64(&mut self, value: u64) {
        debug_assert_eq!(self.hash_code, 0);
        self.hash_code = value;
    }

    fn write(&mut self, _bytes: &[u8]) {
        unreachable!("hash keys must feed their precomputed code as a single u64")
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PrecomputedBuildHasher;

impl BuildHasher for PrecomputedBuildHasher {
    type Hasher = PrecomputedHasher;

    fn build_hasher(&self) -> Self::Hasher {
        PrecomputedHasher::default()
    }
}
