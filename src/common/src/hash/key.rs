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

use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use educe::Educe;
use fixedbitset::FixedBitSet;
use tinyvec::ArrayVec;

use super::dispatcher::{hash_key_size, HashKeySize};
use super::HashCode;
use crate::array::{Array, ArrayImpl, DataChunk};
use crate::for_all_variants;
use crate::types::ScalarRef;
use crate::util::hash_util::XxHash64Builder;
use crate::util::iter_util::ZipEqFast;

/// Marks which elements of a composite key are null.
///
/// Key equality treats `NULL == NULL`, so the bitmap takes part in both
/// serialization and comparison. This is the set/group-by convention, not
/// the join convention.
pub trait NullBitmap: PartialEq + Eq + Debug + Clone + Send + Sync + 'static {
    fn empty() -> Self;

    fn set_true(&mut self, idx: usize);

    fn contains(&self, idx: usize) -> bool;
}

/// Null bitmap over at most 64 key columns, kept in a single word.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StackNullBitmap {
    inner: u64,
}

impl NullBitmap for StackNullBitmap {
    fn empty() -> Self {
        Self { inner: 0 }
    }

    fn set_true(&mut self, idx: usize) {
        assert!(idx < 64);
        self.inner |= 1 << idx;
    }

    fn contains(&self, idx: usize) -> bool {
        self.inner & (1 << idx) != 0
    }
}

/// Null bitmap over arbitrarily many key columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeapNullBitmap {
    inner: FixedBitSet,
}

impl NullBitmap for HeapNullBitmap {
    fn empty() -> Self {
        Self {
            inner: FixedBitSet::new(),
        }
    }

    fn set_true(&mut self, idx: usize) {
        if idx >= self.inner.len() {
            self.inner.grow(idx + 1);
        }
        self.inner.insert(idx);
    }

    fn contains(&self, idx: usize) -> bool {
        self.inner.contains(idx)
    }
}

/// Where the serialized key bytes of one row live.
pub trait KeyStorage: 'static {
    type Key: AsRef<[u8]> + Clone + Send + Sync + 'static;
    type Buffer: Buffer<Sealed = Self::Key>;
}

/// A write-only byte buffer that seals into a key.
pub trait Buffer: 'static {
    type Sealed;

    /// Whether the buffer allocates, i.e. whether sizing the capacity up
    /// front is worthwhile.
    fn alloc() -> bool;

    fn with_capacity(capacity: usize) -> Self;

    fn put_slice(&mut self, src: &[u8]);

    fn seal(self) -> Self::Sealed;
}

/// Fixed-width storage on the stack. Unwritten trailing bytes stay zero.
pub struct StackStorage<const N: usize>;

impl<const N: usize> KeyStorage for StackStorage<N> {
    type Buffer = StackBuffer<N>;
    type Key = [u8; N];
}

pub struct StackBuffer<const N: usize>(ArrayVec<[u8; N]>);

impl<const N: usize> Buffer for StackBuffer<N> {
    type Sealed = [u8; N];

    fn alloc() -> bool {
        false
    }

    fn with_capacity(_capacity: usize) -> Self {
        Self(ArrayVec::new())
    }

    fn put_slice(&mut self, src: &[u8]) {
        self.0.extend_from_slice(src);
    }

    fn seal(self) -> [u8; N] {
        self.0.into_inner()
    }
}

/// Variable-width storage on the heap. This is the pool that variable-length
/// key bytes live in; it is freed together with the keys when the owning set
/// is dropped at a pair boundary.
pub struct HeapStorage;

impl KeyStorage for HeapStorage {
    type Buffer = Vec<u8>;
    type Key = Box<[u8]>;
}

impl Buffer for Vec<u8> {
    type Sealed = Box<[u8]>;

    fn alloc() -> bool {
        true
    }

    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }

    fn put_slice(&mut self, src: &[u8]) {
        self.extend_from_slice(src);
    }

    fn seal(self) -> Box<[u8]> {
        self.into_boxed_slice()
    }
}

/// Serialization of one scalar into a key buffer.
///
/// The encoding only has to be injective for rows of one key schema:
/// fixed-width values are written little-endian, strings carry a length
/// prefix, nulls write nothing and set their null-bitmap bit instead.
pub trait HashKeySer<'a>: ScalarRef<'a> {
    fn serialize_into(self, buf: &mut impl Buffer);
}

impl HashKeySer<'_> for bool {
    fn serialize_into(self, buf: &mut impl Buffer) {
        buf.put_slice(&[self as u8]);
    }
}

macro_rules! impl_hash_key_ser_int {
    ($($native:ty),*) => {
        $(
            impl HashKeySer<'_> for $native {
                fn serialize_into(self, buf: &mut impl Buffer) {
                    buf.put_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_hash_key_ser_int! { i16, i32, i64 }

impl HashKeySer<'_> for f32 {
    fn serialize_into(self, buf: &mut impl Buffer) {
        // normalize so that `0.0 == -0.0` and all NaNs compare equal
        let normalized = if self == 0.0 {
            0.0
        } else if self.is_nan() {
            f32::NAN
        } else {
            self
        };
        buf.put_slice(&normalized.to_bits().to_le_bytes());
    }
}

impl HashKeySer<'_> for f64 {
    fn serialize_into(self, buf: &mut impl Buffer) {
        let normalized = if self == 0.0 {
            0.0
        } else if self.is_nan() {
            f64::NAN
        } else {
            self
        };
        buf.put_slice(&normalized.to_bits().to_le_bytes());
    }
}

const STR_LEN_PREFIX: usize = std::mem::size_of::<u32>();

impl<'a> HashKeySer<'a> for &'a str {
    fn serialize_into(self, buf: &mut impl Buffer) {
        buf.put_slice(&(self.len() as u32).to_le_bytes());
        buf.put_slice(self.as_bytes());
    }
}

struct Serializer<S: KeyStorage, N: NullBitmap> {
    buffer: S::Buffer,
    null_bitmap: N,
    idx: usize,
    hash_code: HashCode,
}

impl<S: KeyStorage, N: NullBitmap> Serializer<S, N> {
    fn new(buffer: S::Buffer, hash_code: HashCode) -> Self {
        Self {
            buffer,
            null_bitmap: N::empty(),
            idx: 0,
            hash_code,
        }
    }

    fn serialize<'a, D: HashKeySer<'a>>(&mut self, datum: Option<D>) {
        match datum {
            Some(scalar) => scalar.serialize_into(&mut self.buffer),
            None => self.null_bitmap.set_true(self.idx),
        }
        self.idx += 1;
    }

    fn finish(self) -> HashKeyImpl<S, N> {
        HashKeyImpl {
            hash_code: self.hash_code,
            key: self.buffer.seal(),
            null_bitmap: self.null_bitmap,
        }
    }
}

/// A composite key over the key columns of one row.
///
/// Hashing feeds the precomputed hash code through as-is (see
/// [`super::PrecomputedBuildHasher`]); equality compares the serialized
/// bytes and the null bitmap.
pub trait HashKey: Clone + Debug + Hash + Eq + Sized + Send + Sync + 'static {
    type Bitmap: NullBitmap;

    /// Builds one key per row of the chunk from the given key columns.
    fn build_many(column_indices: &[usize], data_chunk: &DataChunk) -> Vec<Self>;

    fn null_bitmap(&self) -> &Self::Bitmap;
}

#[derive(Educe)]
#[educe(Clone)]
pub struct HashKeyImpl<S: KeyStorage, N: NullBitmap> {
    hash_code: HashCode,
    key: S::Key,
    null_bitmap: N,
}

impl<S: KeyStorage, N: NullBitmap> Hash for HashKeyImpl<S, N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // one u64 write, matched by `PrecomputedHasher`
        state.write_u64(self.hash_code.value())
    }
}

impl<S: KeyStorage, N: NullBitmap> PartialEq for HashKeyImpl<S, N> {
    fn eq(&self, other: &Self) -> bool {
        self.hash_code == other.hash_code
            && self.key.as_ref() == other.key.as_ref()
            && self.null_bitmap == other.null_bitmap
    }
}

impl<S: KeyStorage, N: NullBitmap> Eq for HashKeyImpl<S, N> {}

impl<S: KeyStorage, N: NullBitmap> Debug for HashKeyImpl<S, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashKey")
            .field("key", &self.key.as_ref())
            .finish_non_exhaustive()
    }
}

impl<S: KeyStorage, N: NullBitmap> HashKey for HashKeyImpl<S, N> {
    type Bitmap = N;

    fn build_many(column_indices: &[usize], data_chunk: &DataChunk) -> Vec<Self> {
        let hash_codes = data_chunk.get_hash_values(column_indices, XxHash64Builder);

        let mut serializers: Vec<Serializer<S, N>> = if S::Buffer::alloc() {
            let estimated_sizes = estimated_key_sizes(data_chunk, column_indices);
            hash_codes
                .into_iter()
                .zip_eq_fast(estimated_sizes)
                .map(|(hash_code, capacity)| {
                    Serializer::new(S::Buffer::with_capacity(capacity), hash_code)
                })
                .collect()
        } else {
            hash_codes
                .into_iter()
                .map(|hash_code| Serializer::new(S::Buffer::with_capacity(0), hash_code))
                .collect()
        };

        for &idx in column_indices {
            serialize_column_into(data_chunk.column_at(idx), &mut serializers);
        }

        serializers.into_iter().map(Serializer::finish).collect()
    }

    fn null_bitmap(&self) -> &Self::Bitmap {
        &self.null_bitmap
    }
}

macro_rules! impl_serialize_column {
    ($( { $variant:ident, $data_type:ident, $array:ty, $builder:ty } ),*) => {
        fn serialize_column_into<S: KeyStorage, N: NullBitmap>(
            column: &ArrayImpl,
            serializers: &mut [Serializer<S, N>],
        ) {
            match column {
                $(
                    ArrayImpl::$variant(array) => {
                        for (value, serializer) in
                            array.iter().zip_eq_fast(serializers.iter_mut())
                        {
                            serializer.serialize(value);
                        }
                    }
                )*
            }
        }
    };
}

for_all_variants! { impl_serialize_column }

/// Estimated serialized key size per row, for sizing heap key buffers.
fn estimated_key_sizes(data_chunk: &DataChunk, column_indices: &[usize]) -> Vec<usize> {
    let mut sizes = vec![0; data_chunk.cardinality()];
    for &idx in column_indices {
        match &**data_chunk.column_at(idx) {
            ArrayImpl::Utf8(array) => {
                for (size, value) in sizes.iter_mut().zip_eq_fast(array.iter()) {
                    *size += STR_LEN_PREFIX + value.map_or(0, |v| v.len());
                }
            }
            column => match hash_key_size(&column.data_type()) {
                HashKeySize::Fixed(width) => {
                    for size in &mut sizes {
                        *size += width;
                    }
                }
                HashKeySize::Variable => unreachable!("non-utf8 columns have fixed key width"),
            },
        }
    }
    sizes
}

pub type FixedSizeKey<const N: usize, B = StackNullBitmap> = HashKeyImpl<StackStorage<N>, B>;
pub type SerializedKey<B = HeapNullBitmap> = HashKeyImpl<HeapStorage, B>;

pub type Key8<B = StackNullBitmap> = FixedSizeKey<1, B>;
pub type Key16<B = StackNullBitmap> = FixedSizeKey<2, B>;
pub type Key32<B = StackNullBitmap> = FixedSizeKey<4, B>;
pub type Key64<B = StackNullBitmap> = FixedSizeKey<8, B>;
pub type Key128<B = StackNullBitmap> = FixedSizeKey<16, B>;
pub type Key256<B = StackNullBitmap> = FixedSizeKey<32, B>;
pub type KeySerialized<B = HeapNullBitmap> = SerializedKey<B>;
