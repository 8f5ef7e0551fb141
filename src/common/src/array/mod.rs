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

//! Columnar arrays: one immutable, reference-shared sequence of typed
//! nullable values per column.

mod bool_array;
mod data_chunk;
mod primitive_array;
mod utf8_array;

use std::hash::Hasher;
use std::sync::Arc;

pub use bool_array::{BoolArray, BoolArrayBuilder};
pub use data_chunk::DataChunk;
pub use primitive_array::{
    F32Array, F32ArrayBuilder, F64Array, F64ArrayBuilder, I16Array, I16ArrayBuilder, I32Array,
    I32ArrayBuilder, I64Array, I64ArrayBuilder, PrimitiveArray, PrimitiveArrayBuilder,
    PrimitiveArrayItemType,
};
pub use utf8_array::{Utf8Array, Utf8ArrayBuilder};

use crate::buffer::Bitmap;
use crate::types::{DataType, DatumRef, Scalar, ScalarRef, ScalarRefImpl};

/// Hashed in place of a value for null rows, so that nulls group together.
pub(crate) const NULL_VAL_FOR_HASH: u64 = u64::MAX;

/// A typed immutable array of nullable values.
pub trait Array: std::fmt::Debug + Send + Sync + Sized + 'static {
    type OwnedItem: Scalar;
    type RefItem<'a>: ScalarRef<'a>;
    type Builder: ArrayBuilder<ArrayType = Self>;

    /// The value at `idx`, or `None` if the row is null.
    fn value_at(&self, idx: usize) -> Option<Self::RefItem<'_>>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bitmap with one set bit per non-null row.
    fn null_bitmap(&self) -> &Bitmap;

    fn is_null(&self, idx: usize) -> bool {
        !self.null_bitmap().is_set(idx)
    }

    /// Feeds the value at `idx` into the hasher, substituting a fixed
    /// sentinel for nulls.
    fn hash_at<H: Hasher>(&self, idx: usize, state: &mut H);

    fn iter(&self) -> ArrayIterator<'_, Self> {
        ArrayIterator::new(self)
    }

    /// Returns a new array keeping only the rows whose mask bit is set.
    /// `size_hint` is the expected number of surviving rows, if known.
    fn filter(&self, visibility: &Bitmap, size_hint: Option<usize>) -> Self {
        debug_assert_eq!(visibility.len(), self.len());
        let capacity = size_hint.unwrap_or_else(|| visibility.count_ones());
        let mut builder = Self::Builder::with_capacity(capacity);
        for (idx, visible) in visibility.iter().enumerate() {
            if visible {
                builder.append(self.value_at(idx));
            }
        }
        builder.finish()
    }
}

/// Constructs a typed array from values appended one by one.
pub trait ArrayBuilder: Send + Sync + 'static {
    type ArrayType: Array<Builder = Self>;

    fn with_capacity(capacity: usize) -> Self;

    fn append(&mut self, value: Option<<Self::ArrayType as Array>::RefItem<'_>>);

    fn append_array(&mut self, other: &Self::ArrayType);

    fn finish(self) -> Self::ArrayType;
}

/// Iterator over the nullable values of an array.
pub struct ArrayIterator<'a, A: Array> {
    array: &'a A,
    idx: usize,
}

impl<'a, A: Array> ArrayIterator<'a, A> {
    pub fn new(array: &'a A) -> Self {
        Self { array, idx: 0 }
    }
}

impl<'a, A: Array> Iterator for ArrayIterator<'a, A> {
    type Item = Option<A::RefItem<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.idx >= self.array.len() {
            return None;
        }
        let item = self.array.value_at(self.idx);
        self.idx += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.array.len() - self.idx;
        (remaining, Some(remaining))
    }
}

impl<A: Array> ExactSizeIterator for ArrayIterator<'_, A> {}

/// `for_all_variants!` is the single source of truth for the closed set of
/// array variants: `{ enum variant, data type, array, builder }`.
#[macro_export]
macro_rules! for_all_variants {
    ($macro:ident) => {
        $macro! {
            { Bool, Boolean, BoolArray, BoolArrayBuilder },
            { Int16, Int16, I16Array, I16ArrayBuilder },
            { Int32, Int32, I32Array, I32ArrayBuilder },
            { Int64, Int64, I64Array, I64ArrayBuilder },
            { Float32, Float32, F32Array, F32ArrayBuilder },
            { Float64, Float64, F64Array, F64ArrayBuilder },
            { Utf8, Varchar, Utf8Array, Utf8ArrayBuilder }
        }
    };
}

macro_rules! array_impl_enum {
    ($( { $variant:ident, $data_type:ident, $array:ty, $builder:ty } ),*) => {
        /// A dynamically typed array.
        #[derive(Debug, Clone)]
        pub enum ArrayImpl {
            $( $variant($array), )*
        }

        /// A dynamically typed array builder.
        #[derive(Debug)]
        pub enum ArrayBuilderImpl {
            $( $variant($builder), )*
        }
    };
}

for_all_variants! { array_impl_enum }

/// An array shared by reference.
pub type ArrayRef = Arc<ArrayImpl>;

macro_rules! impl_array_dispatch {
    ($( { $variant:ident, $data_type:ident, $array:ty, $builder:ty } ),*) => {
        $(
            impl From<$array> for ArrayImpl {
                fn from(array: $array) -> Self {
                    Self::$variant(array)
                }
            }
        )*

        impl ArrayImpl {
            pub fn len(&self) -> usize {
                match self {
                    $( Self::$variant(array) => array.len(), )*
                }
            }

            pub fn is_empty(&self) -> bool {
                self.len() == 0
            }

            pub fn data_type(&self) -> DataType {
                match self {
                    $( Self::$variant(_) => DataType::$data_type, )*
                }
            }

            pub fn datum_at(&self, idx: usize) -> DatumRef<'_> {
                match self {
                    $( Self::$variant(array) => {
                        array.value_at(idx).map(ScalarRefImpl::$variant)
                    } )*
                }
            }

            pub fn hash_at<H: Hasher>(&self, idx: usize, state: &mut H) {
                match self {
                    $( Self::$variant(array) => array.hash_at(idx, state), )*
                }
            }

            /// See [`Array::filter`].
            pub fn filter(&self, visibility: &Bitmap, size_hint: Option<usize>) -> ArrayImpl {
                match self {
                    $( Self::$variant(array) => {
                        Self::$variant(array.filter(visibility, size_hint))
                    } )*
                }
            }

            /// Creates an empty builder of the same variant.
            pub fn create_builder(&self, capacity: usize) -> ArrayBuilderImpl {
                self.data_type().create_array_builder(capacity)
            }
        }

        impl ArrayBuilderImpl {
            /// Appends a nullable scalar of the matching type.
            ///
            /// # Panics
            ///
            /// Panics if the scalar variant does not match the builder, which
            /// means the caller mixed up columns of different schemas.
            pub fn append_datum(&mut self, datum: DatumRef<'_>) {
                match (self, datum) {
                    $(
                        (Self::$variant(builder), Some(ScalarRefImpl::$variant(value))) => {
                            builder.append(Some(value))
                        }
                        (Self::$variant(builder), None) => builder.append(None),
                    )*
                    (builder, datum) => {
                        panic!("datum {datum:?} does not match array builder {builder:?}")
                    }
                }
            }

            /// Appends all rows of an array of the matching type.
            pub fn append_array(&mut self, other: &ArrayImpl) {
                match (self, other) {
                    $(
                        (Self::$variant(builder), ArrayImpl::$variant(array)) => {
                            builder.append_array(array)
                        }
                    )*
                    (builder, array) => panic!(
                        "array {:?} does not match array builder {builder:?}",
                        array.data_type()
                    ),
                }
            }

            pub fn finish(self) -> ArrayImpl {
                match self {
                    $( Self::$variant(builder) => ArrayImpl::$variant(builder.finish()), )*
                }
            }
        }
    };
}

for_all_variants! { impl_array_dispatch }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_keeps_masked_rows() {
        let array: I32Array = [Some(1), None, Some(3), Some(4)].into_iter().collect();
        let mask: Bitmap = [true, true, false, true].into_iter().collect();
        let filtered = array.filter(&mask, Some(3));
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered.value_at(0), Some(1));
        assert_eq!(filtered.value_at(1), None);
        assert_eq!(filtered.value_at(2), Some(4));
    }

    #[test]
    fn test_filter_unknown_hint() {
        let array: Utf8Array = [Some("a"), Some("bc"), None].into_iter().collect();
        let mask: Bitmap = [false, true, true].into_iter().collect();
        let filtered = array.filter(&mask, None);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered.value_at(0), Some("bc"));
        assert_eq!(filtered.value_at(1), None);
    }

    #[test]
    fn test_append_datum_dispatch() {
        let mut builder = DataType::Int64.create_array_builder(2);
        builder.append_datum(Some(ScalarRefImpl::Int64(42)));
        builder.append_datum(None);
        let array = builder.finish();
        assert_eq!(array.datum_at(0), Some(ScalarRefImpl::Int64(42)));
        assert_eq!(array.datum_at(1), None);
    }
}
