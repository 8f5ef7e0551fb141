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

use std::hash::{Hash, Hasher};

use super::{Array, ArrayBuilder, NULL_VAL_FOR_HASH};
use crate::buffer::{Bitmap, BitmapBuilder};
use crate::types::{DataType, Scalar, ScalarRef};

/// A native value type that can be stored in a [`PrimitiveArray`].
pub trait PrimitiveArrayItemType:
    Scalar + for<'a> ScalarRef<'a> + Copy + Default + PartialEq
{
    fn data_type() -> DataType;

    /// Hashes the value itself; floats hash their bit pattern so that the
    /// hash agrees with bitwise equality.
    fn hash_scalar<H: Hasher>(self, state: &mut H);
}

macro_rules! impl_int_item_type {
    ($({ $native:ty, $data_type:ident }),*) => {
        $(
            impl PrimitiveArrayItemType for $native {
                fn data_type() -> DataType {
                    DataType::$data_type
                }

                fn hash_scalar<H: Hasher>(self, state: &mut H) {
                    self.hash(state)
                }
            }
        )*
    };
}

impl_int_item_type! { { i16, Int16 }, { i32, Int32 }, { i64, Int64 } }

impl PrimitiveArrayItemType for f32 {
    fn data_type() -> DataType {
        DataType::Float32
    }

    fn hash_scalar<H: Hasher>(self, state: &mut H) {
        state.write_u32(self.to_bits())
    }
}

impl PrimitiveArrayItemType for f64 {
    fn data_type() -> DataType {
        DataType::Float64
    }

    fn hash_scalar<H: Hasher>(self, state: &mut H) {
        state.write_u64(self.to_bits())
    }
}

/// An array of fixed-width native values.
#[derive(Debug, Clone)]
pub struct PrimitiveArray<T: PrimitiveArrayItemType> {
    bitmap: Bitmap,
    data: Vec<T>,
}

pub type I16Array = PrimitiveArray<i16>;
pub type I32Array = PrimitiveArray<i32>;
pub type I64Array = PrimitiveArray<i64>;
pub type F32Array = PrimitiveArray<f32>;
pub type F64Array = PrimitiveArray<f64>;

pub type I16ArrayBuilder = PrimitiveArrayBuilder<i16>;
pub type I32ArrayBuilder = PrimitiveArrayBuilder<i32>;
pub type I64ArrayBuilder = PrimitiveArrayBuilder<i64>;
pub type F32ArrayBuilder = PrimitiveArrayBuilder<f32>;
pub type F64ArrayBuilder = PrimitiveArrayBuilder<f64>;

impl<T: PrimitiveArrayItemType> FromIterator<Option<T>> for PrimitiveArray<T> {
    fn from_iter<I: IntoIterator<Item = Option<T>>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut builder = PrimitiveArrayBuilder::with_capacity(iter.size_hint().0);
        for value in iter {
            builder.append(value);
        }
        builder.finish()
    }
}

impl<T: PrimitiveArrayItemType> Array for PrimitiveArray<T> {
    type Builder = PrimitiveArrayBuilder<T>;
    type OwnedItem = T;
    type RefItem<'a> = T;

    fn value_at(&self, idx: usize) -> Option<T> {
        self.bitmap.is_set(idx).then(|| self.data[idx])
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn null_bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    fn hash_at<H: Hasher>(&self, idx: usize, state: &mut H) {
        if self.bitmap.is_set(idx) {
            self.data[idx].hash_scalar(state)
        } else {
            NULL_VAL_FOR_HASH.hash(state)
        }
    }
}

/// Builder for [`PrimitiveArray`].
#[derive(Debug)]
pub struct PrimitiveArrayBuilder<T: PrimitiveArrayItemType> {
    bitmap: BitmapBuilder,
    data: Vec<T>,
}

impl<T: PrimitiveArrayItemType> ArrayBuilder for PrimitiveArrayBuilder<T> {
    type ArrayType = PrimitiveArray<T>;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            bitmap: BitmapBuilder::with_capacity(capacity),
            data: Vec::with_capacity(capacity),
        }
    }

    fn append(&mut self, value: Option<T>) {
        match value {
            Some(value) => {
                self.bitmap.append(true);
                self.data.push(value);
            }
            None => {
                self.bitmap.append(false);
                self.data.push(T::default());
            }
        }
    }

    fn append_array(&mut self, other: &PrimitiveArray<T>) {
        for idx in 0..other.len() {
            self.append(other.value_at(idx));
        }
    }

    fn finish(self) -> PrimitiveArray<T> {
        PrimitiveArray {
            bitmap: self.bitmap.finish(),
            data: self.data,
        }
    }
}
