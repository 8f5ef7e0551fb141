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

//! Logical column types and the scalar value model.

use crate::array::{
    ArrayBuilder, ArrayBuilderImpl, BoolArrayBuilder, PrimitiveArrayBuilder, Utf8ArrayBuilder,
};

/// The set of column types a chunk schema may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Boolean,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Varchar,
}

impl DataType {
    pub fn create_array_builder(&self, capacity: usize) -> ArrayBuilderImpl {
        match self {
            DataType::Boolean => ArrayBuilderImpl::Bool(BoolArrayBuilder::with_capacity(capacity)),
            DataType::Int16 => {
                ArrayBuilderImpl::Int16(PrimitiveArrayBuilder::with_capacity(capacity))
            }
            DataType::Int32 => {
                ArrayBuilderImpl::Int32(PrimitiveArrayBuilder::with_capacity(capacity))
            }
            DataType::Int64 => {
                ArrayBuilderImpl::Int64(PrimitiveArrayBuilder::with_capacity(capacity))
            }
            DataType::Float32 => {
                ArrayBuilderImpl::Float32(PrimitiveArrayBuilder::with_capacity(capacity))
            }
            DataType::Float64 => {
                ArrayBuilderImpl::Float64(PrimitiveArrayBuilder::with_capacity(capacity))
            }
            DataType::Varchar => ArrayBuilderImpl::Utf8(Utf8ArrayBuilder::with_capacity(capacity)),
        }
    }
}

/// An owned scalar value.
pub trait Scalar: std::fmt::Debug + Clone + Send + Sync + 'static {
    type ScalarRefType<'a>: ScalarRef<'a>;

    fn as_scalar_ref(&self) -> Self::ScalarRefType<'_>;
}

/// A borrowed scalar value.
pub trait ScalarRef<'a>: std::fmt::Debug + Copy + Send + Sync + 'a {
    type ScalarType: Scalar;

    fn to_owned_scalar(&self) -> Self::ScalarType;
}

macro_rules! impl_scalar_for_copy_type {
    ($({ $native:ty }),*) => {
        $(
            impl Scalar for $native {
                type ScalarRefType<'a> = $native;

                fn as_scalar_ref(&self) -> $native {
                    *self
                }
            }

            impl<'a> ScalarRef<'a> for $native {
                type ScalarType = $native;

                fn to_owned_scalar(&self) -> $native {
                    *self
                }
            }
        )*
    };
}

impl_scalar_for_copy_type! { { bool }, { i16 }, { i32 }, { i64 }, { f32 }, { f64 } }

impl Scalar for String {
    type ScalarRefType<'a> = &'a str;

    fn as_scalar_ref(&self) -> &str {
        self.as_str()
    }
}

impl<'a> ScalarRef<'a> for &'a str {
    type ScalarType = String;

    fn to_owned_scalar(&self) -> String {
        (*self).to_owned()
    }
}

/// A dynamically typed owned scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarImpl {
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(String),
}

/// A dynamically typed borrowed scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScalarRefImpl<'a> {
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Utf8(&'a str),
}

/// A nullable owned scalar.
pub type Datum = Option<ScalarImpl>;
/// A nullable borrowed scalar.
pub type DatumRef<'a> = Option<ScalarRefImpl<'a>>;

impl ScalarImpl {
    pub fn as_scalar_ref_impl(&self) -> ScalarRefImpl<'_> {
        match self {
            ScalarImpl::Bool(v) => ScalarRefImpl::Bool(*v),
            ScalarImpl::Int16(v) => ScalarRefImpl::Int16(*v),
            ScalarImpl::Int32(v) => ScalarRefImpl::Int32(*v),
            ScalarImpl::Int64(v) => ScalarRefImpl::Int64(*v),
            ScalarImpl::Float32(v) => ScalarRefImpl::Float32(*v),
            ScalarImpl::Float64(v) => ScalarRefImpl::Float64(*v),
            ScalarImpl::Utf8(v) => ScalarRefImpl::Utf8(v.as_str()),
        }
    }
}

impl ScalarRefImpl<'_> {
    pub fn into_scalar_impl(self) -> ScalarImpl {
        match self {
            ScalarRefImpl::Bool(v) => ScalarImpl::Bool(v),
            ScalarRefImpl::Int16(v) => ScalarImpl::Int16(v),
            ScalarRefImpl::Int32(v) => ScalarImpl::Int32(v),
            ScalarRefImpl::Int64(v) => ScalarImpl::Int64(v),
            ScalarRefImpl::Float32(v) => ScalarImpl::Float32(v),
            ScalarRefImpl::Float64(v) => ScalarImpl::Float64(v),
            ScalarRefImpl::Utf8(v) => ScalarImpl::Utf8(v.to_owned()),
        }
    }
}
