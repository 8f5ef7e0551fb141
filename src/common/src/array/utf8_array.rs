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

/// An array of variable-length strings, stored as a shared byte buffer plus
/// per-row offsets.
#[derive(Debug, Clone)]
pub struct Utf8Array {
    offset: Vec<usize>,
    bitmap: Bitmap,
    data: Vec<u8>,
}

impl<'a> FromIterator<Option<&'a str>> for Utf8Array {
    fn from_iter<I: IntoIterator<Item = Option<&'a str>>>(iter: I) -> Self {
        let mut builder = Utf8ArrayBuilder::with_capacity(0);
        for value in iter {
            builder.append(value);
        }
        builder.finish()
    }
}

impl Array for Utf8Array {
    type Builder = Utf8ArrayBuilder;
    type OwnedItem = String;
    type RefItem<'a> = &'a str;

    fn value_at(&self, idx: usize) -> Option<&str> {
        self.bitmap.is_set(idx).then(|| {
            let bytes = &self.data[self.offset[idx]..self.offset[idx + 1]];
            // invariant: `data` is only ever appended to from `&str`
            unsafe { std::str::from_utf8_unchecked(bytes) }
        })
    }

    fn len(&self) -> usize {
        self.offset.len() - 1
    }

    fn null_bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    fn hash_at<H: Hasher>(&self, idx: usize, state: &mut H) {
        match self.value_at(idx) {
            Some(value) => value.hash(state),
            None => NULL_VAL_FOR_HASH.hash(state),
        }
    }
}

/// Builder for [`Utf8Array`].
#[derive(Debug)]
pub struct Utf8ArrayBuilder {
    offset: Vec<usize>,
    bitmap: BitmapBuilder,
    data: Vec<u8>,
}

impl ArrayBuilder for Utf8ArrayBuilder {
    type ArrayType = Utf8Array;

    fn with_capacity(capacity: usize) -> Self {
        let mut offset = Vec::with_capacity(capacity + 1);
        offset.push(0);
        Self {
            offset,
            bitmap: BitmapBuilder::with_capacity(capacity),
            data: Vec::new(),
        }
    }

    fn append(&mut self, value: Option<&str>) {
        match value {
            Some(value) => {
                self.bitmap.append(true);
                self.data.extend_from_slice(value.as_bytes());
            }
            None => self.bitmap.append(false),
        }
        self.offset.push(self.data.len());
    }

    fn append_array(&mut self, other: &Utf8Array) {
        for idx in 0..other.len() {
            self.append(other.value_at(idx));
        }
    }

    fn finish(self) -> Utf8Array {
        Utf8Array {
            offset: self.offset,
            bitmap: self.bitmap.finish(),
            data: self.data,
        }
    }
}
