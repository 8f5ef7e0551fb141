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

/// An array of booleans, stored as two bitmaps.
#[derive(Debug, Clone)]
pub struct BoolArray {
    bitmap: Bitmap,
    data: Bitmap,
}

impl FromIterator<Option<bool>> for BoolArray {
    fn from_iter<I: IntoIterator<Item = Option<bool>>>(iter: I) -> Self {
        let mut builder = BoolArrayBuilder::with_capacity(0);
        for value in iter {
            builder.append(value);
        }
        builder.finish()
    }
}

impl Array for BoolArray {
    type Builder = BoolArrayBuilder;
    type OwnedItem = bool;
    type RefItem<'a> = bool;

    fn value_at(&self, idx: usize) -> Option<bool> {
        self.bitmap.is_set(idx).then(|| self.data.is_set(idx))
    }

    fn len(&self) -> usize {
        self.data.len()
    }

    fn null_bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    fn hash_at<H: Hasher>(&self, idx: usize, state: &mut H) {
        if self.bitmap.is_set(idx) {
            self.data.is_set(idx).hash(state)
        } else {
            NULL_VAL_FOR_HASH.hash(state)
        }
    }
}

/// Builder for [`BoolArray`].
#[derive(Debug)]
pub struct BoolArrayBuilder {
    bitmap: BitmapBuilder,
    data: BitmapBuilder,
}

impl ArrayBuilder for BoolArrayBuilder {
    type ArrayType = BoolArray;

    fn with_capacity(capacity: usize) -> Self {
        Self {
            bitmap: BitmapBuilder::with_capacity(capacity),
            data: BitmapBuilder::with_capacity(capacity),
        }
    }

    fn append(&mut self, value: Option<bool>) {
        match value {
            Some(value) => {
                self.bitmap.append(true);
                self.data.append(value);
            }
            None => {
                self.bitmap.append(false);
                self.data.append(false);
            }
        }
    }

    fn append_array(&mut self, other: &BoolArray) {
        for idx in 0..other.len() {
            self.append(other.value_at(idx));
        }
    }

    fn finish(self) -> BoolArray {
        BoolArray {
            bitmap: self.bitmap.finish(),
            data: self.data.finish(),
        }
    }
}
