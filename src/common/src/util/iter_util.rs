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

/// Zips two iterators of known equal length, checking the lengths in debug
/// builds only.
pub fn zip_eq_fast<A, B>(a: A, b: B) -> impl Iterator<Item = (A::Item, B::Item)>
where
    A: IntoIterator,
    B: IntoIterator,
    A::IntoIter: ExactSizeIterator,
    B::IntoIter: ExactSizeIterator,
{
    let (a, b) = (a.into_iter(), b.into_iter());
    debug_assert_eq!(a.len(), b.len());
    a.zip(b)
}

pub trait ZipEqFast<B: IntoIterator>: ExactSizeIterator + Sized
where
    B::IntoIter: ExactSizeIterator,
{
    /// See [`zip_eq_fast`].
    fn zip_eq_fast(self, other: B) -> impl Iterator<Item = (Self::Item, B::Item)> {
        zip_eq_fast(self, other)
    }
}

impl<A: ExactSizeIterator, B: IntoIterator> ZipEqFast<B> for A where B::IntoIter: ExactSizeIterator {}
