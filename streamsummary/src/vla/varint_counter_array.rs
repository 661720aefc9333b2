// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Counters whose storage width grows with their value.

use crate::vla::SparseArray;
use crate::vla::SparseValue;
use crate::vla::Width;
use crate::vla::width::WidthTags;

/// Each width store addresses the index space in blocks of this many bytes.
const BLOCK_SIZE_BYTES: usize = 1024;

/// Per-index `u64` counters stored at the narrowest width that holds them.
///
/// Values live in one of four [`SparseArray`]s (8, 16, 32 and 64 bits wide), chosen by a 2-bit
/// [`Width`] tag per index. A counter that outgrows its width moves to the smallest width that
/// fits the new value; zero counters take no value storage at all.
///
/// # Examples
///
/// ```
/// # use streamsummary::vla::VarintCounterArray;
/// # use streamsummary::vla::Width;
/// let mut counters = VarintCounterArray::new(1000);
/// counters.add_to(7, 200);
/// assert_eq!(counters.width(7), Width::W8);
/// counters.add_to(7, 100);
/// assert_eq!(counters.get(7), 300);
/// assert_eq!(counters.width(7), Width::W16);
/// ```
#[derive(Debug, Clone)]
pub struct VarintCounterArray {
    bytes: SparseArray<u8>,
    shorts: SparseArray<u16>,
    ints: SparseArray<u32>,
    longs: SparseArray<u64>,
    widths: WidthTags,
}

impl VarintCounterArray {
    /// Creates counters for indices `0..capacity`, all zero.
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: SparseArray::new(capacity, BLOCK_SIZE_BYTES, 4),
            shorts: SparseArray::new(capacity, BLOCK_SIZE_BYTES / 2, 2),
            ints: SparseArray::new(capacity, BLOCK_SIZE_BYTES / 4, 1),
            longs: SparseArray::new(capacity, BLOCK_SIZE_BYTES / 8, 1),
            widths: WidthTags::new(),
        }
    }

    /// Returns the number of addressable counters.
    pub fn capacity(&self) -> usize {
        self.bytes.capacity()
    }

    /// Returns the current storage width of the counter at `index`.
    pub fn width(&self, index: usize) -> Width {
        self.widths.get(index)
    }

    /// Returns the counter at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`VarintCounterArray::capacity`].
    pub fn get(&self, index: usize) -> u64 {
        match self.widths.get(index) {
            Width::W8 => self.bytes.get(index).to_u64(),
            Width::W16 => self.shorts.get(index).to_u64(),
            Width::W32 => self.ints.get(index).to_u64(),
            Width::W64 => self.longs.get(index),
        }
    }

    /// Overwrites the counter at `index`, storing it at the smallest width that fits.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`VarintCounterArray::capacity`].
    pub fn set(&mut self, index: usize, value: u64) {
        let current = self.widths.get(index);
        if Width::fitting(value) == current {
            self.write(current, index, value);
        } else {
            self.write(current, index, 0);
            self.set_internal(index, value);
        }
    }

    /// Adds `increment` to the counter at `index`, widening its storage if needed.
    ///
    /// # Panics
    ///
    /// Panics if `increment` is zero, if the counter overflows `u64`, or if `index` is not below
    /// [`VarintCounterArray::capacity`].
    pub fn add_to(&mut self, index: usize, increment: u64) {
        assert!(increment > 0, "increment must be positive");
        let overflowed = match self.widths.get(index) {
            Width::W8 => add_within(&mut self.bytes, index, increment, Width::W8),
            Width::W16 => add_within(&mut self.shorts, index, increment, Width::W16),
            Width::W32 => add_within(&mut self.ints, index, increment, Width::W32),
            Width::W64 => add_within(&mut self.longs, index, increment, Width::W64),
        };
        if let Some(total) = overflowed {
            self.set_internal(index, total);
        }
    }

    /// Returns an estimate of the heap bytes held by all width stores and tags.
    pub fn bytes_used(&self) -> usize {
        self.bytes.bytes_used()
            + self.shorts.bytes_used()
            + self.ints.bytes_used()
            + self.longs.bytes_used()
            + self.widths.bytes_used()
    }

    fn set_internal(&mut self, index: usize, value: u64) {
        let width = Width::fitting(value);
        self.write(width, index, value);
        self.widths.set(index, width);
    }

    fn write(&mut self, width: Width, index: usize, value: u64) {
        match width {
            Width::W8 => self.bytes.set(index, u8::from_u64(value)),
            Width::W16 => self.shorts.set(index, u16::from_u64(value)),
            Width::W32 => self.ints.set(index, u32::from_u64(value)),
            Width::W64 => self.longs.set(index, value),
        }
    }
}

/// Adds `increment` in place when the total stays within `width`.
///
/// Otherwise the entry is cleared and the total is returned for re-insertion at a wider width.
fn add_within<V: SparseValue>(
    store: &mut SparseArray<V>,
    index: usize,
    increment: u64,
    width: Width,
) -> Option<u64> {
    let pointer = store.locate(index);
    let current = store.value_at(&pointer).to_u64();
    let total = current
        .checked_add(increment)
        .unwrap_or_else(|| panic!("counter at index {index} overflows u64"));
    if total <= width.limit() {
        store.set_at(&pointer, V::from_u64(total));
        None
    } else {
        store.set_at(&pointer, V::ZERO);
        Some(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_promotion_skips_widths() {
        let mut counters = VarintCounterArray::new(64);
        counters.add_to(1, 1);
        counters.add_to(1, 1 << 40);
        assert_eq!(counters.width(1), Width::W64);
        assert_eq!(counters.get(1), (1 << 40) + 1);
        assert!(counters.bytes.is_empty());
        assert_eq!(counters.longs.len(), 1);
    }

    #[test]
    fn test_u32_boundary_promotes() {
        let mut counters = VarintCounterArray::new(8);
        counters.add_to(0, 0xFFFF_FFFE);
        assert_eq!(counters.width(0), Width::W32);
        counters.add_to(0, 1);
        assert_eq!(counters.width(0), Width::W64);
        assert_eq!(counters.get(0), 0xFFFF_FFFF);
        assert!(counters.ints.is_empty());
    }

    #[test]
    fn test_set_narrows() {
        let mut counters = VarintCounterArray::new(8);
        counters.set(3, 70_000);
        assert_eq!(counters.width(3), Width::W32);
        counters.set(3, 5);
        assert_eq!(counters.width(3), Width::W8);
        assert_eq!(counters.get(3), 5);
        assert!(counters.ints.is_empty());
        counters.set(3, 0);
        assert_eq!(counters.get(3), 0);
        assert!(counters.bytes.is_empty());
    }
}
