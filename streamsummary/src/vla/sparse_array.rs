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

//! Rank-indexed sparse array of fixed-width unsigned integers.

const GROWTH_FACTOR: f64 = 1.2;
const BITS_PER_WORD: usize = 64;

mod private {
    // Sealed trait to prevent external implementations of SparseValue.
    pub trait Sealed {}
}

/// Value type that can be stored in a [`SparseArray`].
///
/// Zero is never stored: writing zero removes the entry.
pub trait SparseValue: private::Sealed + Copy + Eq {
    /// Zero value of absent entries.
    const ZERO: Self;

    /// Widens into `u64`.
    fn to_u64(self) -> u64;

    /// Narrows from `u64`, keeping only the low bits.
    fn from_u64(value: u64) -> Self;
}

macro_rules! impl_sparse_value {
    ($name:ty) => {
        impl private::Sealed for $name {}

        impl SparseValue for $name {
            const ZERO: Self = 0;

            #[inline(always)]
            fn to_u64(self) -> u64 {
                self as u64
            }

            #[inline(always)]
            fn from_u64(value: u64) -> Self {
                value as $name
            }
        }
    };
}

impl_sparse_value!(u8);
impl_sparse_value!(u16);
impl_sparse_value!(u32);
impl_sparse_value!(u64);

/// Resolved position of a logical index inside a [`SparseArray`].
///
/// Obtained from [`SparseArray::locate`] and handed back to [`SparseArray::value_at`] or
/// [`SparseArray::set_at`] so that a read-modify-write computes the rank only once. A pointer
/// goes stale as soon as any other index of the same block is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pointer {
    present: bool,
    block: usize,
    entry: usize,
    word: usize,
    bit: u32,
}

impl Pointer {
    /// Returns true if the located index holds a value.
    pub fn is_present(&self) -> bool {
        self.present
    }
}

/// A sparse array that only materializes storage for indices holding a non-zero value.
///
/// The index space is split into blocks of `items_per_block` indices. A presence bitmap marks the
/// set indices, and a per-word popcount cache turns "how many set indices precede `i` in its
/// block" into a short sum. That rank is the offset of `i` inside the block's densely packed,
/// ascending value array.
///
/// Writes cost `O(items_per_block)` because the block array is shifted. Memory is proportional to
/// the number of set entries plus a bitmap that only extends up to the highest index ever set, so
/// an empty array of any capacity allocates nothing.
#[derive(Debug, Clone)]
pub struct SparseArray<V> {
    capacity: usize,
    items_per_block: usize,
    initial_block_capacity: usize,
    is_set: Vec<u64>,
    set_counts: Vec<u8>,
    /// Physical block arrays; the length of each is its allocated capacity.
    blocks: Vec<Vec<V>>,
    /// Number of entries actually present in each block.
    block_sizes: Vec<u32>,
    len: usize,
}

impl<V: SparseValue> SparseArray<V> {
    /// Creates an array addressing indices `0..capacity`.
    ///
    /// `items_per_block` is rounded up to a multiple of 64. A block is allocated with
    /// `initial_block_capacity` slots when its first entry is written.
    ///
    /// # Panics
    ///
    /// Panics if `items_per_block` or `initial_block_capacity` is zero.
    pub fn new(capacity: usize, items_per_block: usize, initial_block_capacity: usize) -> Self {
        assert!(items_per_block > 0, "items_per_block must be positive");
        assert!(
            initial_block_capacity > 0,
            "initial_block_capacity must be positive"
        );
        let items_per_block = items_per_block.next_multiple_of(BITS_PER_WORD);
        Self {
            capacity,
            items_per_block,
            initial_block_capacity,
            is_set: Vec::new(),
            set_counts: Vec::new(),
            blocks: Vec::new(),
            block_sizes: Vec::new(),
            len: 0,
        }
    }

    /// Returns the size of the logical index space.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of indices holding a non-zero value.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if no index holds a value.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the value at `index`, or zero if it is absent.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`SparseArray::capacity`].
    pub fn get(&self, index: usize) -> V {
        self.check_index(index);
        let (word, bit) = split_index(index);
        if !self.is_bit_set(word, bit) {
            return V::ZERO;
        }
        self.value_at(&self.locate(index))
    }

    /// Writes `value` at `index`. Writing zero removes the entry.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`SparseArray::capacity`].
    pub fn set(&mut self, index: usize, value: V) {
        let pointer = self.locate(index);
        self.set_at(&pointer, value);
    }

    /// Resolves `index` to its block, in-block offset and bitmap position.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`SparseArray::capacity`].
    pub fn locate(&self, index: usize) -> Pointer {
        self.check_index(index);
        let (word, bit) = split_index(index);
        let present = self.is_bit_set(word, bit);
        let block = index / self.items_per_block;
        let block_start_word = block * self.items_per_block / BITS_PER_WORD;

        // words past the materialized bitmap hold no entries
        let covered = word.min(self.set_counts.len());
        let mut entry: usize = self
            .set_counts
            .get(block_start_word..covered)
            .map_or(0, |counts| counts.iter().map(|&count| count as usize).sum());
        if let Some(&bits) = self.is_set.get(word) {
            // bits strictly below `bit` in the partial word
            let below = (1u64 << bit) - 1;
            entry += (bits & below).count_ones() as usize;
        }

        Pointer {
            present,
            block,
            entry,
            word,
            bit,
        }
    }

    /// Returns the value at a located position, or zero if it is absent.
    pub fn value_at(&self, pointer: &Pointer) -> V {
        if pointer.present {
            self.blocks[pointer.block][pointer.entry]
        } else {
            V::ZERO
        }
    }

    /// Writes `value` at a located position.
    ///
    /// The pointer must come from [`SparseArray::locate`] with no write in between.
    pub fn set_at(&mut self, pointer: &Pointer, value: V) {
        match (pointer.present, value == V::ZERO) {
            (true, false) => self.blocks[pointer.block][pointer.entry] = value,
            (true, true) => self.remove_entry(pointer),
            (false, false) => self.insert_entry(pointer, value),
            (false, true) => {}
        }
    }

    /// Returns an estimate of the heap bytes held by this array.
    pub fn bytes_used(&self) -> usize {
        let block_contents: usize = self
            .blocks
            .iter()
            .map(|block| block.capacity() * size_of::<V>())
            .sum();
        size_of::<Self>()
            + self.is_set.len() * size_of::<u64>()
            + self.set_counts.len()
            + self.blocks.len() * size_of::<Vec<V>>()
            + block_contents
            + self.block_sizes.len() * size_of::<u32>()
    }

    fn insert_entry(&mut self, pointer: &Pointer, value: V) {
        if self.is_set.len() <= pointer.word {
            self.is_set.resize(pointer.word + 1, 0);
            self.set_counts.resize(pointer.word + 1, 0);
        }
        if self.blocks.len() <= pointer.block {
            self.blocks.resize_with(pointer.block + 1, Vec::new);
            self.block_sizes.resize(pointer.block + 1, 0);
        }

        let size = self.block_sizes[pointer.block] as usize;
        let block = &mut self.blocks[pointer.block];
        if block.is_empty() {
            *block = vec![V::ZERO; self.initial_block_capacity];
        } else if size == block.len() {
            let grown = ((block.len() as f64 * GROWTH_FACTOR) as usize).max(size + 1);
            block.reserve_exact(grown - block.len());
            block.resize(grown, V::ZERO);
        }
        block.copy_within(pointer.entry..size, pointer.entry + 1);
        block[pointer.entry] = value;

        self.block_sizes[pointer.block] += 1;
        self.is_set[pointer.word] |= 1u64 << pointer.bit;
        self.set_counts[pointer.word] += 1;
        self.len += 1;
    }

    fn remove_entry(&mut self, pointer: &Pointer) {
        let size = self.block_sizes[pointer.block] as usize;
        let block = &mut self.blocks[pointer.block];
        block.copy_within(pointer.entry + 1..size, pointer.entry);
        let new_size = size - 1;
        block[new_size] = V::ZERO;
        if new_size == 0 {
            *block = Vec::new();
        } else if new_size < block.len() / 4 {
            block.truncate(block.len() / 2);
            block.shrink_to_fit();
        }

        self.block_sizes[pointer.block] -= 1;
        self.is_set[pointer.word] &= !(1u64 << pointer.bit);
        self.set_counts[pointer.word] -= 1;
        self.len -= 1;
    }

    fn is_bit_set(&self, word: usize, bit: u32) -> bool {
        self.is_set
            .get(word)
            .is_some_and(|&bits| bits & (1u64 << bit) != 0)
    }

    fn check_index(&self, index: usize) {
        assert!(
            index < self.capacity,
            "index {index} out of bounds for capacity {}",
            self.capacity
        );
    }
}

#[inline]
fn split_index(index: usize) -> (usize, u32) {
    (index / BITS_PER_WORD, (index % BITS_PER_WORD) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_spans_words_within_block() {
        let mut array = SparseArray::<u16>::new(1000, 256, 2);
        array.set(3, 30);
        array.set(70, 700);
        array.set(130, 1300);
        // 130 sits in the third word of the first block, behind two set indices
        let pointer = array.locate(130);
        assert!(pointer.is_present());
        assert_eq!(pointer.entry, 2);
        assert_eq!(array.value_at(&pointer), 1300);
        // the next block starts its own rank at zero
        array.set(256, 1);
        assert_eq!(array.locate(256).entry, 0);
    }

    #[test]
    fn test_block_grows_and_shrinks() {
        let mut array = SparseArray::<u64>::new(128, 128, 1);
        for i in 0..100 {
            array.set(i, i as u64 + 1);
        }
        assert!(array.blocks[0].len() >= 100);
        for i in 0..99 {
            array.set(i, 0);
        }
        assert_eq!(array.len(), 1);
        assert!(array.blocks[0].len() < 8);
        assert_eq!(array.get(99), 100);
        array.set(99, 0);
        assert!(array.blocks[0].is_empty());
        assert!(array.is_empty());
    }

    #[test]
    fn test_bitmap_grows_to_highest_index() {
        let mut array = SparseArray::<u32>::new(usize::MAX >> 8, 256, 1);
        assert!(array.is_set.is_empty());
        assert!(array.blocks.is_empty());
        assert_eq!(array.get(1 << 30), 0);
        assert!(!array.locate(1 << 30).is_present());

        array.set(770, 5);
        assert_eq!(array.is_set.len(), 770 / 64 + 1);
        assert_eq!(array.blocks.len(), 770 / 256 + 1);
        // 1020 shares the block of 770 but lies past the end of the bitmap
        let pointer = array.locate(1020);
        assert!(!pointer.is_present());
        assert_eq!(pointer.entry, 1);
        array.set(1020, 9);
        assert_eq!(array.is_set.len(), 1020 / 64 + 1);
        assert_eq!(array.get(770), 5);
        assert_eq!(array.get(1020), 9);
        assert_eq!(array.locate(1020).entry, 1);
    }

    #[test]
    fn test_items_per_block_rounds_up() {
        let array = SparseArray::<u8>::new(10, 100, 4);
        assert_eq!(array.items_per_block, 128);
    }
}
