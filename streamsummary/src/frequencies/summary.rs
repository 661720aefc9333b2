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

//! Space-Saving stream summary.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::assert::ensure_serial_version_is;
use crate::codec::assert::ensure_type_tag_is;
use crate::codec::assert::insufficient_data;
use crate::codec::family::Family;
use crate::error::Error;
use crate::frequencies::counter::Counter;
use crate::frequencies::indexed_heap::HeapOrder;
use crate::frequencies::indexed_heap::IndexedHeap;
use crate::frequencies::serde::SummaryItem;
use crate::frequencies::serialization::SERIAL_VERSION;
use crate::frequencies::serialization::SUMMARY_PREAMBLE_BYTES;
use crate::vla::VarintCounterArray;

/// Outcome of [`StreamSummary::offer_return_all`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer<T> {
    is_new: bool,
    dropped: Option<T>,
}

impl<T> Offer<T> {
    /// Returns true if the item was not tracked before the offer.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Returns the item evicted to make room, if any.
    pub fn dropped(&self) -> Option<&T> {
        self.dropped.as_ref()
    }

    /// Returns the evicted item, consuming the outcome.
    pub fn into_dropped(self) -> Option<T> {
        self.dropped
    }
}

/// Bounded top-k summary of a stream, based on the Space-Saving algorithm.
///
/// Items live in a fixed number of slots. Each slot keeps its item, its count and an error bound
/// inherited from the item it replaced. Two heaps over the slot numbers are maintained side by
/// side: a max-heap that yields the top items and a min-heap whose root is the next eviction
/// victim. Counts are stored in a [`VarintCounterArray`], so most of them take a byte or two.
///
/// See [`crate::frequencies`] for an overview and error guarantees.
#[derive(Debug, Clone)]
pub struct StreamSummary<T> {
    capacity: usize,
    items: Vec<T>,
    indices: HashMap<T, usize>,
    max_heap: IndexedHeap,
    min_heap: IndexedHeap,
    counts: VarintCounterArray,
    errors: VarintCounterArray,
    stream_weight: u64,
    debug_mode: bool,
}

impl<T: Eq + Hash + Clone> StreamSummary<T> {
    /// Creates an empty summary tracking at most `capacity` items.
    ///
    /// Larger capacities improve accuracy. Storage is allocated as items arrive, so an empty
    /// summary is cheap regardless of its capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` does not fit in 32 bits.
    pub fn new(capacity: usize) -> Self {
        assert!(
            u32::try_from(capacity).is_ok(),
            "capacity must fit in 32 bits, got {capacity}"
        );
        Self {
            capacity,
            items: Vec::new(),
            indices: HashMap::new(),
            max_heap: IndexedHeap::new(HeapOrder::Max),
            min_heap: IndexedHeap::new(HeapOrder::Min),
            counts: VarintCounterArray::new(capacity),
            errors: VarintCounterArray::new(capacity),
            stream_weight: 0,
            debug_mode: false,
        }
    }

    /// Returns the maximum number of tracked items.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of tracked items.
    pub fn size(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if no item is tracked.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Returns the sum of all increments offered.
    ///
    /// This always equals the sum of the tracked counts.
    pub fn total_weight(&self) -> u64 {
        self.stream_weight
    }

    /// Returns the estimated count of `item`, or zero if it is not tracked.
    pub fn estimate(&self, item: &T) -> u64 {
        self.indices
            .get(item)
            .map_or(0, |&slot| self.counts.get(slot))
    }

    /// Returns the error bound of `item`, or zero if it is not tracked.
    pub fn error(&self, item: &T) -> u64 {
        self.indices
            .get(item)
            .map_or(0, |&slot| self.errors.get(slot))
    }

    /// Checks every structural invariant after each offer when enabled.
    ///
    /// This is expensive and meant for tests.
    pub fn set_debug_mode(&mut self, debug_mode: bool) {
        self.debug_mode = debug_mode;
    }

    /// Offers one occurrence of `item`.
    ///
    /// Returns false if the item was already tracked.
    ///
    /// # Panics
    ///
    /// Panics if the total weight overflows `u64`.
    pub fn offer(&mut self, item: T) -> bool {
        self.offer_with_count(item, 1)
    }

    /// Offers `increment` occurrences of `item`.
    ///
    /// Returns false if the item was already tracked.
    ///
    /// # Panics
    ///
    /// Panics if `increment` is zero or if the total weight overflows `u64`.
    pub fn offer_with_count(&mut self, item: T, increment: u64) -> bool {
        self.offer_return_all(item, increment).is_new()
    }

    /// Offers `increment` occurrences of `item` and returns the evicted item, if any.
    ///
    /// # Panics
    ///
    /// Panics if `increment` is zero or if the total weight overflows `u64`.
    pub fn offer_return_dropped(&mut self, item: T, increment: u64) -> Option<T> {
        self.offer_return_all(item, increment).into_dropped()
    }

    /// Offers `increment` occurrences of `item`.
    ///
    /// An untracked item takes a fresh slot while the summary has room. Once it is full, the
    /// item with the smallest count is evicted: the newcomer inherits its slot and its count,
    /// and that count becomes the newcomer's error bound.
    ///
    /// A summary with zero capacity ignores every offer.
    ///
    /// # Panics
    ///
    /// Panics if `increment` is zero or if the total weight overflows `u64`. Every count is
    /// bounded by the total weight, so no single counter can overflow first.
    pub fn offer_return_all(&mut self, item: T, increment: u64) -> Offer<T> {
        assert!(increment > 0, "increment must be positive");
        if self.capacity == 0 {
            return Offer {
                is_new: false,
                dropped: None,
            };
        }
        let stream_weight = self
            .stream_weight
            .checked_add(increment)
            .unwrap_or_else(|| panic!("total weight overflows u64"));

        let mut dropped = None;
        let existing = self.indices.get(&item).copied();
        let is_new = existing.is_none();
        let slot = match existing {
            Some(slot) => slot,
            None if self.indices.len() == self.capacity => {
                let Some(slot) = self.min_heap.root() else {
                    unreachable!("a full summary with non-zero capacity has a min-heap root");
                };
                self.errors.set(slot, self.counts.get(slot));
                let evicted = std::mem::replace(&mut self.items[slot], item.clone());
                self.indices.remove(&evicted);
                self.indices.insert(item, slot);
                dropped = Some(evicted);
                slot
            }
            None => {
                let slot = self.indices.len();
                self.items.push(item.clone());
                self.indices.insert(item, slot);
                self.max_heap.push(slot, &self.counts);
                self.min_heap.push(slot, &self.counts);
                slot
            }
        };

        self.counts.add_to(slot, increment);
        self.stream_weight = stream_weight;
        self.max_heap.sift_up(slot, &self.counts);
        self.min_heap.sift_down(slot, &self.counts);

        if self.debug_mode {
            self.verify_invariants();
        }
        Offer { is_new, dropped }
    }

    /// Returns the `k` items with the largest counts, in descending count order.
    ///
    /// Fewer items are returned if fewer are tracked. The order among equal counts is
    /// unspecified.
    pub fn peek(&self, k: usize) -> Vec<T> {
        self.top_k_slots(k)
            .into_iter()
            .map(|slot| self.items[slot].clone())
            .collect()
    }

    /// Returns counters for the `k` items with the largest counts, in descending count order.
    ///
    /// Fewer counters are returned if fewer items are tracked. The order among equal counts is
    /// unspecified.
    pub fn top_k(&self, k: usize) -> Vec<Counter<T>> {
        self.top_k_slots(k)
            .into_iter()
            .map(|slot| {
                Counter::new(
                    self.items[slot].clone(),
                    self.counts.get(slot),
                    self.errors.get(slot),
                )
            })
            .collect()
    }

    /// Asserts that the hash index, both heaps and their reverse maps agree.
    ///
    /// # Panics
    ///
    /// Panics on the first broken invariant.
    pub fn verify_invariants(&self) {
        let n = self.indices.len();
        assert_eq!(self.items.len(), n, "every slot below size must be occupied");
        assert_eq!(self.max_heap.len(), n, "max heap must hold every slot");
        assert_eq!(self.min_heap.len(), n, "min heap must hold every slot");
        for (slot, item) in self.items.iter().enumerate() {
            assert_eq!(
                self.indices.get(item),
                Some(&slot),
                "index must map the item of slot {slot} back to it"
            );
            assert!(
                self.errors.get(slot) <= self.counts.get(slot),
                "error of slot {slot} exceeds its count"
            );
        }
        self.max_heap.verify(&self.counts);
        self.min_heap.verify(&self.counts);
    }

    /// Best-first walk of the max-heap array: the next largest count is always the root or a
    /// child of an already emitted position.
    fn top_k_slots(&self, k: usize) -> Vec<usize> {
        let n = self.max_heap.len();
        let k = k.min(n);
        let mut slots = Vec::with_capacity(k);
        if k == 0 {
            return slots;
        }
        let mut frontier = BinaryHeap::with_capacity(k + 1);
        frontier.push((self.counts.get(self.max_heap.slot_at(0)), Reverse(0usize)));
        while slots.len() < k {
            let Some((_, Reverse(position))) = frontier.pop() else {
                break;
            };
            slots.push(self.max_heap.slot_at(position));
            for child in [2 * position + 1, 2 * position + 2] {
                if child < n {
                    let count = self.counts.get(self.max_heap.slot_at(child));
                    frontier.push((count, Reverse(child)));
                }
            }
        }
        slots
    }
}

impl<T: SummaryItem> StreamSummary<T> {
    /// Serializes this summary into a byte vector.
    ///
    /// Items and counts are kept; error bounds are not.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = SketchBytes::with_capacity(SUMMARY_PREAMBLE_BYTES + self.size() * 16);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(Family::SPACE_SAVING.id);
        bytes.write_u8(T::ITEM_TYPE as u8);
        bytes.write_u8(0);
        bytes.write_u32_le(self.capacity as u32);
        bytes.write_u32_le(self.size() as u32);
        for (slot, item) in self.items.iter().enumerate() {
            item.write_item(&mut bytes);
            bytes.write_u64_le(self.counts.get(slot));
        }
        bytes.into_bytes()
    }

    /// Deserializes a summary from bytes.
    ///
    /// Entries are replayed in slot order into an empty summary of the stored capacity, which
    /// restores the same items and counts. Error bounds restart at zero.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let serial_version = cursor
            .read_u8()
            .map_err(insufficient_data("serial_version"))?;
        let family_id = cursor.read_u8().map_err(insufficient_data("family_id"))?;
        Family::SPACE_SAVING.validate_id(family_id)?;
        ensure_serial_version_is(SERIAL_VERSION, serial_version)?;
        let item_type = cursor.read_u8().map_err(insufficient_data("item_type"))?;
        ensure_type_tag_is(T::ITEM_TYPE as u8, item_type)?;
        cursor.read_u8().map_err(insufficient_data("reserved"))?;

        let capacity = cursor.read_u32_le().map_err(insufficient_data("capacity"))? as usize;
        let num_items = cursor.read_u32_le().map_err(insufficient_data("num_items"))? as usize;
        if num_items > capacity {
            return Err(Error::deserial("number of items exceeds capacity")
                .with_context("capacity", capacity)
                .with_context("num_items", num_items));
        }
        if num_items.saturating_mul(T::MIN_ENCODED_LEN + 8) > cursor.remaining() {
            return Err(Error::insufficient_data("entries").with_context("num_items", num_items));
        }

        let mut summary = Self::new(capacity);
        for _ in 0..num_items {
            let item = T::read_item(&mut cursor)?;
            let count = cursor.read_u64_le().map_err(insufficient_data("count"))?;
            if count == 0 {
                return Err(Error::deserial("entry count must be positive"));
            }
            if !summary.offer_with_count(item, count) {
                return Err(Error::deserial("duplicate item in serialized summary"));
            }
        }
        Ok(summary)
    }
}

impl<T: Eq + Hash + Clone + fmt::Display> fmt::Display for StreamSummary<T> {
    /// Formats as `{item: count, ...}` in ascending count order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<(u64, String)> = self
            .items
            .iter()
            .enumerate()
            .map(|(slot, item)| (self.counts.get(slot), item.to_string()))
            .collect();
        entries.sort();
        write!(f, "{{")?;
        for (i, (count, item)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{item}: {count}")?;
        }
        write!(f, "}}")
    }
}
