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

//! Array heap of slot numbers that can reposition any slot in `O(log n)`.

use crate::vla::VarintCounterArray;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum HeapOrder {
    /// Largest count at the root.
    Max,
    /// Smallest count at the root.
    Min,
}

/// A binary heap over slot numbers, keyed by the counts of a [`VarintCounterArray`].
///
/// `index_in_heap[slot]` always holds the heap position of `slot`, so a slot whose count changed
/// can be sifted from where it is without searching for it.
#[derive(Debug, Clone)]
pub(super) struct IndexedHeap {
    order: HeapOrder,
    heap: Vec<usize>,
    index_in_heap: Vec<usize>,
}

impl IndexedHeap {
    pub fn new(order: HeapOrder) -> Self {
        Self {
            order,
            heap: Vec::new(),
            index_in_heap: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns the slot at the root of the heap.
    pub fn root(&self) -> Option<usize> {
        self.heap.first().copied()
    }

    pub fn slot_at(&self, position: usize) -> usize {
        self.heap[position]
    }

    /// Appends the next slot, which must equal the current heap length, and restores order.
    pub fn push(&mut self, slot: usize, counts: &VarintCounterArray) {
        debug_assert_eq!(slot, self.heap.len(), "slots must be appended in order");
        self.heap.push(slot);
        self.index_in_heap.push(slot);
        self.sift_up(slot, counts);
    }

    /// Moves `slot` toward the root while it precedes its parent.
    pub fn sift_up(&mut self, slot: usize, counts: &VarintCounterArray) {
        let mut position = self.index_in_heap[slot];
        let count = counts.get(slot);
        while position > 0 {
            let parent = (position - 1) / 2;
            if !self.precedes(count, counts.get(self.heap[parent])) {
                break;
            }
            self.swap(position, parent);
            position = parent;
        }
    }

    /// Moves `slot` toward the leaves while one of its children precedes it.
    pub fn sift_down(&mut self, slot: usize, counts: &VarintCounterArray) {
        let n = self.heap.len();
        let mut position = self.index_in_heap[slot];
        let count = counts.get(slot);
        loop {
            let left = 2 * position + 1;
            if left >= n {
                break;
            }
            let right = left + 1;
            let mut child = left;
            let mut child_count = counts.get(self.heap[left]);
            if right < n {
                let right_count = counts.get(self.heap[right]);
                if self.precedes(right_count, child_count) {
                    child = right;
                    child_count = right_count;
                }
            }
            if !self.precedes(child_count, count) {
                break;
            }
            self.swap(position, child);
            position = child;
        }
    }

    /// Asserts the reverse map and the heap property for every position.
    pub fn verify(&self, counts: &VarintCounterArray) {
        for (position, &slot) in self.heap.iter().enumerate() {
            assert_eq!(
                self.index_in_heap[slot], position,
                "{:?} heap: slot {slot} is at position {position} but indexed elsewhere",
                self.order
            );
            if position > 0 {
                let parent = (position - 1) / 2;
                assert!(
                    !self.precedes(counts.get(slot), counts.get(self.heap[parent])),
                    "{:?} heap: position {position} precedes its parent",
                    self.order
                );
            }
        }
    }

    fn precedes(&self, a: u64, b: u64) -> bool {
        match self.order {
            HeapOrder::Max => a > b,
            HeapOrder::Min => a < b,
        }
    }

    fn swap(&mut self, i: usize, j: usize) {
        self.heap.swap(i, j);
        self.index_in_heap[self.heap[i]] = i;
        self.index_in_heap[self.heap[j]] = j;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heap_with(order: HeapOrder, values: &[u64]) -> (IndexedHeap, VarintCounterArray) {
        let mut counts = VarintCounterArray::new(values.len());
        let mut heap = IndexedHeap::new(order);
        for (slot, &value) in values.iter().enumerate() {
            counts.set(slot, value);
            heap.push(slot, &counts);
        }
        (heap, counts)
    }

    #[test]
    fn test_push_orders_roots() {
        let values = [5, 3, 9, 1, 7, 7, 2];
        let (max, counts) = heap_with(HeapOrder::Max, &values);
        max.verify(&counts);
        assert_eq!(max.root(), Some(2));

        let (min, counts) = heap_with(HeapOrder::Min, &values);
        min.verify(&counts);
        assert_eq!(min.root(), Some(3));
    }

    #[test]
    fn test_reposition_after_increment() {
        let values = [1, 2, 3, 4, 5];
        let (mut min, mut counts) = heap_with(HeapOrder::Min, &values);
        assert_eq!(min.root(), Some(0));
        counts.add_to(0, 10);
        min.sift_down(0, &counts);
        min.verify(&counts);
        assert_eq!(min.root(), Some(1));

        let (mut max, mut counts) = heap_with(HeapOrder::Max, &values);
        counts.add_to(0, 10);
        max.sift_up(0, &counts);
        max.verify(&counts);
        assert_eq!(max.root(), Some(0));
    }
}
