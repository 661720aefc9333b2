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

use googletest::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use streamsummary::vla::SparseArray;
use streamsummary::vla::VarintCounterArray;
use streamsummary::vla::Width;

fn value_for(i: usize) -> u8 {
    (i / 3 + 1) as u8
}

#[test]
fn test_sparse_basic() {
    let mut array = SparseArray::<u8>::new(100_000, 256, 4);
    for i in 0..1000 {
        array.set(i, value_for(i));
        assert_eq!(array.get(i), value_for(i), "index {i}");
    }
    for i in (0..1000).step_by(100) {
        array.set(i, 0);
        assert_eq!(array.get(i), 0, "index {i}");
    }
    for i in 0..1000 {
        if i % 100 != 0 {
            assert_eq!(array.get(i), value_for(i), "index {i}");
        }
    }
    for i in 0..1000 {
        if i % 10 != 0 {
            array.set(i, 0);
            assert_eq!(array.get(i), 0, "index {i}");
        } else if i % 100 != 0 {
            assert_eq!(array.get(i), value_for(i), "index {i}");
        }
    }
    assert_that!(array.len(), eq(90));
}

#[test]
fn test_sparse_matches_dense_model() {
    let capacity = 5000;
    let mut rng = StdRng::seed_from_u64(42);
    let mut array = SparseArray::<u32>::new(capacity, 300, 1);
    let mut model = vec![0u32; capacity];
    for _ in 0..50_000 {
        let i = rng.random_range(0..capacity);
        let value = if rng.random_bool(0.3) {
            0
        } else {
            rng.random_range(1..=u32::MAX)
        };
        array.set(i, value);
        model[i] = value;
    }
    for (i, &expected) in model.iter().enumerate() {
        assert_eq!(array.get(i), expected, "index {i}");
    }
    assert_eq!(array.len(), model.iter().filter(|&&v| v != 0).count());
}

#[test]
fn test_pointer_read_modify_write() {
    let mut array = SparseArray::<u16>::new(10_000, 512, 2);
    let indices = [9_999, 0, 511, 512, 4_096, 0, 511, 9_999, 0];
    for &i in &indices {
        let pointer = array.locate(i);
        let value = array.value_at(&pointer);
        array.set_at(&pointer, value + 1);
    }
    assert_eq!(array.get(0), 3);
    assert_eq!(array.get(511), 2);
    assert_eq!(array.get(512), 1);
    assert_eq!(array.get(4_096), 1);
    assert_eq!(array.get(9_999), 2);
    assert_eq!(array.get(1), 0);

    let pointer = array.locate(511);
    assert!(pointer.is_present());
    array.set_at(&pointer, 0);
    assert!(!array.locate(511).is_present());
    assert_eq!(array.get(0), 3);
    assert_eq!(array.get(512), 1);
}

#[test]
#[should_panic(expected = "out of bounds")]
fn test_sparse_index_out_of_bounds() {
    let array = SparseArray::<u64>::new(100, 64, 1);
    array.get(100);
}

#[test]
fn test_sparse_memory_tracks_entries() {
    let capacity = 10_000_000;
    let mut rng = StdRng::seed_from_u64(1);
    let mut array = SparseArray::<u64>::new(capacity, 128, 1);
    // nothing is allocated before the first write
    assert_that!(array.bytes_used(), eq(size_of::<SparseArray<u64>>()));
    for _ in 0..1000 {
        array.set(rng.random_range(0..capacity), rng.random_range(1..=u64::MAX));
    }
    let bytes = array.bytes_used();
    let dense_bytes = capacity * size_of::<u64>();
    assert_that!(bytes * 10, lt(dense_bytes));
}

#[test]
fn test_sparse_memory_follows_highest_index() {
    let mut array = SparseArray::<u64>::new(10_000_000, 128, 1);
    for i in 0..1000 {
        array.set(i, i as u64 + 1);
    }
    // entries near the start never touch the bitmap of the rest of the index space
    assert_that!(array.bytes_used(), lt(32 * 1024));
    assert_that!(array.get(9_999_999), eq(0));
}

#[test]
fn test_varint_matches_exact_counts() {
    let size = 100_000;
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let mut counters = VarintCounterArray::new(size);
    let mut exact = vec![0u64; size];
    for i in 0..200_000 {
        // a wide and a narrow distribution, for both many distinct indices and high counts
        let z = if i % 2 == 0 {
            rng.random_range(0..size)
        } else {
            rng.random_range(0..8)
        };
        counters.add_to(z, 1);
        exact[z] += 1;
        assert_eq!(counters.get(z), exact[z], "index {z}");
    }
    for (i, &count) in exact.iter().enumerate() {
        assert_eq!(counters.get(i), count, "index {i}");
        assert_eq!(counters.width(i), Width::fitting(count), "index {i}");
    }
    assert_that!(counters.bytes_used(), lt(size * size_of::<u64>()));
}

#[test]
fn test_varint_large_increments() {
    let mut counters = VarintCounterArray::new(16);
    let steps = [1u64, 254, 1, 65_280, 1, 0xFFFF_0000, 1 << 40, u64::MAX >> 2];
    let mut total = 0u64;
    for step in steps {
        counters.add_to(5, step);
        total += step;
        assert_eq!(counters.get(5), total);
        assert_eq!(counters.width(5), Width::fitting(total));
    }
    for i in (0..16).filter(|&i| i != 5) {
        assert_eq!(counters.get(i), 0);
    }
}

#[test]
fn test_varint_set_resets_width() {
    let mut counters = VarintCounterArray::new(16);
    counters.set(2, u64::MAX);
    assert_eq!(counters.width(2), Width::W64);
    counters.set(2, 300);
    assert_eq!(counters.width(2), Width::W16);
    counters.add_to(2, 1);
    assert_eq!(counters.get(2), 301);
    counters.set(2, 0);
    assert_eq!(counters.get(2), 0);
    assert_eq!(counters.width(2), Width::W8);
}

#[test]
#[should_panic(expected = "increment must be positive")]
fn test_varint_zero_increment_panics() {
    let mut counters = VarintCounterArray::new(4);
    counters.add_to(0, 0);
}
