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

use std::collections::HashSet;

use googletest::prelude::*;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use streamsummary::membership::StreamingQuotientFilter;

const EMPTY_BUCKET: &str = "00000000000";

fn row_buckets(filter: &StreamingQuotientFilter, row: usize) -> Vec<String> {
    (0..filter.buckets_per_row())
        .map(|bucket| filter.bucket_to_string(row, bucket))
        .collect()
}

#[test]
fn test_white_box() {
    // 16 rows of 5 buckets; a 60-bit remainder needs a 6-bit popcount, leaving 4 reduced bits
    let mut filter = StreamingQuotientFilter::with_seed(4, 5, 10, 0);
    assert_that!(filter.num_rows(), eq(16));

    // row 1, popcount 27, reduced remainder 1001
    assert!(filter.add(0x1234567890ABCD49));
    assert_that!(filter.bucket_to_string(0, 4), eq(EMPTY_BUCKET));
    assert_that!(filter.bucket_to_string(1, 0), eq("01101110011"));
    assert_that!(filter.bucket_to_string(1, 1), eq(EMPTY_BUCKET));

    assert!(!filter.add(0x1234567890ABCD49));
    assert_that!(filter.bucket_to_string(1, 0), eq("01101110011"));
    assert_that!(filter.bucket_to_string(1, 1), eq(EMPTY_BUCKET));

    // row 1, popcount 26, reduced remainder 1000
    assert!(filter.add(0x1234567890ABCD48));
    assert_that!(filter.bucket_to_string(1, 0), eq("01101110011"));
    assert_that!(filter.bucket_to_string(1, 1), eq("01101010001"));

    assert!(!filter.add(0x1234567890ABCD49));
    assert!(!filter.add(0x1234567890ABCD48));

    assert!(filter.add(0x1234567890ABCD47));
    assert!(filter.add(0x1234567890ABCD46));
    assert!(filter.add(0x1234567890ABCD45));
    assert_that!(filter.bucket_to_string(0, 4), eq(EMPTY_BUCKET));
    assert_eq!(
        row_buckets(&filter, 1),
        [
            "01101110011",
            "01101010001",
            "01110001111",
            "01101101101",
            "01101101011"
        ]
    );

    for hash in 0x1234567890ABCD45..=0x1234567890ABCD49u64 {
        assert!(!filter.add(hash), "{hash:#x}");
    }

    // row 1 is full, so one bucket is overwritten with popcount 20, reduced remainder 0010
    let before = row_buckets(&filter, 1);
    assert!(filter.add(0x123456789000CD02));
    let after = row_buckets(&filter, 1);
    let changed: Vec<usize> = (0..5).filter(|&i| before[i] != after[i]).collect();
    assert_that!(changed.len(), eq(1));
    assert_that!(after[changed[0]].as_str(), eq("01010000101"));
    assert!(!filter.add(0x123456789000CD02));
    assert_that!(filter.bucket_to_string(0, 4), eq(EMPTY_BUCKET));

    // row 13, popcount 36, reduced remainder 1111
    assert!(filter.add(0xDEADF00D1EE7B33F));
    assert_that!(filter.bucket_to_string(13, 0), eq("10010011111"));
}

#[test]
fn test_black_box() {
    let mut rng = StdRng::seed_from_u64(0x5EED);
    let mut filter = StreamingQuotientFilter::with_seed(4, 5, 10, 1);
    let mut seen = HashSet::new();
    for _ in 0..100_000 {
        let hash = rng.random_range(0..1_000_000u64);
        seen.insert(hash);
        filter.add(hash);
        // a tiny filter forgets older hashes, but always remembers the last one
        assert!(!filter.add(hash), "{hash:#x} was not remembered");
    }
    assert_that!(seen.len(), gt(50_000));
}

#[test]
fn test_sparse_stream_is_exact() {
    let mut rng = StdRng::seed_from_u64(17);
    let mut filter = StreamingQuotientFilter::with_seed(16, 4, 20, 2);
    let hashes: Vec<u64> = (0..1000).map(|_| rng.random()).collect();
    let unique = hashes.iter().filter(|&&hash| filter.add(hash)).count();
    let distinct = hashes.iter().collect::<HashSet<_>>().len();
    // signature collisions within a row are possible but rare at this load
    assert_that!(unique, le(distinct));
    assert_that!(unique, ge(distinct - 10));
    for hash in &hashes {
        assert!(!filter.add(*hash), "{hash:#x}");
    }
}

#[test]
fn test_single_row() {
    let mut filter = StreamingQuotientFilter::with_seed(0, 3, 10, 3);
    assert_that!(filter.num_rows(), eq(1));
    assert!(filter.add(u64::MAX));
    assert!(!filter.add(u64::MAX));
    assert!(filter.add(1));
    assert!(!filter.add(1));
}

#[test]
fn test_display() {
    // 63-bit remainder, 6-bit popcount, 4 reduced bits
    let mut filter = StreamingQuotientFilter::with_seed(1, 2, 10, 4);
    assert!(filter.add(0x8000_0000_0000_000F));
    assert_eq!(
        filter.to_string(),
        "0: 00000000000  00000000000\n1: 00010011111  00000000000\n"
    );
    assert_that!(filter.row_to_string(1), eq("00010011111  00000000000"));
}

#[test]
fn test_buckets_span_word_boundaries() {
    // 13-bit buckets never align with 64-bit words
    let mut filter = StreamingQuotientFilter::with_seed(8, 7, 12, 5);
    let mut rng = StdRng::seed_from_u64(99);
    let hashes: Vec<u64> = (0..200).map(|_| rng.random()).collect();
    for &hash in &hashes {
        filter.add(hash);
        assert!(!filter.add(hash), "{hash:#x}");
    }
    let occupied = (0..filter.num_rows())
        .flat_map(|row| row_buckets(&filter, row))
        .filter(|bucket| bucket.ends_with('1'))
        .count();
    assert_that!(occupied, le(200));
    assert_that!(occupied, ge(150));
}

#[test]
#[should_panic(expected = "too few remainder bits")]
fn test_too_many_quotient_bits() {
    StreamingQuotientFilter::new(32, 5, 10);
}

#[test]
#[should_panic(expected = "too few bucket bits")]
fn test_too_few_bucket_bits() {
    StreamingQuotientFilter::new(4, 5, 6);
}

#[test]
#[should_panic(expected = "buckets_per_row must be positive")]
fn test_zero_buckets() {
    StreamingQuotientFilter::new(4, 0, 10);
}
