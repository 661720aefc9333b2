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

//! Streaming quotient filter for approximate duplicate detection.

use std::fmt;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

const WORD_BITS: usize = 64;

/// Approximate duplicate detector for a stream of 64-bit hashes.
///
/// This follows "Streaming Quotient Filter: A Near Optimal Approximate Duplicate Detection
/// Approach for Data Streams" by Sourav Dutta, Ankur Narang, and Suman K. Bera.
///
/// The high `quotient_bits` of a hash select a row. The remaining bits are reduced to a bucket
/// signature: the popcount of the remainder followed by its lowest bits. A row holds a fixed
/// number of buckets; when all are taken, a random one is overwritten. The filter never grows
/// and never deletes, so it may report a new hash as a duplicate (signature collision) or a
/// duplicate as new (its bucket was overwritten).
///
/// Buckets are bit-packed most-significant-bit first. The lowest bit of each bucket marks it as
/// occupied.
///
/// # Examples
///
/// ```
/// # use streamsummary::membership::StreamingQuotientFilter;
/// let mut filter = StreamingQuotientFilter::with_seed(10, 4, 16, 7);
/// assert!(filter.add(0x1234_5678_9ABC_DEF0));
/// assert!(!filter.add(0x1234_5678_9ABC_DEF0));
/// ```
#[derive(Debug, Clone)]
pub struct StreamingQuotientFilter {
    quotient_bits: u32,
    remainder_bits: u32,
    reduced_rem_bits: u32,
    num_rows: usize,
    buckets_per_row: usize,
    bits_per_bucket: usize,
    bits_per_row: usize,
    data: Vec<u64>,
    rng: StdRng,
}

impl StreamingQuotientFilter {
    /// Creates an empty filter with `2^quotient_bits` rows of `buckets_per_row` buckets, each
    /// holding a `bits_per_bucket_value`-bit signature.
    ///
    /// # Panics
    ///
    /// Panics if `quotient_bits > 31`, if `buckets_per_row` is zero, if
    /// `bits_per_bucket_value > 63`, or if `bits_per_bucket_value` leaves no room for the reduced
    /// remainder after the popcount field.
    pub fn new(quotient_bits: u32, buckets_per_row: usize, bits_per_bucket_value: u32) -> Self {
        Self::with_rng(
            quotient_bits,
            buckets_per_row,
            bits_per_bucket_value,
            StdRng::from_os_rng(),
        )
    }

    /// Creates an empty filter whose bucket replacement is driven by a seeded generator.
    ///
    /// # Panics
    ///
    /// Same conditions as [`StreamingQuotientFilter::new`].
    pub fn with_seed(
        quotient_bits: u32,
        buckets_per_row: usize,
        bits_per_bucket_value: u32,
        seed: u64,
    ) -> Self {
        Self::with_rng(
            quotient_bits,
            buckets_per_row,
            bits_per_bucket_value,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(
        quotient_bits: u32,
        buckets_per_row: usize,
        bits_per_bucket_value: u32,
        rng: StdRng,
    ) -> Self {
        assert!(
            quotient_bits <= 31,
            "too few remainder bits: quotient_bits must be at most 31, got {quotient_bits}"
        );
        assert!(buckets_per_row > 0, "buckets_per_row must be positive");
        assert!(
            bits_per_bucket_value <= 63,
            "bits_per_bucket_value must be at most 63, got {bits_per_bucket_value}"
        );
        let remainder_bits = 64 - quotient_bits;
        // the popcount ranges over 0..=remainder_bits
        let popcount_bits = ceil_log2(remainder_bits + 1);
        assert!(
            bits_per_bucket_value > popcount_bits,
            "too few bucket bits: more than {popcount_bits} required, {bits_per_bucket_value} specified"
        );
        let reduced_rem_bits = bits_per_bucket_value - popcount_bits;

        // one extra bit per bucket marks it as occupied
        let bits_per_bucket = bits_per_bucket_value as usize + 1;
        let bits_per_row = buckets_per_row * bits_per_bucket;
        let num_rows = 1usize << quotient_bits;
        // a trailing word lets a bucket straddle the last word boundary
        let num_words = (num_rows * bits_per_row).div_ceil(WORD_BITS) + 1;

        Self {
            quotient_bits,
            remainder_bits,
            reduced_rem_bits,
            num_rows,
            buckets_per_row,
            bits_per_bucket,
            bits_per_row,
            data: vec![0; num_words],
            rng,
        }
    }

    /// Returns the number of rows.
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Returns the number of buckets in each row.
    pub fn buckets_per_row(&self) -> usize {
        self.buckets_per_row
    }

    /// Records `hash` and returns true if it was not seen before.
    ///
    /// Returns false if the row of `hash` already holds its signature.
    pub fn add(&mut self, hash: u64) -> bool {
        let row = if self.quotient_bits == 0 {
            0
        } else {
            (hash >> self.remainder_bits) as usize
        };
        let remainder = if self.remainder_bits == 64 {
            hash
        } else {
            hash & ((1u64 << self.remainder_bits) - 1)
        };
        let reduced_mask = (1u64 << self.reduced_rem_bits) - 1;
        let signature =
            ((remainder.count_ones() as u64) << self.reduced_rem_bits) | (remainder & reduced_mask);

        let mut empty_bucket = None;
        for bucket in 0..self.buckets_per_row {
            let value = self.read_bits(self.bucket_position(row, bucket));
            if value & 1 == 0 {
                if empty_bucket.is_none() {
                    empty_bucket = Some(bucket);
                }
                continue;
            }
            if value >> 1 == signature {
                return false;
            }
        }
        let bucket =
            empty_bucket.unwrap_or_else(|| self.rng.random_range(0..self.buckets_per_row));
        self.write_bits(self.bucket_position(row, bucket), (signature << 1) | 1);
        true
    }

    /// Renders one bucket as a string of `0`s and `1`s, occupancy bit last.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `bucket` is out of range.
    pub fn bucket_to_string(&self, row: usize, bucket: usize) -> String {
        assert!(row < self.num_rows, "row {row} out of range");
        assert!(bucket < self.buckets_per_row, "bucket {bucket} out of range");
        let value = self.read_bits(self.bucket_position(row, bucket));
        format!("{value:0width$b}", width = self.bits_per_bucket)
    }

    /// Renders all buckets of a row, separated by two spaces.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range.
    pub fn row_to_string(&self, row: usize) -> String {
        (0..self.buckets_per_row)
            .map(|bucket| self.bucket_to_string(row, bucket))
            .collect::<Vec<_>>()
            .join("  ")
    }

    fn bucket_position(&self, row: usize, bucket: usize) -> usize {
        row * self.bits_per_row + bucket * self.bits_per_bucket
    }

    fn bucket_mask(&self) -> u64 {
        u64::MAX >> (WORD_BITS - self.bits_per_bucket)
    }

    /// Reads `bits_per_bucket` bits starting at bit `pos`, which may span two words.
    fn read_bits(&self, pos: usize) -> u64 {
        let word = pos / WORD_BITS;
        let bits_from_left = WORD_BITS - pos % WORD_BITS;
        let left = self.data[word];
        if bits_from_left >= self.bits_per_bucket {
            (left >> (bits_from_left - self.bits_per_bucket)) & self.bucket_mask()
        } else {
            let bits_from_right = self.bits_per_bucket - bits_from_left;
            let part_from_left = left & ((1u64 << bits_from_left) - 1);
            let part_from_right = self.data[word + 1] >> (WORD_BITS - bits_from_right);
            (part_from_left << bits_from_right) | part_from_right
        }
    }

    /// Writes the low `bits_per_bucket` bits of `value` starting at bit `pos`.
    fn write_bits(&mut self, pos: usize, value: u64) {
        let value = value & self.bucket_mask();
        let word = pos / WORD_BITS;
        let bits_from_left = WORD_BITS - pos % WORD_BITS;
        if bits_from_left >= self.bits_per_bucket {
            let shift = bits_from_left - self.bits_per_bucket;
            let mask = self.bucket_mask() << shift;
            self.data[word] = (self.data[word] & !mask) | (value << shift);
        } else {
            let bits_from_right = self.bits_per_bucket - bits_from_left;
            let left_mask = (1u64 << bits_from_left) - 1;
            let right_shift = WORD_BITS - bits_from_right;
            let right_mask = u64::MAX << right_shift;
            self.data[word] = (self.data[word] & !left_mask) | (value >> bits_from_right);
            self.data[word + 1] = (self.data[word + 1] & !right_mask) | (value << right_shift);
        }
    }
}

impl fmt::Display for StreamingQuotientFilter {
    /// One line per row: the quotient in binary, then the row's buckets.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.quotient_bits as usize;
        for row in 0..self.num_rows {
            writeln!(f, "{row:0width$b}: {}", self.row_to_string(row))?;
        }
        Ok(())
    }
}

fn ceil_log2(n: u32) -> u32 {
    if n <= 1 { 0 } else { 32 - (n - 1).leading_zeros() }
}
