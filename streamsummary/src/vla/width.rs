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

//! Width classes of variable-width counters and their 2-bit packing.

const TAGS_PER_WORD: usize = 32;

/// Storage width class of a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Width {
    /// Values up to `0xFF`.
    W8 = 0,
    /// Values up to `0xFFFF`.
    W16 = 1,
    /// Values up to `0xFFFF_FFFE`.
    ///
    /// `0xFFFF_FFFF` itself is stored at [`Width::W64`]. This matches the layout of existing
    /// counter images and is kept as a defined boundary.
    W32 = 2,
    /// Any `u64` value.
    W64 = 3,
}

impl Width {
    /// Returns the largest value stored at this width.
    pub const fn limit(self) -> u64 {
        match self {
            Width::W8 => 0xFF,
            Width::W16 => 0xFFFF,
            Width::W32 => 0xFFFF_FFFE,
            Width::W64 => u64::MAX,
        }
    }

    /// Returns the smallest width whose limit admits `value`.
    pub const fn fitting(value: u64) -> Width {
        if value <= Width::W8.limit() {
            Width::W8
        } else if value <= Width::W16.limit() {
            Width::W16
        } else if value <= Width::W32.limit() {
            Width::W32
        } else {
            Width::W64
        }
    }

    const fn from_code(code: u64) -> Width {
        match code & 3 {
            0 => Width::W8,
            1 => Width::W16,
            2 => Width::W32,
            _ => Width::W64,
        }
    }
}

/// [`Width`] tags packed two bits per index.
///
/// Words are allocated up to the highest index tagged wider than [`Width::W8`]; every index past
/// them reads as [`Width::W8`].
#[derive(Debug, Clone, Default)]
pub(crate) struct WidthTags {
    codes: Vec<u64>,
}

impl WidthTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: usize) -> Width {
        let (word, shift) = split_index(index);
        self.codes
            .get(word)
            .map_or(Width::W8, |&code| Width::from_code(code >> shift))
    }

    pub fn set(&mut self, index: usize, width: Width) {
        let (word, shift) = split_index(index);
        if word >= self.codes.len() {
            if width == Width::W8 {
                return;
            }
            self.codes.resize(word + 1, 0);
        }
        self.codes[word] = (self.codes[word] & !(3u64 << shift)) | ((width as u64) << shift);
    }

    pub fn bytes_used(&self) -> usize {
        self.codes.len() * size_of::<u64>()
    }
}

#[inline]
fn split_index(index: usize) -> (usize, u32) {
    (index / TAGS_PER_WORD, 2 * (index % TAGS_PER_WORD) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fitting_boundaries() {
        assert_eq!(Width::fitting(0), Width::W8);
        assert_eq!(Width::fitting(0xFF), Width::W8);
        assert_eq!(Width::fitting(0x100), Width::W16);
        assert_eq!(Width::fitting(0xFFFF), Width::W16);
        assert_eq!(Width::fitting(0x1_0000), Width::W32);
        assert_eq!(Width::fitting(0xFFFF_FFFE), Width::W32);
        assert_eq!(Width::fitting(0xFFFF_FFFF), Width::W64);
        assert_eq!(Width::fitting(u64::MAX), Width::W64);
    }

    #[test]
    fn test_tags_do_not_disturb_neighbours() {
        let mut tags = WidthTags::new();
        let widths = [Width::W64, Width::W16, Width::W32, Width::W8];
        for i in 0..100 {
            tags.set(i, widths[i % 4]);
        }
        tags.set(31, Width::W64);
        tags.set(32, Width::W8);
        for i in 0..100 {
            let expected = match i {
                31 => Width::W64,
                32 => Width::W8,
                _ => widths[i % 4],
            };
            assert_eq!(tags.get(i), expected, "index {i}");
        }
    }

    #[test]
    fn test_tags_grow_on_demand() {
        let mut tags = WidthTags::new();
        tags.set(1_000_000, Width::W8);
        assert_eq!(tags.bytes_used(), 0);
        tags.set(100, Width::W32);
        assert_eq!(tags.bytes_used(), (100 / TAGS_PER_WORD + 1) * size_of::<u64>());
        assert_eq!(tags.get(100), Width::W32);
        assert_eq!(tags.get(99), Width::W8);
        assert_eq!(tags.get(1_000_000), Width::W8);
    }
}
