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

//! Snapshots of tracked items with their counts and error bounds.

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::assert::ensure_serial_version_is;
use crate::codec::assert::ensure_type_tag_is;
use crate::codec::assert::insufficient_data;
use crate::codec::family::Family;
use crate::error::Error;
use crate::frequencies::serde::SummaryItem;
use crate::frequencies::serialization::COUNTER_PREAMBLE_BYTES;
use crate::frequencies::serialization::SERIAL_VERSION;

/// A tracked item with its estimated count and error bound.
///
/// The true frequency of the item lies in `[count - error, count]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Counter<T> {
    item: T,
    count: u64,
    error: u64,
}

impl<T> Counter<T> {
    /// Creates a counter snapshot.
    pub fn new(item: T, count: u64, error: u64) -> Self {
        Self { item, count, error }
    }

    /// Returns the item.
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Returns the item, consuming the counter.
    pub fn into_item(self) -> T {
        self.item
    }

    /// Returns the estimated count, which never underestimates the true count.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns the maximum overestimation of [`Counter::count`].
    pub fn error(&self) -> u64 {
        self.error
    }
}

impl<T: SummaryItem> Counter<T> {
    /// Serializes this counter, error bound included.
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = SketchBytes::with_capacity(COUNTER_PREAMBLE_BYTES + 16);
        bytes.write_u8(SERIAL_VERSION);
        bytes.write_u8(Family::COUNTER.id);
        bytes.write_u8(T::ITEM_TYPE as u8);
        bytes.write_u8(0);
        self.item.write_item(&mut bytes);
        bytes.write_u64_le(self.count);
        bytes.write_u64_le(self.error);
        bytes.into_bytes()
    }

    /// Deserializes a counter from bytes.
    pub fn deserialize(bytes: &[u8]) -> Result<Self, Error> {
        let mut cursor = SketchSlice::new(bytes);
        let serial_version = cursor
            .read_u8()
            .map_err(insufficient_data("serial_version"))?;
        let family_id = cursor.read_u8().map_err(insufficient_data("family_id"))?;
        Family::COUNTER.validate_id(family_id)?;
        ensure_serial_version_is(SERIAL_VERSION, serial_version)?;
        let item_type = cursor.read_u8().map_err(insufficient_data("item_type"))?;
        ensure_type_tag_is(T::ITEM_TYPE as u8, item_type)?;
        cursor.read_u8().map_err(insufficient_data("reserved"))?;

        let item = T::read_item(&mut cursor)?;
        let count = cursor.read_u64_le().map_err(insufficient_data("count"))?;
        let error = cursor.read_u64_le().map_err(insufficient_data("error"))?;
        if error > count {
            return Err(Error::deserial("counter error exceeds its count")
                .with_context("count", count)
                .with_context("error", error));
        }
        Ok(Self { item, count, error })
    }
}
