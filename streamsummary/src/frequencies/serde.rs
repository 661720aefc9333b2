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

//! Item codecs for stream summary serialization.

use std::hash::Hash;

use crate::codec::SketchBytes;
use crate::codec::SketchSlice;
use crate::codec::assert::insufficient_data;
use crate::error::Error;

/// Serialized representation of the items of a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ItemType {
    /// Length-prefixed UTF-8 strings.
    String = 0,
    /// 32-bit signed integers.
    I32 = 1,
    /// 64-bit signed integers.
    I64 = 2,
}

pub(crate) mod private {
    use super::*;

    // Sealed trait that also carries the item codec, so the codec types stay crate-private.
    pub trait Sealed: Sized {
        fn write_item(&self, bytes: &mut SketchBytes);

        fn read_item(slice: &mut SketchSlice<'_>) -> Result<Self, Error>;

        /// Smallest number of bytes one encoded item occupies.
        const MIN_ENCODED_LEN: usize;
    }
}

/// Item type that a [`StreamSummary`](crate::frequencies::StreamSummary) or
/// [`Counter`](crate::frequencies::Counter) can be serialized with.
pub trait SummaryItem: private::Sealed + Eq + Hash + Clone {
    /// Type tag written ahead of the items.
    const ITEM_TYPE: ItemType;
}

impl private::Sealed for String {
    const MIN_ENCODED_LEN: usize = 4;

    fn write_item(&self, bytes: &mut SketchBytes) {
        bytes.write_u32_le(self.len() as u32);
        bytes.write(self.as_bytes());
    }

    fn read_item(slice: &mut SketchSlice<'_>) -> Result<Self, Error> {
        let len = slice
            .read_u32_le()
            .map_err(insufficient_data("string length"))? as usize;
        if len > slice.remaining() {
            return Err(Error::insufficient_data("string payload").with_context("length", len));
        }
        let mut payload = vec![0u8; len];
        slice
            .read_exact(&mut payload)
            .map_err(insufficient_data("string payload"))?;
        String::from_utf8(payload)
            .map_err(|err| Error::deserial("invalid UTF-8 string payload").set_source(err))
    }
}

impl SummaryItem for String {
    const ITEM_TYPE: ItemType = ItemType::String;
}

impl private::Sealed for i32 {
    const MIN_ENCODED_LEN: usize = 4;

    fn write_item(&self, bytes: &mut SketchBytes) {
        bytes.write_i32_le(*self);
    }

    fn read_item(slice: &mut SketchSlice<'_>) -> Result<Self, Error> {
        slice.read_i32_le().map_err(insufficient_data("i32 item"))
    }
}

impl SummaryItem for i32 {
    const ITEM_TYPE: ItemType = ItemType::I32;
}

impl private::Sealed for i64 {
    const MIN_ENCODED_LEN: usize = 8;

    fn write_item(&self, bytes: &mut SketchBytes) {
        bytes.write_i64_le(*self);
    }

    fn read_item(slice: &mut SketchSlice<'_>) -> Result<Self, Error> {
        slice.read_i64_le().map_err(insufficient_data("i64 item"))
    }
}

impl SummaryItem for i64 {
    const ITEM_TYPE: ItemType = ItemType::I64;
}
