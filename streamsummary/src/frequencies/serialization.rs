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

//! Binary serialization format constants for stream summaries.
//!
//! # Stream Summary Layout (Little Endian)
//!
//! | Byte | Field | Description |
//! |------|-------|-------------|
//! | 0 | serial_version | Serialization version (currently 1) |
//! | 1 | family_id | Family ID (21 for Space-Saving) |
//! | 2 | item_type | [`ItemType`](super::ItemType) tag of the items |
//! | 3 | reserved | Always 0 |
//! | 4-7 | capacity | Maximum number of tracked items |
//! | 8-11 | num_items | Number of entries that follow |
//!
//! Each entry is the encoded item followed by its count as a `u64`. Entries are written in slot
//! order, so replaying them into an empty summary never evicts. Error bounds are not part of this
//! layout.
//!
//! # Counter Layout (Little Endian)
//!
//! | Byte | Field | Description |
//! |------|-------|-------------|
//! | 0 | serial_version | Serialization version (currently 1) |
//! | 1 | family_id | Family ID (22 for Counter) |
//! | 2 | item_type | [`ItemType`](super::ItemType) tag of the item |
//! | 3 | reserved | Always 0 |
//!
//! followed by the encoded item, the count and the error, both as `u64`.

pub(crate) const SERIAL_VERSION: u8 = 1;

/// Bytes ahead of the first summary entry.
pub(crate) const SUMMARY_PREAMBLE_BYTES: usize = 12;
/// Bytes ahead of the counter item.
pub(crate) const COUNTER_PREAMBLE_BYTES: usize = 4;
