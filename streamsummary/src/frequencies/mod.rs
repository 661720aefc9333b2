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

//! Space-Saving summaries for finding the most frequent items of a stream.
//!
//! # Overview
//!
//! This module implements the Space-Saving algorithm and the Stream-Summary structure from
//! ["Efficient Computation of Frequent and Top-k Elements in Data Streams"](https://doi.org/10.1007/978-3-540-30570-5_27)
//! by Ahmed Metwally, Divyakant Agrawal, and Amr El Abbadi.
//!
//! A [`StreamSummary`] keeps a table of at most `capacity` items and their counts. When an item
//! arrives:
//! * if it is tracked, its count grows by the offered increment;
//! * if it is not tracked and there is room, it takes a new slot;
//! * otherwise it replaces the item with the smallest count, keeping that count.
//!
//! The last rule means the sum of the tracked counts always equals the total weight of the stream.
//!
//! # Accuracy
//!
//! Every tracked count overestimates the true frequency of its item by at most its error bound,
//! which is the count of the evicted item the newcomer replaced. An item whose true frequency
//! exceeds `total_weight / capacity` is guaranteed to be tracked.
//!
//! Instead of the linked bucket lists of the paper, the table is kept in flat arrays: two heaps
//! of slot numbers (one for the top items, one for the eviction victim) and counters of adaptive
//! width from [`crate::vla`].
//!
//! # Examples
//!
//! ```
//! # use streamsummary::frequencies::StreamSummary;
//! let mut summary = StreamSummary::new(5);
//! for item in ["X", "X", "Y", "Z", "A", "B", "C", "X", "X", "A", "C", "A", "A"] {
//!     summary.offer(item.to_string());
//! }
//! assert_eq!(summary.peek(3), vec!["X", "A", "C"]);
//!
//! let top = summary.top_k(1);
//! assert_eq!(top[0].item(), "X");
//! assert_eq!(top[0].count(), 4);
//! ```
//!
//! # Serialization
//!
//! ```
//! # use streamsummary::frequencies::StreamSummary;
//! let mut summary = StreamSummary::<i64>::new(16);
//! summary.offer_with_count(42, 7);
//!
//! let bytes = summary.serialize();
//! let decoded = StreamSummary::<i64>::deserialize(&bytes).unwrap();
//! assert_eq!(decoded.estimate(&42), 7);
//! ```

mod counter;
mod indexed_heap;
mod serde;
mod serialization;
mod summary;

pub use self::counter::Counter;
pub use self::serde::ItemType;
pub use self::serde::SummaryItem;
pub use self::summary::Offer;
pub use self::summary::StreamSummary;
