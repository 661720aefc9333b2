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

//! Bounded-memory summaries of high-volume item streams.
//!
//! The crate answers "which items occurred most frequently?" with a bounded error using the
//! Space-Saving algorithm, in memory fixed at construction time.
//!
//! * [`frequencies`]: the [`StreamSummary`](frequencies::StreamSummary) top-k table and its
//!   [`Counter`](frequencies::Counter) snapshots.
//! * [`vla`]: sparse arrays and variable-width counters that keep the table compact.
//! * [`membership`]: a streaming quotient filter for approximate duplicate detection.
//!
//! All structures are single-threaded: mutation takes `&mut self` and no operation blocks.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

mod codec;

pub mod error;
pub mod frequencies;
pub mod membership;
pub mod vla;
