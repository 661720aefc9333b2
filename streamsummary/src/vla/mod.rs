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

//! Variable-length arrays: sparse storage that grows with the data it holds.
//!
//! [`SparseArray`] keeps fixed-width values for a large index space while only paying for the
//! indices that hold a non-zero value. [`VarintCounterArray`] layers adaptive-width counters on
//! top of four sparse arrays, so that small counts cost a byte and only large ones pay for eight.

mod sparse_array;
mod varint_counter_array;
mod width;

pub use self::sparse_array::Pointer;
pub use self::sparse_array::SparseArray;
pub use self::sparse_array::SparseValue;
pub use self::varint_counter_array::VarintCounterArray;
pub use self::width::Width;
