// Copyright 2021 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A growable, contiguous array that keeps allocation separate from
//! construction.
//!
//! The crate is split along the same seams a C++ `std::vector` is:
//! - [`raw_alloc`] hands out and takes back raw, uninitialized storage sized
//!   for some number of `T`s, and never runs constructors or destructors.
//! - [`construct`] fills raw storage from existing elements, either by
//!   copying them or by relocating them.
//! - [`new`] provides in-place constructors, so that a value can be built
//!   directly inside the container's storage.
//! - [`Vec`] owns one storage region and decides when to grow it, what is
//!   live, and what gets destroyed.
//!
//! ```
//! use growvec::{new, Vec};
//!
//! let mut v = Vec::new();
//! for i in 0..5 {
//!   v.push_back(format!("test{}", i))?;
//! }
//! v.emplace_back(new::from("asd"))?;
//!
//! assert_eq!(v.len(), 6);
//! assert_eq!(v.capacity(), 8);
//! assert_eq!(v[5], "asd");
//! # Ok::<(), growvec::OutOfMemory>(())
//! ```
//!
//! Growth doubles the capacity, starting from one slot, so the capacities
//! observed while pushing into an empty vector are `1, 2, 4, 8, ...`.

#![no_std]
#![deny(missing_docs)]

extern crate alloc;

#[macro_use]
extern crate log;

#[cfg(test)]
#[macro_use]
extern crate std;

pub mod construct;
pub mod error;
pub mod new;
pub mod raw_alloc;
pub mod vec;

#[cfg(test)]
mod test_util;

pub use crate::error::OutOfMemory;
pub use crate::error::Result;
pub use crate::new::New;
pub use crate::raw_alloc::RawAllocator;
pub use crate::raw_alloc::RawRegion;
pub use crate::vec::Vec;
