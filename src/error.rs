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

//! The single failure mode of this crate: running out of memory.

use core::alloc::Layout;

use thiserror::Error;

/// Shorthand for results whose only failure is an allocation failure.
pub type Result<T, E = OutOfMemory> = core::result::Result<T, E>;

/// Storage for some number of elements could not be obtained.
///
/// This is returned both when the global allocator refuses a request and
/// when the request is too large to describe in the first place (its size in
/// bytes would exceed `isize::MAX`, or the element count overflowed while
/// growing).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("out of memory: cannot allocate storage for {requested} elements")]
pub struct OutOfMemory {
  requested: usize,
  layout: Option<Layout>,
}

impl OutOfMemory {
  /// The allocator refused `layout`, which was sized for `requested` slots.
  pub(crate) fn refused(requested: usize, layout: Layout) -> Self {
    Self {
      requested,
      layout: Some(layout),
    }
  }

  /// A request for `requested` slots could not be expressed as a layout.
  pub(crate) fn overflow(requested: usize) -> Self {
    Self {
      requested,
      layout: None,
    }
  }

  /// Returns the number of element slots that were requested.
  ///
  /// When growing a container overflowed `usize`, this is the capacity that
  /// could not be grown any further.
  pub fn requested(&self) -> usize {
    self.requested
  }

  /// Returns the layout the allocator refused, if the request got that far.
  ///
  /// This is `None` when the size computation itself overflowed.
  pub fn layout(&self) -> Option<Layout> {
    self.layout
  }

  /// Diverges the way `alloc::vec::Vec` does on allocation failure.
  ///
  /// Used by trait impls, like [`Clone`], that have no way to return an
  /// error.
  pub fn handle(self) -> ! {
    match self.layout {
      Some(layout) => alloc::alloc::handle_alloc_error(layout),
      None => panic!("capacity overflow"),
    }
  }
}
