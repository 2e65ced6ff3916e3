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

//! Raw storage management.
//!
//! A [`RawAllocator`] deals purely in memory: it hands out [`RawRegion`]s
//! sized for some number of `T`s, and takes them back. It never constructs or
//! destroys a `T`; keeping track of which slots hold live values is the
//! caller's job. This is what lets a container grow its capacity without
//! having to produce values for the slots it is not using yet.

use core::alloc::Layout;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::mem::MaybeUninit;
use core::ptr::NonNull;

use crate::error::OutOfMemory;
use crate::error::Result;

/// A region of uninitialized storage with room for `capacity()` values of
/// type `T`.
///
/// A region is only a handle: dropping it does not free anything. It must be
/// given back to [`RawAllocator::deallocate()`], after any values that were
/// constructed in it have been destroyed.
///
/// The empty region has a capacity of zero and a dangling pointer; it is what
/// the allocator hands out for zero-slot requests.
pub struct RawRegion<T> {
  ptr: NonNull<T>,
  capacity: usize,
}

impl<T> RawRegion<T> {
  /// Returns the empty region, which owns no memory.
  pub const fn empty() -> Self {
    Self {
      ptr: NonNull::dangling(),
      capacity: 0,
    }
  }

  /// Returns the number of `T` slots in this region.
  pub fn capacity(&self) -> usize {
    self.capacity
  }

  /// Returns whether this is the empty region.
  pub fn is_empty(&self) -> bool {
    self.capacity == 0
  }

  /// Returns a pointer to the first slot.
  ///
  /// The pointer is dangling (but aligned) for the empty region and for
  /// zero-sized `T`.
  pub fn as_ptr(&self) -> *mut T {
    self.ptr.as_ptr()
  }

  /// Returns the uninitialized slot at `idx`, without bounds checks.
  ///
  /// # Safety
  ///
  /// `idx` must be less than `capacity()`, and the slot must not currently be
  /// borrowed elsewhere. If the slot holds a live value, writing to it will
  /// leak that value.
  #[allow(clippy::mut_from_ref)]
  pub unsafe fn slot(&self, idx: usize) -> &mut MaybeUninit<T> {
    debug_assert!(idx < self.capacity);
    &mut *self.ptr.as_ptr().add(idx).cast::<MaybeUninit<T>>()
  }
}

impl<T> fmt::Debug for RawRegion<T> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.debug_struct("RawRegion")
      .field("ptr", &self.ptr)
      .field("capacity", &self.capacity)
      .finish()
  }
}

/// Acquires and releases [`RawRegion`]s through the global allocator.
///
/// The allocator is stateless; it exists as a value so that each container
/// owns the thing it allocates through.
pub struct RawAllocator<T> {
  _ph: PhantomData<fn() -> T>,
}

impl<T> RawAllocator<T> {
  /// Creates a new allocator.
  pub const fn new() -> Self {
    Self { _ph: PhantomData }
  }

  /// Allocates uninitialized storage for `n` values of type `T`.
  ///
  /// A request for zero slots returns [`RawRegion::empty()`]. For zero-sized
  /// `T` no memory is requested at all, but the region still reports a
  /// capacity of `n`.
  ///
  /// On failure nothing is allocated and an [`OutOfMemory`] describing the
  /// request is returned.
  pub fn allocate(&self, n: usize) -> Result<RawRegion<T>> {
    if n == 0 {
      return Ok(RawRegion::empty());
    }

    let layout = Layout::array::<T>(n).map_err(|_| {
      debug!("layout for {} x {} bytes overflows", n, mem::size_of::<T>());
      OutOfMemory::overflow(n)
    })?;

    if injected_failure() {
      debug!("injected allocation failure for {} slots", n);
      return Err(OutOfMemory::refused(n, layout));
    }

    if layout.size() == 0 {
      return Ok(RawRegion {
        ptr: NonNull::dangling(),
        capacity: n,
      });
    }

    // SAFETY: `layout` has a non-zero size.
    let ptr = unsafe { alloc::alloc::alloc(layout) };
    let Some(ptr) = NonNull::new(ptr.cast::<T>()) else {
      debug!("allocator refused {} bytes for {} slots", layout.size(), n);
      return Err(OutOfMemory::refused(n, layout));
    };

    trace!("allocated {} slots ({} bytes) at {:p}", n, layout.size(), ptr);
    note_region(true);
    Ok(RawRegion { ptr, capacity: n })
  }

  /// Releases a region previously returned by [`RawAllocator::allocate()`].
  ///
  /// No destructors are run: every value constructed in `region` must already
  /// have been destroyed or moved out. Releasing the empty region does
  /// nothing.
  pub fn deallocate(&self, region: RawRegion<T>) {
    let size = mem::size_of::<T>() * region.capacity;
    if size == 0 {
      return;
    }

    // SAFETY: `allocate()` built a layout of exactly this size and alignment
    // for this region, so it is known not to overflow.
    let layout =
      unsafe { Layout::from_size_align_unchecked(size, mem::align_of::<T>()) };
    trace!("releasing {} slots at {:p}", region.capacity, region.ptr);
    unsafe {
      alloc::alloc::dealloc(region.ptr.as_ptr().cast::<u8>(), layout);
    }
    note_region(false);
  }
}

impl<T> Clone for RawAllocator<T> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<T> Copy for RawAllocator<T> {}

impl<T> Default for RawAllocator<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T> fmt::Debug for RawAllocator<T> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    f.write_str("RawAllocator")
  }
}

#[cfg(test)]
fn injected_failure() -> bool {
  inject::should_fail()
}

#[cfg(not(test))]
#[inline(always)]
fn injected_failure() -> bool {
  false
}

#[cfg(test)]
fn note_region(allocated: bool) {
  inject::note_region(allocated)
}

#[cfg(not(test))]
#[inline(always)]
fn note_region(_allocated: bool) {}

/// Allocation-failure injection and region accounting for tests.
#[cfg(test)]
pub(crate) mod inject {
  use core::cell::Cell;
  use core::marker::PhantomData;

  thread_local! {
    static REMAINING: Cell<Option<usize>> = const { Cell::new(None) };
    static LIVE_REGIONS: Cell<usize> = const { Cell::new(0) };
  }

  /// Returns how many regions backed by real memory this thread currently
  /// holds.
  pub fn live_regions() -> usize {
    LIVE_REGIONS.with(|c| c.get())
  }

  pub(super) fn note_region(allocated: bool) {
    LIVE_REGIONS.with(|c| {
      let n = c.get();
      c.set(if allocated {
        n + 1
      } else {
        n.checked_sub(1).expect("region released twice")
      });
    })
  }

  /// Makes every allocation on this thread fail once `successes` more
  /// allocations have gone through. Injection stops when the guard drops.
  pub fn fail_after(successes: usize) -> FailGuard {
    REMAINING.with(|r| r.set(Some(successes)));
    FailGuard(PhantomData)
  }

  pub(super) fn should_fail() -> bool {
    REMAINING.with(|r| match r.get() {
      None => false,
      Some(0) => true,
      Some(n) => {
        r.set(Some(n - 1));
        false
      }
    })
  }

  pub struct FailGuard(PhantomData<*mut u8>);

  impl Drop for FailGuard {
    fn drop(&mut self) {
      REMAINING.with(|r| r.set(None));
    }
  }
}
