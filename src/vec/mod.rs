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

//! A growable array with manually managed storage.
//!
//! [`Vec<T>`] looks like the standard library's `Vec`, but its storage is
//! managed in the open:
//! - Storage comes from a [`RawAllocator`] as raw, uninitialized slots; only
//!   the first [`len()`] of them hold live values.
//! - Growth doubles the capacity, starting at one slot, and relocates the
//!   live values with [`construct::move_construct()`].
//! - Elements can be built directly in their slot with
//!   [`Vec::emplace_back()`].
//! - Copying ([`Vec::try_clone()`], [`Vec::copy_from()`]) and moving
//!   ([`Vec::take()`], [`Vec::move_from()`]) are explicit operations. Every
//!   operation that may allocate reports failure as an [`OutOfMemory`]
//!   instead of aborting.
//!
//! [`len()`]: Vec::len

use core::borrow::Borrow;
use core::fmt;
use core::marker::PhantomData;
use core::mem;
use core::mem::MaybeUninit;
use core::ops::Deref;
use core::ops::DerefMut;
use core::ops::Index;
use core::ops::IndexMut;
use core::ptr;
use core::slice;
use core::slice::SliceIndex;

use crate::construct;
use crate::error::OutOfMemory;
use crate::error::Result;
use crate::new;
use crate::new::New;
use crate::raw_alloc::RawAllocator;
use crate::raw_alloc::RawRegion;


/// A contiguous growable array type whose storage is allocated separately
/// from its elements.
///
/// Compare [`alloc::vec::Vec`].
pub struct Vec<T> {
  // Slots `[0, len)` are live; slots `[len, buf.capacity())` are raw.
  buf: RawRegion<T>,
  len: usize,
  allocator: RawAllocator<T>,

  // `buf` is only a handle; this tells drop check that we own `T`s.
  _ph: PhantomData<T>,
}

// SAFETY: A Vec<T> owns its elements and its storage outright, exactly like
// alloc::vec::Vec<T>.
unsafe impl<T: Send> Send for Vec<T> {}
unsafe impl<T: Sync> Sync for Vec<T> {}

impl<T> Vec<T> {
  /// The capacity of the first allocation an empty vector makes.
  pub const INITIAL_CAPACITY: usize = 1;

  /// The factor the capacity is multiplied by each time the vector grows.
  pub const GROWTH_FACTOR: usize = 2;

  /// Constructs a new, empty `Vec<T>`. This does not allocate.
  ///
  /// Compare [`alloc::vec::Vec::new()`].
  pub const fn new() -> Self {
    Self {
      buf: RawRegion::empty(),
      len: 0,
      allocator: RawAllocator::new(),
      _ph: PhantomData,
    }
  }

  /// Constructs a new, empty `Vec<T>` with room for exactly `capacity`
  /// elements.
  ///
  /// Compare [`alloc::vec::Vec::with_capacity()`].
  pub fn with_capacity(capacity: usize) -> Result<Self> {
    let allocator = RawAllocator::new();
    let buf = allocator.allocate(capacity)?;
    Ok(Self {
      buf,
      len: 0,
      allocator,
      _ph: PhantomData,
    })
  }

  /// Moves the contents of `self` into a new vector, leaving `self` empty.
  ///
  /// No allocation or element copying happens: the storage itself changes
  /// hands. `self` holds no storage afterwards and can be reused.
  ///
  /// ```
  /// # use growvec::Vec;
  /// let mut a = Vec::new();
  /// a.push_back(1)?;
  ///
  /// let b = a.take();
  /// assert_eq!(b, [1]);
  /// assert_eq!((a.len(), a.capacity()), (0, 0));
  /// # Ok::<(), growvec::OutOfMemory>(())
  /// ```
  pub fn take(&mut self) -> Self {
    mem::take(self)
  }

  /// Replaces the contents of `self` with those of `other`, leaving `other`
  /// empty.
  ///
  /// `self`'s previous elements are destroyed and its storage released.
  pub fn move_from(&mut self, other: &mut Self) {
    *self = other.take();
  }

  /// Returns the number of live elements in the vector.
  ///
  /// Compare [`alloc::vec::Vec::len()`].
  pub fn len(&self) -> usize {
    self.len
  }

  /// Returns `true` if the vector contains no elements.
  ///
  /// Compare [`alloc::vec::Vec::is_empty()`].
  pub fn is_empty(&self) -> bool {
    self.len == 0
  }

  /// Returns the number of elements the vector can hold without reallocating.
  ///
  /// Compare [`alloc::vec::Vec::capacity()`].
  pub fn capacity(&self) -> usize {
    self.buf.capacity()
  }

  /// Extracts a slice containing the entire vector.
  ///
  /// Compare [`alloc::vec::Vec::as_slice()`].
  pub fn as_slice(&self) -> &[T] {
    unsafe { slice::from_raw_parts(self.buf.as_ptr(), self.len) }
  }

  /// Extracts a mutable slice of the entire vector.
  ///
  /// Compare [`alloc::vec::Vec::as_mut_slice()`].
  pub fn as_mut_slice(&mut self) -> &mut [T] {
    unsafe { slice::from_raw_parts_mut(self.buf.as_ptr(), self.len) }
  }

  /// Returns a raw pointer to the vector's storage.
  ///
  /// The pointer is dangling while the vector has no storage.
  pub fn as_ptr(&self) -> *const T {
    self.buf.as_ptr()
  }

  /// Returns a reference to the element at `index`, without bounds checks.
  ///
  /// Indexing with `v[index]` checks the bounds and panics instead.
  ///
  /// # Safety
  ///
  /// `index` must be less than `len()`.
  pub unsafe fn get_unchecked(&self, index: usize) -> &T {
    debug_assert!(index < self.len);
    &*self.buf.as_ptr().add(index)
  }

  /// Returns a mutable reference to the element at `index`, without bounds
  /// checks.
  ///
  /// # Safety
  ///
  /// `index` must be less than `len()`.
  pub unsafe fn get_unchecked_mut(&mut self, index: usize) -> &mut T {
    debug_assert!(index < self.len);
    &mut *self.buf.as_ptr().add(index)
  }

  /// Appends `value` to the back of the vector, growing it first if it is
  /// full.
  ///
  /// The value is moved in. To append a copy of something the caller keeps,
  /// pass `x.clone()` or use `emplace_back(new::copy(&x))`.
  ///
  /// If growing fails, `value` is dropped and the vector is left exactly as
  /// it was.
  ///
  /// Compare [`alloc::vec::Vec::push()`].
  pub fn push_back(&mut self, value: T) -> Result<()> {
    self.emplace_back(new::of(value))
  }

  /// Appends an element to the back of the vector, constructed in place by
  /// `value`.
  ///
  /// If growing fails, `value` is never run and the vector is left exactly as
  /// it was. If `value` itself panics, the vector is unchanged apart from any
  /// growth that already happened.
  ///
  /// ```
  /// # use growvec::{new, Vec};
  /// let mut v = Vec::<String>::new();
  /// v.emplace_back(new::from_fn(|| "ab".repeat(2)))?;
  /// assert_eq!(v[0], "abab");
  /// # Ok::<(), growvec::OutOfMemory>(())
  /// ```
  pub fn emplace_back(&mut self, value: impl New<Output = T>) -> Result<()> {
    if self.len == self.capacity() {
      self.grow()?;
    }

    unsafe {
      value.new(self.buf.slot(self.len));
    }
    self.len += 1;
    Ok(())
  }

  /// Destroys every element, keeping the storage for reuse.
  ///
  /// Compare [`alloc::vec::Vec::clear()`].
  pub fn clear(&mut self) {
    // Forget the elements first, so that a panicking destructor cannot lead
    // to them being destroyed again.
    let live = ptr::slice_from_raw_parts_mut(self.buf.as_ptr(), self.len);
    self.len = 0;
    if mem::needs_drop::<T>() {
      unsafe { ptr::drop_in_place(live) }
    }
  }

  /// Returns the raw slots past the last live element.
  fn spare_capacity_mut(&mut self) -> &mut [MaybeUninit<T>] {
    unsafe {
      slice::from_raw_parts_mut(
        self.buf.as_ptr().add(self.len).cast::<MaybeUninit<T>>(),
        self.capacity() - self.len,
      )
    }
  }

  /// Returns the capacity the next growth step will ask for.
  fn next_capacity(&self) -> Result<usize> {
    match self.capacity() {
      0 => Ok(Self::INITIAL_CAPACITY),
      cap => cap
        .checked_mul(Self::GROWTH_FACTOR)
        .ok_or_else(|| OutOfMemory::overflow(cap)),
    }
  }

  /// Replaces the storage with one `GROWTH_FACTOR` times larger.
  ///
  /// Nothing about `self` changes unless the new storage was obtained.
  fn grow(&mut self) -> Result<()> {
    let new_cap = self.next_capacity()?;
    let new_buf = self.allocator.allocate(new_cap)?;

    // The old slots are raw once their values have been relocated, so the
    // old storage is released without running any destructors.
    unsafe {
      construct::move_construct(self.buf.as_ptr(), self.len, new_buf.as_ptr());
    }
    let old = mem::replace(&mut self.buf, new_buf);
    trace!("grew from {} to {} slots", old.capacity(), new_cap);
    self.allocator.deallocate(old);
    Ok(())
  }

  /// Swaps in freshly allocated storage of exactly `capacity` slots,
  /// destroying every element and releasing the old storage.
  ///
  /// On failure, `self` is untouched.
  fn reallocate_empty(&mut self, capacity: usize) -> Result<()> {
    let new_buf = self.allocator.allocate(capacity)?;
    self.clear();
    let old = mem::replace(&mut self.buf, new_buf);
    self.allocator.deallocate(old);
    Ok(())
  }
}

impl<T: Clone> Vec<T> {
  /// Returns an independent copy of `self`.
  ///
  /// The copy's capacity is exactly `self.len()`; copying an empty vector
  /// does not allocate.
  ///
  /// ```
  /// # use growvec::Vec;
  /// let mut a = Vec::new();
  /// a.push_back(String::from("x"))?;
  ///
  /// let mut b = a.try_clone()?;
  /// b[0].push('y');
  /// assert_eq!((a[0].as_str(), b[0].as_str()), ("x", "xy"));
  /// # Ok::<(), growvec::OutOfMemory>(())
  /// ```
  pub fn try_clone(&self) -> Result<Self> {
    let mut copy = Self::with_capacity(self.len)?;
    construct::copy_construct(self.as_slice(), copy.spare_capacity_mut());
    copy.len = self.len;
    Ok(copy)
  }

  /// Replaces the contents of `self` with copies of `other`'s elements.
  ///
  /// `self`'s previous elements are always destroyed before anything is
  /// copied into their slots. The existing storage is reused if it can hold
  /// `other.len()` elements; otherwise storage of exactly that size is
  /// allocated first, so that on failure `self` is left untouched.
  ///
  /// If an element's `clone()` panics, `self` is left empty.
  pub fn copy_from(&mut self, other: &Self) -> Result<()> {
    if self.capacity() < other.len {
      self.reallocate_empty(other.len)?;
    } else {
      self.clear();
    }

    construct::copy_construct(other.as_slice(), self.spare_capacity_mut());
    self.len = other.len;
    Ok(())
  }
}

// "Load bearing" trait impls.

impl<T> Drop for Vec<T> {
  fn drop(&mut self) {
    // Releases the storage even if an element's destructor unwinds.
    struct Release<'a, T>(&'a mut Vec<T>);

    impl<T> Drop for Release<'_, T> {
      fn drop(&mut self) {
        let buf = mem::replace(&mut self.0.buf, RawRegion::empty());
        self.0.allocator.deallocate(buf);
      }
    }

    let release = Release(self);
    release.0.clear();
  }
}

impl<T: Clone> Clone for Vec<T> {
  fn clone(&self) -> Self {
    self.try_clone().unwrap_or_else(|e| e.handle())
  }

  fn clone_from(&mut self, source: &Self) {
    if let Err(e) = self.copy_from(source) {
      e.handle()
    }
  }
}

impl<T> Deref for Vec<T> {
  type Target = [T];
  fn deref(&self) -> &[T] {
    self.as_slice()
  }
}

impl<T> DerefMut for Vec<T> {
  fn deref_mut(&mut self) -> &mut [T] {
    self.as_mut_slice()
  }
}

impl<T, I: SliceIndex<[T]>> Index<I> for Vec<T> {
  type Output = I::Output;
  fn index(&self, index: I) -> &I::Output {
    Index::index(self.as_slice(), index)
  }
}

impl<T, I: SliceIndex<[T]>> IndexMut<I> for Vec<T> {
  fn index_mut(&mut self, index: I) -> &mut I::Output {
    IndexMut::index_mut(self.as_mut_slice(), index)
  }
}

// "QOL" trait impls.

impl<T> AsRef<[T]> for Vec<T> {
  fn as_ref(&self) -> &[T] {
    self.as_slice()
  }
}

impl<T> Borrow<[T]> for Vec<T> {
  fn borrow(&self) -> &[T] {
    self.as_slice()
  }
}

impl<T: fmt::Debug> fmt::Debug for Vec<T> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    self.as_slice().fmt(f)
  }
}

impl<T> Default for Vec<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: PartialEq<U>, U> PartialEq<Vec<U>> for Vec<T> {
  fn eq(&self, other: &Vec<U>) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl<T: PartialEq<U>, U> PartialEq<[U]> for Vec<T> {
  fn eq(&self, other: &[U]) -> bool {
    self.as_slice() == other
  }
}

impl<T: PartialEq<U>, U> PartialEq<&[U]> for Vec<T> {
  fn eq(&self, other: &&[U]) -> bool {
    self.as_slice() == *other
  }
}

impl<T: PartialEq<U>, U, const N: usize> PartialEq<[U; N]> for Vec<T> {
  fn eq(&self, other: &[U; N]) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl<T: PartialEq<U>, U> PartialEq<alloc::vec::Vec<U>> for Vec<T> {
  fn eq(&self, other: &alloc::vec::Vec<U>) -> bool {
    self.as_slice() == other.as_slice()
  }
}

impl<T: Eq> Eq for Vec<T> {}
