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

//! Filling raw storage from existing elements.
//!
//! Both helpers treat their destination as raw storage: nothing in it is
//! read or destroyed, and whatever they write there becomes the caller's to
//! track.

use core::mem::MaybeUninit;
use core::ptr;
use core::slice;

/// Copy-constructs every element of `src` into the front of `dest`, in index
/// order, leaving `src` untouched.
///
/// If a `clone()` panics, the elements already constructed in `dest` are
/// destroyed before the panic continues, so `dest` is back to raw storage.
///
/// # Panics
///
/// Panics if `dest` is shorter than `src`.
pub fn copy_construct<T: Clone>(src: &[T], dest: &mut [MaybeUninit<T>]) {
  assert!(
    dest.len() >= src.len(),
    "copy destination holds {} slots, source has {} elements",
    dest.len(),
    src.len()
  );

  // Destroys the constructed prefix of `dest` if a clone unwinds.
  struct Partial<'a, T> {
    dest: &'a mut [MaybeUninit<T>],
    done: usize,
  }

  impl<T> Drop for Partial<'_, T> {
    fn drop(&mut self) {
      unsafe {
        let base = self.dest.as_mut_ptr().cast::<T>();
        ptr::drop_in_place(slice::from_raw_parts_mut(base, self.done));
      }
    }
  }

  let mut partial = Partial { dest, done: 0 };
  for (i, val) in src.iter().enumerate() {
    partial.dest[i].write(val.clone());
    partial.done += 1;
  }
  partial.done = 0;
}

/// Move-constructs `count` elements from `src` into `dest`, in index order.
///
/// Afterwards the `count` source slots are in the moved-from state: they are
/// raw storage again, and must be neither read nor destroyed.
///
/// # Safety
///
/// - `src` must point to `count` live values.
/// - `dest` must point to at least `count` slots of raw storage.
/// - The two ranges must not overlap.
pub unsafe fn move_construct<T>(src: *const T, count: usize, dest: *mut T) {
  ptr::copy_nonoverlapping(src, dest, count);
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::mem::ManuallyDrop;
  use std::panic;
  use std::string::String;
  use std::string::ToString;
  use std::vec::Vec as StdVec;

  use crate::test_util::LeakCheck;
  use crate::test_util::Tracked;

  fn uninit<T>(n: usize) -> StdVec<MaybeUninit<T>> {
    (0..n).map(|_| MaybeUninit::uninit()).collect()
  }

  #[test]
  fn copy_strings() {
    let src = ["a", "bc", "def"].map(String::from);
    let mut dest = uninit::<String>(4);
    copy_construct(&src, &mut dest);

    let copied = unsafe {
      (0..3).map(|i| dest[i].assume_init_read()).collect::<StdVec<_>>()
    };
    assert_eq!(copied, src);
    assert_eq!(src[2], "def");
  }

  #[test]
  #[should_panic(expected = "copy destination holds 1 slots")]
  fn copy_into_short_dest() {
    let mut dest = uninit::<u8>(1);
    copy_construct(&[1, 2], &mut dest);
  }

  #[test]
  fn copy_panic_destroys_prefix() {
    let _lc = LeakCheck::start();

    let src = (0..4).map(Tracked::new).collect::<StdVec<_>>();
    src[2].poison_clone();

    let mut dest = uninit::<Tracked<i32>>(4);
    let res = panic::catch_unwind(panic::AssertUnwindSafe(|| {
      copy_construct(&src, &mut dest);
    }));
    assert!(res.is_err());
    // The two clones made before the panic have already been destroyed;
    // dropping `src` brings the count back to zero.
    drop(src);
    LeakCheck::check();
  }

  #[test]
  fn move_relocates() {
    let src = ManuallyDrop::new(
      (0..5).map(|i| i.to_string()).collect::<StdVec<String>>(),
    );
    let mut dest = uninit::<String>(5);
    unsafe {
      move_construct(src.as_ptr(), src.len(), dest.as_mut_ptr().cast());
    }

    // `src`'s elements are moved-from; only its buffer is released.
    let mut src = ManuallyDrop::into_inner(src);
    unsafe { src.set_len(0) };

    for (i, s) in dest.iter().enumerate() {
      assert_eq!(unsafe { s.assume_init_ref() }, &i.to_string());
    }
    for s in &mut dest {
      unsafe { s.assume_init_drop() };
    }
  }
}
