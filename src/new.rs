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

//! In-place constructors.
//!
//! A [`New`] is a deferred construction: it holds whatever arguments it needs
//! and, when handed an uninitialized slot, writes a fully-constructed value
//! into it. This is what [`Vec::emplace_back()`] consumes, and it is how an
//! arbitrary argument list reaches a constructor without first building a
//! temporary somewhere else: capture the arguments in a closure and pass it to
//! [`new::from_fn()`].
//!
//! It is preferred style to `use growvec::new;` and refer to these helpers
//! with a `new::` prefix.
//!
//! ```
//! use growvec::{new, Vec};
//!
//! struct Point {
//!   x: i32,
//!   y: i32,
//! }
//!
//! let mut points = Vec::new();
//! points.emplace_back(new::from_fn(|| Point { x: 1, y: 2 }))?;
//!
//! let origin = Point { x: 0, y: 0 };
//! points.push_back(origin)?;
//!
//! assert_eq!(points[0].x + points[0].y, 3);
//! assert_eq!(points[1].y, 0);
//! # Ok::<(), growvec::OutOfMemory>(())
//! ```
//!
//! [`Vec::emplace_back()`]: crate::Vec::emplace_back
//! [`new::from_fn()`]: from_fn

use core::marker::PhantomData;
use core::mem::MaybeUninit;

/// An in-place constructor for a particular type.
///
/// # Safety
///
/// [`New::new()`] must leave its destination argument in a valid, initialized
/// state whenever it returns normally.
#[must_use = "`New`s do nothing until emplaced into storage"]
pub unsafe trait New: Sized {
  /// The type to construct.
  type Output;
  /// Construct a new value in `dest` using the arguments stored in `self`.
  ///
  /// # Safety
  ///
  /// `dest` must be raw storage: whatever it held before is overwritten
  /// without being destroyed.
  unsafe fn new(self, dest: &mut MaybeUninit<Self::Output>);
}

/// Returns a new `New` that uses the provided closure for construction.
///
/// # Safety
///
/// `f` must respect the safety requirements of [`New`], since it is used
/// as an implementation basis.
#[inline]
pub unsafe fn from_placement_fn<T, F>(f: F) -> impl New<Output = T>
where
  F: FnOnce(&mut MaybeUninit<T>),
{
  struct FnNew<F, T> {
    f: F,
    _ph: PhantomData<fn(T)>,
  }
  unsafe impl<F, T> New for FnNew<F, T>
  where
    F: FnOnce(&mut MaybeUninit<T>),
  {
    type Output = T;
    #[inline]
    unsafe fn new(self, dest: &mut MaybeUninit<Self::Output>) {
      (self.f)(dest)
    }
  }

  FnNew::<F, T> {
    f,
    _ph: PhantomData,
  }
}

/// Returns a new `New` that uses the provided closure for constructing a
/// `T`.
///
/// ```
/// # use growvec::{new, Vec};
/// let mut v = Vec::<(i32, char)>::new();
/// v.emplace_back(new::from_fn(|| (21 * 2, 'x')))?;
/// assert_eq!(v[0], (42, 'x'));
/// # Ok::<(), growvec::OutOfMemory>(())
/// ```
#[inline]
pub fn from_fn<T, F>(f: F) -> impl New<Output = T>
where
  F: FnOnce() -> T,
{
  unsafe {
    from_placement_fn(|dest| {
      dest.write(f());
    })
  }
}

/// Returns a new `New` that uses a `From` implementation to generate a `T`.
///
/// ```
/// # use growvec::{new, Vec};
/// let mut v = Vec::<String>::new();
/// v.emplace_back(new::from("asd"))?;
/// assert_eq!(v[0], "asd");
/// # Ok::<(), growvec::OutOfMemory>(())
/// ```
#[inline]
pub fn from<T: From<U>, U>(val: U) -> impl New<Output = T> {
  from_fn(|| val.into())
}

/// Returns a new `New` that moves the given value into place.
#[inline]
pub fn of<T>(val: T) -> impl New<Output = T> {
  from_fn(|| val)
}

/// Returns a new `New` that uses a `Default` implementation to generate a `T`.
#[inline]
pub fn default<T: Default>() -> impl New<Output = T> {
  from_fn(Default::default)
}

/// Returns a new `New` that copy-constructs from `src`, leaving it intact.
///
/// ```
/// # use growvec::{new, Vec};
/// let name = String::from("kept");
/// let mut v = Vec::new();
/// v.emplace_back(new::copy(&name))?;
/// assert_eq!(v[0], name);
/// # Ok::<(), growvec::OutOfMemory>(())
/// ```
#[inline]
pub fn copy<T: Clone>(src: &T) -> impl New<Output = T> + '_ {
  from_fn(move || src.clone())
}
