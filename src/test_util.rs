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

//! Test utilities for `Vec`, which allow for ensuring that values are copied,
//! moved and destroyed correctly.

use core::cell::Cell;
use core::fmt;
use core::marker::PhantomData;

/// A leak detector for values created in the current thread.
///
/// All this does is make sure that the number of `on_ctor()` and `on_dtor()`
/// calls is equal when this guard is destroyed.
///
/// Only one `LeakCheck` may exist per thread at a time.
pub struct LeakCheck(PhantomData<*mut u8>);

thread_local! {
  static LEAK_COUNTER: Cell<Option<usize>> = const { Cell::new(None) };
}

impl LeakCheck {
  /// Starts leak tracking for this thread, which ends when this value is
  /// dropped.
  pub fn start() -> Self {
    LEAK_COUNTER.with(|c| match c.get() {
      Some(_) => panic!("leak counter initialized twice"),
      None => c.set(Some(0)),
    });
    Self(PhantomData)
  }

  /// Registers that a value was created.
  pub fn on_ctor() {
    LEAK_COUNTER.with(|c| {
      if let Some(val) = c.get() {
        c.set(Some(val + 1));
      }
    })
  }

  /// Registers that a value was destroyed.
  pub fn on_dtor() {
    LEAK_COUNTER.with(|c| {
      if let Some(val) = c.get() {
        let dec = val.checked_sub(1).expect("value destroyed twice");
        c.set(Some(dec));
      }
    })
  }

  /// Returns the number of tracked values currently alive.
  pub fn live() -> usize {
    LEAK_COUNTER
      .with(|c| c.get())
      .expect("leak counter not initialized")
  }

  /// Checks that all objects tracked by leak-checking have been destroyed.
  pub fn check() {
    let count = Self::live();
    assert!(count == 0, "{} values were leaked", count)
  }
}

impl Drop for LeakCheck {
  fn drop(&mut self) {
    if !std::thread::panicking() {
      Self::check();
    }
    LEAK_COUNTER.with(|c| c.set(None));
  }
}

/// A value whose every construction and destruction is reported to
/// [`LeakCheck`].
///
/// Copies count as constructions; moves do not, since a Rust move leaves
/// nothing behind to destroy. Dropping the same value twice trips the
/// underflow check in [`LeakCheck::on_dtor()`].
pub struct Tracked<T> {
  inner: T,
  poisoned: Cell<bool>,
}

impl<T> Tracked<T> {
  /// Creates a new `Tracked` wrapping `val`.
  pub fn new(val: T) -> Self {
    LeakCheck::on_ctor();
    Self {
      inner: val,
      poisoned: Cell::new(false),
    }
  }

  /// Makes the next `clone()` of this value panic.
  pub fn poison_clone(&self) {
    self.poisoned.set(true);
  }
}

impl<T: Clone> Clone for Tracked<T> {
  fn clone(&self) -> Self {
    if self.poisoned.get() {
      panic!("poisoned clone");
    }
    Self::new(self.inner.clone())
  }
}

impl<T> Drop for Tracked<T> {
  fn drop(&mut self) {
    LeakCheck::on_dtor();
  }
}

impl<T: fmt::Debug> fmt::Debug for Tracked<T> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "Tracked({:?})", self.inner)
  }
}

impl<T: PartialEq> PartialEq<T> for Tracked<T> {
  fn eq(&self, that: &T) -> bool {
    self.inner == *that
  }
}

impl<T: PartialEq> PartialEq for Tracked<T> {
  fn eq(&self, that: &Self) -> bool {
    self.inner == that.inner
  }
}
