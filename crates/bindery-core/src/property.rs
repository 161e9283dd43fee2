#![forbid(unsafe_code)]

//! Observable application fields.
//!
//! A [`Property<T>`] is a view-model field with the same contract as the busy
//! flag: writing an equal value is a no-op, writing a different value
//! notifies the owning view-model's listeners once.

use std::cell::RefCell;
use std::fmt;

use crate::error::BindError;
use crate::view_model::{LifecycleState, ViewModelCore};

/// A field that notifies its view-model when it changes.
pub struct Property<T> {
    value: RefCell<T>,
    core: ViewModelCore,
}

impl<T: fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.value.borrow())
            .finish_non_exhaustive()
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Create a field bound to `core`.
    #[must_use]
    pub fn new(core: &ViewModelCore, value: T) -> Self {
        Self {
            value: RefCell::new(value),
            core: core.clone(),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.value.borrow().clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.value.borrow())
    }

    /// Replace the value, notifying only if it changed.
    pub fn set(&self, value: T) -> Result<(), BindError> {
        self.update(|current| *current = value).map(|_| ())
    }

    /// Modify the value in place. Returns whether it changed (and therefore
    /// notified).
    ///
    /// The value is compared against a snapshot taken before `f` runs; if the
    /// view-model cannot notify (disposed, or too deeply nested) the change
    /// is rolled back.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> Result<bool, BindError> {
        if self.core.state() == LifecycleState::Disposed {
            return Err(BindError::Disposed);
        }
        let old = {
            let mut value = self.value.borrow_mut();
            let old = value.clone();
            f(&mut *value);
            if *value == old {
                return Ok(false);
            }
            old
        };
        if let Err(err) = self.core.notify() {
            *self.value.borrow_mut() = old;
            return Err(err);
        }
        Ok(true)
    }
}
