#![forbid(unsafe_code)]

//! Listener handles.
//!
//! A [`Listener`] is a shared, zero-argument callback. Identity is the
//! identity of the underlying allocation: clones of one `Listener` compare
//! equal, two listeners built from identical closures do not. This is what
//! gives the registry its set semantics.

use std::fmt;
use std::rc::Rc;

/// A zero-argument notification callback with pointer identity.
#[derive(Clone)]
pub struct Listener {
    callback: Rc<dyn Fn()>,
}

impl Listener {
    /// Wrap a callback.
    pub fn new(callback: impl Fn() + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }

    /// Invoke the callback.
    #[inline]
    pub fn call(&self) {
        (self.callback)();
    }

    /// True if `other` is a handle to the same callback.
    #[inline]
    #[must_use]
    pub fn same(&self, other: &Listener) -> bool {
        // Compare data pointers only; vtable pointers are not unique.
        std::ptr::addr_eq(Rc::as_ptr(&self.callback), Rc::as_ptr(&other.callback))
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("ptr", &Rc::as_ptr(&self.callback).cast::<()>())
            .finish()
    }
}
