//! Storage for at most one payload value with explicit construction and
//! destruction.

use std::fmt;
use std::mem::MaybeUninit;

/// Holds zero or one `T`.
///
/// The payload is live exactly when [`is_constructed`](Self::is_constructed)
/// is true. An all-zero bit pattern is a valid empty slot, so a slot inside
/// zero-filled memory needs no initialization before first use.
pub struct ScopedSlot<T> {
    value: MaybeUninit<T>,
    constructed: bool,
}

impl<T> ScopedSlot<T> {
    pub const fn new() -> Self {
        Self {
            value: MaybeUninit::uninit(),
            constructed: false,
        }
    }

    /// Stores `value`. An occupied slot is vacated first.
    pub fn construct(&mut self, value: T) -> &mut T {
        debug_assert!(!self.constructed, "construct on an occupied slot");
        self.destroy();
        let out = self.value.write(value);
        self.constructed = true;
        out
    }

    /// Builds the payload with `f`. When `f` fails (or unwinds) the slot is
    /// left empty and nothing has been stored.
    pub fn construct_with<E>(&mut self, f: impl FnOnce() -> Result<T, E>) -> Result<&mut T, E> {
        debug_assert!(!self.constructed, "construct on an occupied slot");
        self.destroy();
        let value = f()?;
        let out = self.value.write(value);
        self.constructed = true;
        Ok(out)
    }

    /// Drops the payload if there is one. Calling it again is a no-op.
    pub fn destroy(&mut self) {
        if self.constructed {
            self.constructed = false;
            // SAFETY: the flag was set, so the value is initialized; clearing
            // the flag first keeps a panicking destructor from running twice.
            unsafe { self.value.assume_init_drop() };
        }
    }

    pub fn is_constructed(&self) -> bool {
        self.constructed
    }

    pub fn get(&self) -> Option<&T> {
        if self.constructed {
            // SAFETY: checked above.
            Some(unsafe { self.value.assume_init_ref() })
        } else {
            None
        }
    }

    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.constructed {
            // SAFETY: checked above.
            Some(unsafe { self.value.assume_init_mut() })
        } else {
            None
        }
    }

    /// # Safety
    /// The slot must be constructed.
    pub unsafe fn get_unchecked(&self) -> &T {
        debug_assert!(self.constructed);
        unsafe { self.value.assume_init_ref() }
    }

    /// # Safety
    /// The slot must be constructed.
    pub unsafe fn get_unchecked_mut(&mut self) -> &mut T {
        debug_assert!(self.constructed);
        unsafe { self.value.assume_init_mut() }
    }
}

impl<T> Default for ScopedSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ScopedSlot<T> {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl<T: fmt::Debug> fmt::Debug for ScopedSlot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(v) => f.debug_tuple("ScopedSlot").field(v).finish(),
            None => f.write_str("ScopedSlot(<empty>)"),
        }
    }
}
