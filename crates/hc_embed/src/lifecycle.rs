//! Host records embedding a native payload, and the entry points that drive
//! the payload through initialization and teardown.

use std::any::Any;
use std::ffi::c_int;
use std::fmt::Display;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};

use hc_runtime::errors::state;
use hc_runtime::{HostError, Kwargs, ObjectHeader, Tuple};

use crate::slot::ScopedSlot;

/// Record layout for a host object carrying a `T`: the host header, then
/// the payload slot.
#[repr(C)]
pub struct NativeObject<T> {
    #[allow(dead_code)] // written and read by the host only
    header: ObjectHeader,
    slot: ScopedSlot<T>,
}

impl<T> NativeObject<T> {
    pub const BASIC_SIZE: usize = std::mem::size_of::<Self>();
    pub const ALIGN: usize = std::mem::align_of::<Self>();

    /// # Safety
    /// `obj` must be a live record allocated for a type whose layout is
    /// `NativeObject<T>`, and no other reference to its slot may exist.
    pub unsafe fn slot_mut<'a>(obj: NonNull<ObjectHeader>) -> &'a mut ScopedSlot<T> {
        let rec = obj.cast::<NativeObject<T>>().as_ptr();
        unsafe { &mut *ptr::addr_of_mut!((*rec).slot) }
    }

    /// # Safety
    /// As for [`slot_mut`](Self::slot_mut), except shared references to the
    /// slot may coexist.
    pub unsafe fn slot<'a>(obj: NonNull<ObjectHeader>) -> &'a ScopedSlot<T> {
        let rec = obj.cast::<NativeObject<T>>().as_ptr();
        unsafe { &*ptr::addr_of!((*rec).slot) }
    }
}

/// Payload-specific initialization from call arguments.
pub trait NativeInit: Sized {
    /// Fills `slot` from the arguments. On error the slot may be left either
    /// empty or constructed; teardown copes with both.
    fn init(slot: &mut ScopedSlot<Self>, args: &Tuple, kwargs: Option<&Kwargs>) -> Result<(), HostError>;
}

/// Builds the payload in `slot`, converting a construction failure or a
/// panic into a `RuntimeError` carrying its description.
pub fn construct_native<T, E: Display>(
    slot: &mut ScopedSlot<T>,
    f: impl FnOnce() -> Result<T, E>,
) -> Result<&mut T, HostError> {
    let built = panic::catch_unwind(AssertUnwindSafe(|| f().map_err(|e| e.to_string())));
    match built {
        Ok(Ok(value)) => {
            tracing::trace!(payload = std::any::type_name::<T>(), "payload constructed");
            Ok(slot.construct(value))
        }
        Ok(Err(msg)) => Err(HostError::runtime(msg)),
        Err(payload) => Err(HostError::runtime(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "native construction panicked".to_string()
    }
}

/// `init` slot for `NativeObject<T>` records.
///
/// # Safety
/// `obj` must be a live `NativeObject<T>` record.
pub unsafe fn class_init<T: NativeInit>(obj: NonNull<ObjectHeader>, args: &Tuple, kwargs: Option<&Kwargs>) -> c_int {
    let ty = unsafe { obj.as_ref() }.type_object();
    let slot = unsafe { NativeObject::<T>::slot_mut(obj) };
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| T::init(slot, args, kwargs)))
        .unwrap_or_else(|payload| Err(HostError::runtime(panic_message(payload.as_ref()))));
    match outcome {
        Ok(()) => 0,
        Err(err) => {
            tracing::debug!(ty = ty.name, %err, "init failed");
            state::set(err);
            -1
        }
    }
}

/// `dealloc` slot for `NativeObject<T>` records: destroys the payload if it
/// was ever constructed, then releases the record.
///
/// # Safety
/// `obj` must be a `NativeObject<T>` record with no remaining references.
pub unsafe fn class_dealloc<T>(obj: NonNull<ObjectHeader>) {
    let ty = unsafe { obj.as_ref() }.type_object();
    let slot = unsafe { NativeObject::<T>::slot_mut(obj) };
    let constructed = slot.is_constructed();
    if panic::catch_unwind(AssertUnwindSafe(|| slot.destroy())).is_err() {
        tracing::warn!(ty = ty.name, "payload destructor panicked");
    }
    tracing::trace!(ty = ty.name, constructed, "dealloc");
    unsafe { (ty.free)(obj) }
}
