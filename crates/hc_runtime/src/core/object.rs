//! Object headers, record allocation and reference-counted handles.

use std::alloc::{self, Layout};
use std::cell::Cell;
use std::fmt;
use std::ptr::NonNull;

use super::typeobj::TypeObject;
use crate::args::{Kwargs, Tuple};
use crate::errors::{ErrorKind, HostError, messages, state};

/// The prefix of every host record. Payload storage follows it in the same
/// allocation.
#[repr(C)]
pub struct ObjectHeader {
    refcnt: Cell<usize>,
    ty: &'static TypeObject,
}

impl ObjectHeader {
    pub fn type_object(&self) -> &'static TypeObject {
        self.ty
    }

    pub fn refcnt(&self) -> usize {
        self.refcnt.get()
    }
}

fn record_layout(ty: &TypeObject) -> Result<Layout, HostError> {
    if ty.basic_size < std::mem::size_of::<ObjectHeader>() {
        return Err(HostError::system(format!(
            "type '{}' is too small to hold an object header",
            ty.name
        )));
    }
    Layout::from_size_align(ty.basic_size, ty.align)
        .map_err(|e| HostError::system(format!("type '{}' has no valid layout: {e}", ty.name)))
}

/// Allocates a zero-filled record for `ty` with a reference count of one.
pub fn generic_alloc(ty: &'static TypeObject) -> Result<ObjRef, HostError> {
    let layout = record_layout(ty)?;
    // SAFETY: the layout is at least the size of the header, so non-zero.
    let raw = unsafe { alloc::alloc_zeroed(layout) };
    let Some(ptr) = NonNull::new(raw.cast::<ObjectHeader>()) else {
        return Err(HostError::new(ErrorKind::MemoryError, messages::OUT_OF_MEMORY));
    };
    // SAFETY: `ptr` is freshly allocated, aligned for the header and large enough.
    unsafe {
        ptr.as_ptr().write(ObjectHeader {
            refcnt: Cell::new(1),
            ty,
        })
    };
    stats::ALLOCS.with(|c| c.set(c.get() + 1));
    tracing::trace!(ty = ty.name, size = layout.size(), "allocated record");
    // SAFETY: the single reference created above is handed to the caller.
    Ok(unsafe { ObjRef::from_owned(ptr) })
}

/// Default `new` slot: allocation only, arguments are left to `init`.
pub fn generic_new(ty: &'static TypeObject, _args: &Tuple, _kwargs: Option<&Kwargs>) -> Option<ObjRef> {
    match generic_alloc(ty) {
        Ok(obj) => Some(obj),
        Err(err) => {
            state::set(err);
            None
        }
    }
}

/// Default `free` slot: returns the record's memory to the allocator.
///
/// # Safety
/// `obj` must come from [`generic_alloc`] and must not be used afterwards.
pub unsafe fn generic_free(obj: NonNull<ObjectHeader>) {
    let ty = unsafe { obj.as_ref() }.ty;
    let Ok(layout) = record_layout(ty) else {
        return;
    };
    // SAFETY: allocated by `generic_alloc` with this same layout.
    unsafe { alloc::dealloc(obj.as_ptr().cast::<u8>(), layout) };
    stats::FREES.with(|c| c.set(c.get() + 1));
    tracing::trace!(ty = ty.name, "freed record");
}

/// An owned reference to a host record.
///
/// Cloning adds a reference; dropping the last one runs the type's
/// `dealloc` slot, or `free` when the type declares none.
pub struct ObjRef {
    ptr: NonNull<ObjectHeader>,
}

impl ObjRef {
    /// # Safety
    /// `ptr` must point to a live record and the caller must own one of its
    /// references, which is transferred to the returned handle.
    pub unsafe fn from_owned(ptr: NonNull<ObjectHeader>) -> Self {
        Self { ptr }
    }

    pub fn as_ptr(&self) -> NonNull<ObjectHeader> {
        self.ptr
    }

    fn header(&self) -> &ObjectHeader {
        // SAFETY: the handle keeps the record alive.
        unsafe { self.ptr.as_ref() }
    }

    pub fn type_object(&self) -> &'static TypeObject {
        self.header().ty
    }

    pub fn refcnt(&self) -> usize {
        self.header().refcnt.get()
    }

    pub fn is(&self, other: &ObjRef) -> bool {
        self.ptr == other.ptr
    }
}

impl Clone for ObjRef {
    fn clone(&self) -> Self {
        let h = self.header();
        h.refcnt.set(h.refcnt.get() + 1);
        Self { ptr: self.ptr }
    }
}

impl Drop for ObjRef {
    fn drop(&mut self) {
        let h = self.header();
        let n = h.refcnt.get() - 1;
        h.refcnt.set(n);
        if n != 0 {
            return;
        }
        let ty = h.ty;
        tracing::trace!(ty = ty.name, "last reference dropped");
        // SAFETY: no references remain; teardown runs exactly once here.
        match ty.dealloc {
            Some(dealloc) => unsafe { dealloc(self.ptr) },
            None => unsafe { (ty.free)(self.ptr) },
        }
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} object at {:p}>", self.type_object().name, self.ptr)
    }
}

/// Per-thread allocation counters.
pub mod stats {
    use std::cell::Cell;

    thread_local! {
        pub(super) static ALLOCS: Cell<usize> = const { Cell::new(0) };
        pub(super) static FREES: Cell<usize> = const { Cell::new(0) };
    }

    pub fn total_allocations() -> usize {
        ALLOCS.with(Cell::get)
    }

    pub fn total_frees() -> usize {
        FREES.with(Cell::get)
    }

    pub fn live_objects() -> usize {
        total_allocations() - total_frees()
    }
}
