//! Adapts a native container to the host sequence protocol.

use std::ffi::c_int;
use std::ptr::NonNull;

use hc_runtime::errors::{messages, state};
use hc_runtime::{HostError, ObjectHeader, SequenceMethods, Value};

use crate::lifecycle::NativeObject;

/// A fixed-length container whose elements can be read and replaced.
pub trait NativeSequence {
    fn seq_len(&self) -> usize;

    /// `index` is within `0..seq_len()`.
    fn seq_item(&self, index: usize) -> Result<Value, HostError>;

    /// `index` is within `0..seq_len()`. On error nothing is modified.
    fn seq_ass_item(&mut self, index: usize, value: &Value) -> Result<(), HostError>;
}

/// Maps a host index onto `0..size`.
///
/// A negative index is replaced by `size - index`, which is always past the
/// end, so negative indices that reach a slot are rejected. Indexing from
/// the end is the runtime's job (see `RuntimeConfig::wrap_negative_indices`).
pub fn normalize_index(index: isize, size: usize) -> Result<usize, HostError> {
    let out_of_range = || HostError::index(messages::INDEX_OUT_OF_RANGE);
    let size = isize::try_from(size).map_err(|_| out_of_range())?;
    let index = if index < 0 {
        size.checked_sub(index).ok_or_else(out_of_range)?
    } else {
        index
    };
    if index >= size {
        return Err(out_of_range());
    }
    Ok(index as usize)
}

pub(crate) fn not_initialized(obj: NonNull<ObjectHeader>) -> HostError {
    let ty = unsafe { obj.as_ref() }.type_object();
    HostError::runtime(format!("{} object is not initialized", ty.short_name()))
}

/// # Safety
/// `obj` must be a live `NativeObject<T>` record.
pub unsafe fn class_len<T: NativeSequence>(obj: NonNull<ObjectHeader>) -> isize {
    match unsafe { NativeObject::<T>::slot(obj) }.get() {
        Some(payload) => isize::try_from(payload.seq_len()).unwrap_or(isize::MAX),
        None => {
            state::set(not_initialized(obj));
            -1
        }
    }
}

/// # Safety
/// `obj` must be a live `NativeObject<T>` record.
pub unsafe fn class_item<T: NativeSequence>(obj: NonNull<ObjectHeader>, index: isize) -> Option<Value> {
    let result = match unsafe { NativeObject::<T>::slot(obj) }.get() {
        Some(payload) => normalize_index(index, payload.seq_len()).and_then(|i| payload.seq_item(i)),
        None => Err(not_initialized(obj)),
    };
    result.map_err(state::set).ok()
}

/// # Safety
/// `obj` must be a live `NativeObject<T>` record.
pub unsafe fn class_ass_item<T: NativeSequence>(
    obj: NonNull<ObjectHeader>,
    index: isize,
    value: Option<&Value>,
) -> c_int {
    let short_name = unsafe { obj.as_ref() }.type_object().short_name();
    let result = match unsafe { NativeObject::<T>::slot_mut(obj) }.get_mut() {
        None => Err(not_initialized(obj)),
        Some(payload) => match value {
            None => Err(HostError::type_error(format!(
                "{short_name} object doesn't support item deletion"
            ))),
            Some(value) => normalize_index(index, payload.seq_len())
                .and_then(|i| payload.seq_ass_item(i, value)),
        },
    };
    match result {
        Ok(()) => 0,
        Err(err) => {
            state::set(err);
            -1
        }
    }
}

/// The sequence slot table for `NativeObject<T>` records.
pub const fn sequence_methods<T: NativeSequence>() -> SequenceMethods {
    SequenceMethods {
        length: Some(class_len::<T>),
        item: Some(class_item::<T>),
        ass_item: Some(class_ass_item::<T>),
    }
}
