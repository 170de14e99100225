//! `test_module.string_vector`: a fixed-length vector of owned strings.

use std::ptr::NonNull;

use hc_runtime::core::generic_new;
use hc_runtime::errors::state;
use hc_runtime::unicode;
use hc_runtime::{
    CallConv, HostError, Kwargs, MethodDef, ObjectHeader, SequenceMethods, Tuple, TypeObject, Value,
};

use crate::bridge::{NativeSequence, not_initialized, sequence_methods};
use crate::lifecycle::{NativeInit, NativeObject, class_dealloc, class_init, construct_native};
use crate::slot::ScopedSlot;

pub type StringVector = Vec<String>;

pub mod messages {
    pub const AT_LEAST_ONE: &str = "string_vector must be given at least 1 argument";
    pub const ALL_STRINGS: &str = "all string_vector arguments must be strings";
    pub const FRONT_EMPTY: &str = "index 0 is out of range";
}

impl NativeInit for StringVector {
    fn init(slot: &mut ScopedSlot<Self>, args: &Tuple, _kwargs: Option<&Kwargs>) -> Result<(), HostError> {
        let nargs = args.len();
        if nargs < 1 {
            return Err(HostError::usage(messages::AT_LEAST_ONE));
        }
        let items = construct_native(slot, || {
            let mut items = Vec::new();
            items.try_reserve_exact(nargs)?;
            items.resize(nargs, String::new());
            Ok::<_, std::collections::TryReserveError>(items)
        })?;
        let filled = fill(items, args);
        if filled.is_err() {
            slot.destroy();
        }
        filled
    }
}

fn fill(items: &mut [String], args: &Tuple) -> Result<(), HostError> {
    for (item, arg) in items.iter_mut().zip(args) {
        let text = unicode::as_utf8(arg).map_err(|_| HostError::value(messages::ALL_STRINGS))?;
        item.push_str(text);
    }
    Ok(())
}

impl NativeSequence for StringVector {
    fn seq_len(&self) -> usize {
        self.len()
    }

    fn seq_item(&self, index: usize) -> Result<Value, HostError> {
        Ok(unicode::from_str(&self[index]))
    }

    fn seq_ass_item(&mut self, index: usize, value: &Value) -> Result<(), HostError> {
        let text = unicode::as_utf8(value)?;
        self[index] = text.to_owned();
        Ok(())
    }
}

unsafe fn string_vector_front(obj: Option<NonNull<ObjectHeader>>, _args: &[Value]) -> Option<Value> {
    let result = match obj {
        None => Err(HostError::system("front() called without a receiver")),
        Some(obj) => match unsafe { NativeObject::<StringVector>::slot(obj) }.get() {
            None => Err(not_initialized(obj)),
            Some(items) => items
                .first()
                .map(|s| unicode::from_str(s))
                .ok_or_else(|| HostError::index(messages::FRONT_EMPTY)),
        },
    };
    result.map_err(state::set).ok()
}

static STRING_VECTOR_SEQ: SequenceMethods = sequence_methods::<StringVector>();

static STRING_VECTOR_METHODS: [MethodDef; 1] = [MethodDef::new(
    "front",
    string_vector_front,
    CallConv::NoArgs,
    "get the first element",
)];

pub static STRING_VECTOR_TYPE: TypeObject = TypeObject::new(
    "test_module.string_vector",
    NativeObject::<StringVector>::BASIC_SIZE,
    NativeObject::<StringVector>::ALIGN,
)
.with_doc("host wrapper for a vector of strings")
.with_new(generic_new)
.with_init(class_init::<StringVector>)
.with_dealloc(class_dealloc::<StringVector>)
.with_sequence(&STRING_VECTOR_SEQ)
.with_methods(&STRING_VECTOR_METHODS);
