//! The `test_module` module and the registration helper behind it.

use std::ptr::NonNull;

use hc_runtime::errors::state;
use hc_runtime::unicode;
use hc_runtime::{
    CallConv, HostError, MethodDef, Module, ModuleDef, ModuleRef, ObjectHeader, TypeObject, Value,
    type_ready,
};

use crate::string_vector::STRING_VECTOR_TYPE;

pub const MODULE_NAME: &str = "test_module";

unsafe fn strlen(_module: Option<NonNull<ObjectHeader>>, args: &[Value]) -> Option<Value> {
    let len = args
        .first()
        .and_then(|arg| unicode::as_utf8(arg).ok())
        .map(|s| Value::Int(s.len() as i64));
    if len.is_none() {
        state::set(HostError::type_error("strlen argument must be a string"));
    }
    len
}

static TEST_MODULE_METHODS: [MethodDef; 1] = [MethodDef::new(
    "strlen",
    strlen,
    CallConv::O,
    "get length of string",
)];

pub static TEST_MODULE: ModuleDef = ModuleDef::new(
    MODULE_NAME,
    "Template for a host module written in Rust",
    &TEST_MODULE_METHODS,
);

/// Types exported by `test_module`, with their attribute names.
pub static TEST_MODULE_TYPES: [(&str, &TypeObject); 1] = [("string_vector", &STRING_VECTOR_TYPE)];

/// Creates the module for `def` and binds each type under its name.
///
/// All types are readied before the module exists. If any binding fails the
/// module is released along with every type reference it had taken, so a
/// failed call leaves nothing behind.
pub fn build_module(
    def: &'static ModuleDef,
    types: &[(&str, &'static TypeObject)],
) -> Result<ModuleRef, HostError> {
    for &(_, ty) in types {
        type_ready(ty)?;
    }
    let module = Module::create(def)?;
    for &(name, ty) in types {
        if let Err(err) = module.add_object(name, Value::Type(ty.new_ref())) {
            tracing::warn!(module = def.name, ty = ty.name, %err, "type registration failed");
            drop(module);
            return Err(err);
        }
    }
    tracing::debug!(module = def.name, types = types.len(), "module built");
    Ok(module)
}

/// Module init function for `test_module`.
pub fn init_test_module() -> Option<ModuleRef> {
    build_module(&TEST_MODULE, &TEST_MODULE_TYPES).map_err(state::set).ok()
}
