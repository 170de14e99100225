//! Host runtime for natively backed objects.
//!
//! Owns the object model the native adapters plug into: record headers and
//! reference counting, type and module descriptors, the current-error
//! indicator, text conversion and protocol dispatch.

pub mod args;
pub mod config;
pub mod core;
pub mod errors;
pub mod runtime;
pub mod unicode;

pub use args::{Kwargs, Tuple};
pub use config::RuntimeConfig;
pub use crate::core::{
    CallConv, MethodDef, Module, ModuleDef, ModuleInitFunc, ModuleRef, ObjRef, ObjectHeader,
    SequenceMethods, Text, TypeObject, TypeRef, Value, stats, type_ready,
};
pub use errors::{ErrorKind, HostError};
pub use runtime::Runtime;
