//! Core host object model.
//!
//! - `ObjectHeader` / `ObjRef` - record prefix and owning handles
//! - `TypeObject` - type descriptors and slot tables
//! - `Module` - module descriptors and module objects
//! - `Value` - host values
//! - `Text` - string storage

pub mod module;
pub mod object;
pub mod text;
pub mod typeobj;
pub mod value;

pub use module::{Module, ModuleDef, ModuleInitFunc, ModuleRef};
pub use object::{ObjRef, ObjectHeader, generic_alloc, generic_free, generic_new, stats};
pub use text::Text;
pub use typeobj::{
    CFunction, CallConv, Destructor, FreeFunc, InitProc, LenFunc, MethodDef, NewFunc,
    SequenceMethods, SsizeArgFunc, SsizeObjArgProc, TypeObject, TypeRef, type_ready,
};
pub use value::{BoundMethod, Value};
