//! Type descriptors and the slot tables bound to them.

use std::ffi::c_int;
use std::fmt;
use std::ops::Deref;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::object::{ObjRef, ObjectHeader, generic_free};
use crate::args::{Kwargs, Tuple};
use crate::errors::HostError;
use crate::Value;

/// Allocates an uninitialized record of the given type.
pub type NewFunc = fn(&'static TypeObject, &Tuple, Option<&Kwargs>) -> Option<ObjRef>;
/// Returns 0 on success, -1 with the current error set on failure.
pub type InitProc = unsafe fn(NonNull<ObjectHeader>, &Tuple, Option<&Kwargs>) -> c_int;
pub type Destructor = unsafe fn(NonNull<ObjectHeader>);
pub type FreeFunc = unsafe fn(NonNull<ObjectHeader>);
pub type LenFunc = unsafe fn(NonNull<ObjectHeader>) -> isize;
pub type SsizeArgFunc = unsafe fn(NonNull<ObjectHeader>, isize) -> Option<Value>;
/// `None` for the value requests deletion.
pub type SsizeObjArgProc = unsafe fn(NonNull<ObjectHeader>, isize, Option<&Value>) -> c_int;
/// Receiver is `None` for module-level functions.
pub type CFunction = unsafe fn(Option<NonNull<ObjectHeader>>, &[Value]) -> Option<Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallConv {
    NoArgs,
    /// Exactly one positional argument.
    O,
}

pub struct MethodDef {
    pub name: &'static str,
    pub func: CFunction,
    pub conv: CallConv,
    pub doc: &'static str,
}

impl MethodDef {
    pub const fn new(name: &'static str, func: CFunction, conv: CallConv, doc: &'static str) -> Self {
        Self {
            name,
            func,
            conv,
            doc,
        }
    }
}

impl fmt::Debug for MethodDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDef")
            .field("name", &self.name)
            .field("conv", &self.conv)
            .finish_non_exhaustive()
    }
}

pub struct SequenceMethods {
    pub length: Option<LenFunc>,
    pub item: Option<SsizeArgFunc>,
    pub ass_item: Option<SsizeObjArgProc>,
}

pub struct TypeObject {
    /// Fully qualified, `module.type`.
    pub name: &'static str,
    pub doc: &'static str,
    pub basic_size: usize,
    pub align: usize,
    pub new: Option<NewFunc>,
    pub init: Option<InitProc>,
    pub dealloc: Option<Destructor>,
    pub free: FreeFunc,
    pub as_sequence: Option<&'static SequenceMethods>,
    pub methods: &'static [MethodDef],
    ready: AtomicBool,
    refcnt: AtomicUsize,
}

impl TypeObject {
    pub const fn new(name: &'static str, basic_size: usize, align: usize) -> Self {
        Self {
            name,
            doc: "",
            basic_size,
            align,
            new: None,
            init: None,
            dealloc: None,
            free: generic_free,
            as_sequence: None,
            methods: &[],
            ready: AtomicBool::new(false),
            // The static definition itself owns one reference.
            refcnt: AtomicUsize::new(1),
        }
    }

    pub const fn with_doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }

    pub const fn with_new(mut self, new: NewFunc) -> Self {
        self.new = Some(new);
        self
    }

    pub const fn with_init(mut self, init: InitProc) -> Self {
        self.init = Some(init);
        self
    }

    pub const fn with_dealloc(mut self, dealloc: Destructor) -> Self {
        self.dealloc = Some(dealloc);
        self
    }

    pub const fn with_free(mut self, free: FreeFunc) -> Self {
        self.free = free;
        self
    }

    pub const fn with_sequence(mut self, seq: &'static SequenceMethods) -> Self {
        self.as_sequence = Some(seq);
        self
    }

    pub const fn with_methods(mut self, methods: &'static [MethodDef]) -> Self {
        self.methods = methods;
        self
    }

    /// The unqualified name, used in error messages.
    pub fn short_name(&self) -> &'static str {
        match self.name.rfind('.') {
            Some(dot) => &self.name[dot + 1..],
            None => self.name,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn refcnt(&self) -> usize {
        self.refcnt.load(Ordering::Relaxed)
    }

    pub fn find_method(&self, name: &str) -> Option<&'static MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn new_ref(&'static self) -> TypeRef {
        self.refcnt.fetch_add(1, Ordering::Relaxed);
        TypeRef(self)
    }
}

impl fmt::Debug for TypeObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeObject")
            .field("name", &self.name)
            .field("basic_size", &self.basic_size)
            .field("align", &self.align)
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

/// Validates a type descriptor and marks it usable. Idempotent.
pub fn type_ready(ty: &'static TypeObject) -> Result<(), HostError> {
    if ty.is_ready() {
        return Ok(());
    }
    if ty.name.is_empty() {
        return Err(HostError::system("type has no name"));
    }
    if ty.basic_size < std::mem::size_of::<ObjectHeader>() {
        return Err(HostError::system(format!(
            "type '{}' has basic size {} smaller than the object header",
            ty.name, ty.basic_size
        )));
    }
    if !ty.align.is_power_of_two() || ty.align < std::mem::align_of::<ObjectHeader>() {
        return Err(HostError::system(format!(
            "type '{}' has invalid alignment {}",
            ty.name, ty.align
        )));
    }
    if ty.init.is_some() && ty.dealloc.is_none() {
        return Err(HostError::system(format!(
            "type '{}' defines init without dealloc",
            ty.name
        )));
    }
    ty.ready.store(true, Ordering::Release);
    tracing::debug!(ty = ty.name, size = ty.basic_size, "type ready");
    Ok(())
}

/// An owned reference to a static type.
pub struct TypeRef(&'static TypeObject);

impl TypeRef {
    pub fn get(&self) -> &'static TypeObject {
        self.0
    }
}

impl Clone for TypeRef {
    fn clone(&self) -> Self {
        self.0.new_ref()
    }
}

impl Drop for TypeRef {
    fn drop(&mut self) {
        self.0.refcnt.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Deref for TypeRef {
    type Target = TypeObject;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.0, other.0)
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<type '{}'>", self.0.name)
    }
}
