//! Protocol dispatch: calls, attribute lookup, the sequence protocol and
//! module import.

use std::rc::Rc;

use ahash::RandomState;
use hashbrown::HashMap;

use crate::args::{Kwargs, Tuple};
use crate::config::RuntimeConfig;
use crate::core::{
    BoundMethod, CallConv, MethodDef, ModuleInitFunc, ModuleRef, ObjRef, SequenceMethods,
    TypeRef,
};
use crate::errors::{ErrorKind, HostError, messages, state};
use crate::Value;

pub struct Runtime {
    config: RuntimeConfig,
    modules: HashMap<String, ModuleRef, RandomState>,
}

impl Runtime {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config,
            modules: HashMap::with_hasher(RandomState::new()),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: RuntimeConfig) {
        self.config = config;
    }

    /// Returns the module registered under `name`, running `init` the
    /// first time.
    pub fn import(&mut self, name: &str, init: ModuleInitFunc) -> Result<ModuleRef, HostError> {
        if let Some(m) = self.modules.get(name) {
            return Ok(m.clone());
        }
        tracing::debug!(module = name, "initializing module");
        state::clear();
        let Some(module) = init() else {
            let err = state::fetch(name);
            tracing::warn!(module = name, %err, "module init failed");
            return Err(err);
        };
        state::check_clean(name)?;
        if module.name() != name {
            return Err(HostError::new(
                ErrorKind::ImportError,
                format!("init function for '{}' created module '{}'", name, module.name()),
            ));
        }
        self.modules.insert(name.to_string(), module.clone());
        Ok(module)
    }

    pub fn module(&self, name: &str) -> Option<ModuleRef> {
        self.modules.get(name).cloned()
    }

    pub fn call(&self, callable: &Value, args: Tuple, kwargs: Option<&Kwargs>) -> Result<Value, HostError> {
        match callable {
            Value::Type(ty) => self.call_type(ty, &args, kwargs),
            Value::Builtin(def) => self.call_cfunction(*def, None, &args, kwargs),
            Value::Method(bm) => self.call_cfunction(bm.def, Some(&bm.receiver), &args, kwargs),
            other => Err(HostError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    /// Looks up `name` on `receiver` and calls it.
    pub fn call_method(&self, receiver: &Value, name: &str, args: Tuple) -> Result<Value, HostError> {
        let callable = self.getattr(receiver, name)?;
        self.call(&callable, args, None)
    }

    fn call_type(&self, ty: &TypeRef, args: &Tuple, kwargs: Option<&Kwargs>) -> Result<Value, HostError> {
        if !ty.is_ready() {
            return Err(HostError::system(format!("type '{}' is not ready", ty.name)));
        }
        let Some(new) = ty.new else {
            return Err(HostError::type_error(format!(
                "cannot create '{}' instances",
                ty.name
            )));
        };
        state::clear();
        let Some(obj) = new(ty.get(), args, kwargs) else {
            return Err(state::fetch(ty.name));
        };
        if let Some(init) = ty.init {
            // SAFETY: `obj` was just created by this type's own `new` slot.
            let rc = unsafe { init(obj.as_ptr(), args, kwargs) };
            if rc < 0 {
                let err = state::fetch(ty.name);
                tracing::debug!(ty = ty.name, %err, "init failed, releasing record");
                drop(obj);
                return Err(err);
            }
            state::check_clean(ty.name)?;
            tracing::debug!(ty = ty.name, nargs = args.len(), "record initialized");
        }
        Ok(Value::Object(obj))
    }

    fn call_cfunction(
        &self,
        def: &'static MethodDef,
        receiver: Option<&ObjRef>,
        args: &Tuple,
        kwargs: Option<&Kwargs>,
    ) -> Result<Value, HostError> {
        if kwargs.is_some_and(|k| !k.is_empty()) {
            return Err(HostError::type_error(format!(
                "{}() {}",
                def.name,
                messages::NO_KEYWORDS
            )));
        }
        match def.conv {
            CallConv::NoArgs if !args.is_empty() => {
                return Err(HostError::type_error(format!(
                    "{}() takes no arguments ({} given)",
                    def.name,
                    args.len()
                )));
            }
            CallConv::O if args.len() != 1 => {
                return Err(HostError::type_error(format!(
                    "{}() takes exactly one argument ({} given)",
                    def.name,
                    args.len()
                )));
            }
            _ => {}
        }
        state::clear();
        // SAFETY: receivers are only bound to methods found on their own type.
        let out = unsafe { (def.func)(receiver.map(ObjRef::as_ptr), args.as_slice()) };
        match out {
            Some(v) => {
                state::check_clean(def.name)?;
                Ok(v)
            }
            None => Err(state::fetch(def.name)),
        }
    }

    pub fn getattr(&self, value: &Value, name: &str) -> Result<Value, HostError> {
        let found = match value {
            Value::Module(m) => {
                return m.get(name).ok_or_else(|| {
                    HostError::new(
                        ErrorKind::AttributeError,
                        format!("module '{}' has no attribute '{}'", m.name(), name),
                    )
                });
            }
            Value::Type(ty) => match name {
                "__name__" => Some(Value::str(ty.short_name())),
                "__qualname__" => Some(Value::str(ty.name)),
                "__doc__" => Some(Value::str(ty.doc)),
                _ => None,
            },
            Value::Builtin(def) => match name {
                "__name__" => Some(Value::str(def.name)),
                "__doc__" => Some(Value::str(def.doc)),
                _ => None,
            },
            Value::Method(bm) => match name {
                "__name__" => Some(Value::str(bm.def.name)),
                "__doc__" => Some(Value::str(bm.def.doc)),
                "__self__" => Some(Value::Object(bm.receiver.clone())),
                _ => None,
            },
            Value::Object(obj) => match name {
                "__class__" => Some(Value::Type(obj.type_object().new_ref())),
                _ => obj.type_object().find_method(name).map(|def| {
                    Value::Method(Rc::new(BoundMethod {
                        def,
                        receiver: obj.clone(),
                    }))
                }),
            },
            _ => None,
        };
        found.ok_or_else(|| {
            HostError::new(
                ErrorKind::AttributeError,
                format!("'{}' object has no attribute '{}'", value.type_name(), name),
            )
        })
    }

    fn sequence<'a>(&self, value: &'a Value, what: &str) -> Result<(&'a ObjRef, &'static SequenceMethods), HostError> {
        if let Value::Object(obj) = value {
            if let Some(seq) = obj.type_object().as_sequence {
                return Ok((obj, seq));
            }
        }
        Err(HostError::type_error(format!(
            "'{}' object {}",
            value.type_name(),
            what
        )))
    }

    fn raw_len(obj: &ObjRef, seq: &SequenceMethods) -> Result<Option<usize>, HostError> {
        let Some(length) = seq.length else {
            return Ok(None);
        };
        state::clear();
        // SAFETY: the slot table belongs to `obj`'s own type.
        let n = unsafe { length(obj.as_ptr()) };
        if n < 0 {
            return Err(state::fetch("len"));
        }
        state::check_clean("len")?;
        Ok(Some(n as usize))
    }

    pub fn len(&self, value: &Value) -> Result<usize, HostError> {
        let (obj, seq) = self.sequence(value, "has no len()")?;
        Self::raw_len(obj, seq)?.ok_or_else(|| {
            HostError::type_error(format!("'{}' object has no len()", value.type_name()))
        })
    }

    fn adjust_index(&self, obj: &ObjRef, seq: &SequenceMethods, index: isize) -> Result<isize, HostError> {
        if index >= 0 || !self.config.wrap_negative_indices {
            return Ok(index);
        }
        match Self::raw_len(obj, seq)? {
            Some(n) => Ok(index.saturating_add(n as isize)),
            None => Ok(index),
        }
    }

    pub fn get_item(&self, value: &Value, index: isize) -> Result<Value, HostError> {
        let (obj, seq) = self.sequence(value, "is not subscriptable")?;
        let Some(item) = seq.item else {
            return Err(HostError::type_error(format!(
                "'{}' object is not subscriptable",
                value.type_name()
            )));
        };
        let index = self.adjust_index(obj, seq, index)?;
        state::clear();
        // SAFETY: the slot table belongs to `obj`'s own type.
        match unsafe { item(obj.as_ptr(), index) } {
            Some(v) => {
                state::check_clean("getitem")?;
                Ok(v)
            }
            None => Err(state::fetch("getitem")),
        }
    }

    pub fn set_item(&self, value: &Value, index: isize, item: &Value) -> Result<(), HostError> {
        self.assign(value, index, Some(item), "does not support item assignment")
    }

    pub fn del_item(&self, value: &Value, index: isize) -> Result<(), HostError> {
        self.assign(value, index, None, "doesn't support item deletion")
    }

    fn assign(&self, value: &Value, index: isize, item: Option<&Value>, what: &str) -> Result<(), HostError> {
        let (obj, seq) = self.sequence(value, what)?;
        let Some(ass_item) = seq.ass_item else {
            return Err(HostError::type_error(format!(
                "'{}' object {}",
                value.type_name(),
                what
            )));
        };
        let index = self.adjust_index(obj, seq, index)?;
        state::clear();
        // SAFETY: the slot table belongs to `obj`'s own type.
        if unsafe { ass_item(obj.as_ptr(), index, item) } < 0 {
            return Err(state::fetch("setitem"));
        }
        state::check_clean("setitem")
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
