//! Module descriptors and module objects.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use super::typeobj::MethodDef;
use crate::errors::HostError;
use crate::Value;

pub struct ModuleDef {
    pub name: &'static str,
    pub doc: &'static str,
    pub methods: &'static [MethodDef],
}

impl ModuleDef {
    pub const fn new(name: &'static str, doc: &'static str, methods: &'static [MethodDef]) -> Self {
        Self { name, doc, methods }
    }
}

pub type ModuleRef = Rc<Module>;

/// Builds a module, or returns `None` with the current error set.
pub type ModuleInitFunc = fn() -> Option<ModuleRef>;

pub struct Module {
    def: &'static ModuleDef,
    dict: RefCell<IndexMap<String, Value>>,
}

impl Module {
    /// Creates a module object exposing the functions of `def`.
    pub fn create(def: &'static ModuleDef) -> Result<ModuleRef, HostError> {
        if def.name.is_empty() {
            return Err(HostError::system("module definition has no name"));
        }
        let module = Rc::new(Module {
            def,
            dict: RefCell::new(IndexMap::new()),
        });
        module.add_object("__name__", Value::str(def.name))?;
        module.add_object("__doc__", Value::str(def.doc))?;
        for method in def.methods {
            module.add_object(method.name, Value::Builtin(method))?;
        }
        tracing::debug!(module = def.name, functions = def.methods.len(), "module created");
        Ok(module)
    }

    pub fn name(&self) -> &'static str {
        self.def.name
    }

    pub fn doc(&self) -> &'static str {
        self.def.doc
    }

    pub fn def(&self) -> &'static ModuleDef {
        self.def
    }

    /// Binds `value` under `name`, taking ownership of it.
    ///
    /// An already-bound name is an error; `value` is then dropped here.
    pub fn add_object(&self, name: &str, value: Value) -> Result<(), HostError> {
        let mut dict = self.dict.borrow_mut();
        if dict.contains_key(name) {
            return Err(HostError::value(format!(
                "module '{}' already has an attribute '{}'",
                self.def.name, name
            )));
        }
        dict.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.dict.borrow().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.dict.borrow().keys().cloned().collect()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.def.name)
            .field("attributes", &self.dict.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        tracing::trace!(module = self.def.name, "module released");
    }
}
