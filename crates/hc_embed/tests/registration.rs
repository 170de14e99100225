use hc_embed::{MODULE_NAME, NativeObject, StringVector, build_module, class_dealloc, class_init, init_test_module};
use hc_runtime::core::generic_new;
use hc_runtime::{ErrorKind, ModuleDef, Runtime, Tuple, TypeObject, Value};

static DUPLICATED_TYPE: TypeObject = TypeObject::new(
    "dup.vector",
    NativeObject::<StringVector>::BASIC_SIZE,
    NativeObject::<StringVector>::ALIGN,
)
.with_new(generic_new)
.with_init(class_init::<StringVector>)
.with_dealloc(class_dealloc::<StringVector>);

static BROKEN_TYPE: TypeObject = TypeObject::new("broken.vector", 1, 1);
static COUNTED_TYPE: TypeObject = TypeObject::new(
    "broken.counted",
    NativeObject::<StringVector>::BASIC_SIZE,
    NativeObject::<StringVector>::ALIGN,
);

static DUP_MODULE: ModuleDef = ModuleDef::new("dup", "duplicate bindings", &[]);
static BROKEN_MODULE: ModuleDef = ModuleDef::new("broken", "unready type", &[]);
static NAMELESS_MODULE: ModuleDef = ModuleDef::new("", "no name", &[]);

#[test]
fn module_exposes_strlen_and_type() {
    let mut rt = Runtime::new();
    let module = rt.import(MODULE_NAME, init_test_module).unwrap();
    assert_eq!(module.names(), ["__name__", "__doc__", "strlen", "string_vector"]);
    let m = Value::Module(module);
    assert_eq!(rt.getattr(&m, "__name__").unwrap(), Value::str("test_module"));
    assert_eq!(
        rt.getattr(&m, "__doc__").unwrap(),
        Value::str("Template for a host module written in Rust")
    );

    let ty = rt.getattr(&m, "string_vector").unwrap();
    assert_eq!(rt.getattr(&ty, "__name__").unwrap(), Value::str("string_vector"));
    assert_eq!(
        rt.getattr(&ty, "__qualname__").unwrap(),
        Value::str("test_module.string_vector")
    );
    let strlen = rt.getattr(&m, "strlen").unwrap();
    assert_eq!(rt.getattr(&strlen, "__doc__").unwrap(), Value::str("get length of string"));
}

#[test]
fn strlen_counts_utf8_bytes() {
    let mut rt = Runtime::new();
    let m = Value::Module(rt.import(MODULE_NAME, init_test_module).unwrap());
    let strlen = rt.getattr(&m, "strlen").unwrap();
    let call = |arg: Value| rt.call(&strlen, vec![arg].into(), None);
    assert_eq!(call(Value::str("")).unwrap(), Value::Int(0));
    assert_eq!(call(Value::str("abc")).unwrap(), Value::Int(3));
    assert_eq!(call(Value::str("héllo")).unwrap(), Value::Int(6));

    let err = call(Value::Int(3)).unwrap_err();
    assert!(err.is(ErrorKind::TypeError));
    assert_eq!(err.message, "strlen argument must be a string");

    let err = rt.call(&strlen, Tuple::new(), None).unwrap_err();
    assert_eq!(err.message, "strlen() takes exactly one argument (0 given)");
}

#[test]
fn import_runs_init_once() {
    let mut rt = Runtime::new();
    let a = rt.import(MODULE_NAME, init_test_module).unwrap();
    let b = rt.import(MODULE_NAME, init_test_module).unwrap();
    assert!(std::rc::Rc::ptr_eq(&a, &b));
}

#[test]
fn failed_binding_releases_module_and_type_refs() {
    let before = DUPLICATED_TYPE.refcnt();
    let err = build_module(
        &DUP_MODULE,
        &[("vector", &DUPLICATED_TYPE), ("vector", &DUPLICATED_TYPE)],
    )
    .unwrap_err();
    assert!(err.is(ErrorKind::ValueError));
    assert_eq!(DUPLICATED_TYPE.refcnt(), before);

    let module = build_module(&DUP_MODULE, &[("vector", &DUPLICATED_TYPE)]).unwrap();
    assert_eq!(DUPLICATED_TYPE.refcnt(), before + 1);
    drop(module);
    assert_eq!(DUPLICATED_TYPE.refcnt(), before);
}

#[test]
fn unready_type_stops_registration_before_module_creation() {
    let before = COUNTED_TYPE.refcnt();
    let err = build_module(
        &BROKEN_MODULE,
        &[("counted", &COUNTED_TYPE), ("vector", &BROKEN_TYPE)],
    )
    .unwrap_err();
    assert!(err.is(ErrorKind::SystemError));
    assert!(!BROKEN_TYPE.is_ready());
    assert_eq!(COUNTED_TYPE.refcnt(), before);
}

#[test]
fn nameless_module_is_rejected() {
    let err = build_module(&NAMELESS_MODULE, &[]).unwrap_err();
    assert!(err.is(ErrorKind::SystemError));
}
