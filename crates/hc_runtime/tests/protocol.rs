use std::cell::Cell;
use std::ffi::c_int;
use std::ptr::NonNull;

use hc_runtime::core::{ObjectHeader, generic_alloc, generic_free, generic_new};
use hc_runtime::errors::{messages, state};
use hc_runtime::{
    CallConv, ErrorKind, HostError, Kwargs, MethodDef, Module, ModuleDef, ModuleRef, Runtime,
    RuntimeConfig, SequenceMethods, Tuple, TypeObject, Value, stats, type_ready,
};

#[repr(C)]
struct PairRecord {
    header: ObjectHeader,
    items: [i64; 2],
}

thread_local! {
    static DEALLOCS: Cell<usize> = const { Cell::new(0) };
    static PAIRS_INITS: Cell<usize> = const { Cell::new(0) };
    static CUSTOM_FREES: Cell<usize> = const { Cell::new(0) };
}

unsafe fn pair_items<'a>(obj: NonNull<ObjectHeader>) -> &'a mut [i64; 2] {
    unsafe { &mut (*obj.cast::<PairRecord>().as_ptr()).items }
}

unsafe fn pair_init(obj: NonNull<ObjectHeader>, args: &Tuple, _kwargs: Option<&Kwargs>) -> c_int {
    if args.len() != 2 {
        state::set(HostError::usage("pair takes 2 arguments"));
        return -1;
    }
    let items = unsafe { pair_items(obj) };
    for (slot, arg) in items.iter_mut().zip(args) {
        match arg.as_int() {
            Some(i) => *slot = i,
            None => {
                state::set(HostError::value("pair items must be ints"));
                return -1;
            }
        }
    }
    0
}

unsafe fn pair_dealloc(obj: NonNull<ObjectHeader>) {
    DEALLOCS.with(|c| c.set(c.get() + 1));
    let ty = unsafe { obj.as_ref() }.type_object();
    unsafe { (ty.free)(obj) }
}

unsafe fn pair_len(_obj: NonNull<ObjectHeader>) -> isize {
    2
}

unsafe fn pair_item(obj: NonNull<ObjectHeader>, i: isize) -> Option<Value> {
    if !(0..2).contains(&i) {
        state::set(HostError::index("pair index out of range"));
        return None;
    }
    Some(Value::Int(unsafe { pair_items(obj) }[i as usize]))
}

unsafe fn pair_ass_item(obj: NonNull<ObjectHeader>, i: isize, v: Option<&Value>) -> c_int {
    if !(0..2).contains(&i) {
        state::set(HostError::index("pair index out of range"));
        return -1;
    }
    match v.and_then(Value::as_int) {
        Some(n) => {
            let items = unsafe { pair_items(obj) };
            items[i as usize] = n;
            0
        }
        None => {
            state::set(HostError::type_error("pair items must be ints"));
            -1
        }
    }
}

unsafe fn pair_sum(obj: Option<NonNull<ObjectHeader>>, _args: &[Value]) -> Option<Value> {
    let items = unsafe { pair_items(obj?) };
    Some(Value::Int(items[0] + items[1]))
}

unsafe fn pair_broken(_obj: Option<NonNull<ObjectHeader>>, _args: &[Value]) -> Option<Value> {
    None
}

unsafe fn pair_leaky(_obj: Option<NonNull<ObjectHeader>>, _args: &[Value]) -> Option<Value> {
    state::set(HostError::runtime("left behind"));
    Some(Value::None)
}

static PAIR_SEQ: SequenceMethods = SequenceMethods {
    length: Some(pair_len),
    item: Some(pair_item),
    ass_item: Some(pair_ass_item),
};

static PAIR_METHODS: [MethodDef; 3] = [
    MethodDef::new("sum", pair_sum, CallConv::NoArgs, "sum of both items"),
    MethodDef::new("broken", pair_broken, CallConv::NoArgs, ""),
    MethodDef::new("leaky", pair_leaky, CallConv::NoArgs, ""),
];

static PAIR_TYPE: TypeObject = TypeObject::new(
    "tests.pair",
    std::mem::size_of::<PairRecord>(),
    std::mem::align_of::<PairRecord>(),
)
.with_doc("two ints")
.with_new(generic_new)
.with_init(pair_init)
.with_dealloc(pair_dealloc)
.with_sequence(&PAIR_SEQ)
.with_methods(&PAIR_METHODS);

static UNREADY_TYPE: TypeObject = TypeObject::new(
    "tests.unready",
    std::mem::size_of::<PairRecord>(),
    std::mem::align_of::<PairRecord>(),
)
.with_new(generic_new);

static NO_DEALLOC_TYPE: TypeObject = TypeObject::new(
    "tests.no_dealloc",
    std::mem::size_of::<PairRecord>(),
    std::mem::align_of::<PairRecord>(),
)
.with_new(generic_new)
.with_init(pair_init);

unsafe fn counting_free(obj: NonNull<ObjectHeader>) {
    CUSTOM_FREES.with(|c| c.set(c.get() + 1));
    unsafe { generic_free(obj) };
}

static CUSTOM_FREE_TYPE: TypeObject = TypeObject::new(
    "tests.custom_free",
    std::mem::size_of::<PairRecord>(),
    std::mem::align_of::<PairRecord>(),
)
.with_new(generic_new)
.with_free(counting_free);

static PAIRS_MODULE: ModuleDef = ModuleDef::new("pairs", "pair helpers", &[]);

fn init_pairs() -> Option<ModuleRef> {
    PAIRS_INITS.with(|c| c.set(c.get() + 1));
    Module::create(&PAIRS_MODULE).map_err(state::set).ok()
}

fn init_silent_failure() -> Option<ModuleRef> {
    None
}

fn pair_type() -> Value {
    type_ready(&PAIR_TYPE).unwrap();
    Value::Type(PAIR_TYPE.new_ref())
}

fn make_pair(rt: &Runtime, a: i64, b: i64) -> Value {
    rt.call(&pair_type(), Tuple::from(vec![Value::Int(a), Value::Int(b)]), None)
        .unwrap()
}

#[test]
fn call_constructs_and_indexes() {
    let rt = Runtime::new();
    let pair = make_pair(&rt, 3, 4);
    assert_eq!(rt.len(&pair).unwrap(), 2);
    assert_eq!(rt.get_item(&pair, 0).unwrap(), Value::Int(3));
    assert_eq!(rt.get_item(&pair, -1).unwrap(), Value::Int(4));
    rt.set_item(&pair, 0, &Value::Int(10)).unwrap();
    assert_eq!(rt.get_item(&pair, 0).unwrap(), Value::Int(10));
}

#[test]
fn raw_negative_index_reaches_slot() {
    let rt = Runtime::with_config(RuntimeConfig {
        wrap_negative_indices: false,
    });
    let pair = make_pair(&rt, 3, 4);
    let err = rt.get_item(&pair, -1).unwrap_err();
    assert!(err.is(ErrorKind::IndexError));
}

#[test]
fn config_can_be_switched_at_runtime() {
    let mut rt = Runtime::new();
    let pair = make_pair(&rt, 3, 4);
    assert_eq!(rt.get_item(&pair, -2).unwrap(), Value::Int(3));
    rt.set_config(RuntimeConfig {
        wrap_negative_indices: false,
    });
    assert!(!rt.config().wrap_negative_indices);
    assert!(rt.get_item(&pair, -2).unwrap_err().is(ErrorKind::IndexError));
}

#[test]
fn failed_init_releases_record_once() {
    let rt = Runtime::new();
    let live = stats::live_objects();
    let deallocs = DEALLOCS.with(Cell::get);

    let err = rt
        .call(&pair_type(), Tuple::from(vec![Value::Int(1)]), None)
        .unwrap_err();
    assert!(err.is(ErrorKind::UsageError));
    assert_eq!(stats::live_objects(), live);
    assert_eq!(DEALLOCS.with(Cell::get), deallocs + 1);

    let err = rt
        .call(&pair_type(), Tuple::from(vec![Value::Int(1), Value::str("x")]), None)
        .unwrap_err();
    assert!(err.is(ErrorKind::ValueError));
    assert_eq!(stats::live_objects(), live);
    assert_eq!(DEALLOCS.with(Cell::get), deallocs + 2);
}

#[test]
fn last_reference_runs_dealloc() {
    let rt = Runtime::new();
    let pair = make_pair(&rt, 1, 2);
    let deallocs = DEALLOCS.with(Cell::get);
    let alias = pair.clone();
    assert_eq!(pair.as_object().unwrap().refcnt(), 2);
    drop(pair);
    assert_eq!(DEALLOCS.with(Cell::get), deallocs);
    drop(alias);
    assert_eq!(DEALLOCS.with(Cell::get), deallocs + 1);
}

#[test]
fn types_without_dealloc_use_their_free_slot() {
    let live = stats::live_objects();
    let frees = stats::total_frees();
    let obj = generic_alloc(&CUSTOM_FREE_TYPE).unwrap();
    let alias = obj.clone();
    drop(obj);
    assert_eq!(CUSTOM_FREES.with(Cell::get), 0);
    drop(alias);
    assert_eq!(CUSTOM_FREES.with(Cell::get), 1);
    assert_eq!(stats::total_frees(), frees + 1);
    assert_eq!(stats::live_objects(), live);
}

#[test]
fn unready_type_cannot_be_called() {
    let rt = Runtime::new();
    let err = rt
        .call(&Value::Type(UNREADY_TYPE.new_ref()), Tuple::new(), None)
        .unwrap_err();
    assert!(err.is(ErrorKind::SystemError));
}

#[test]
fn type_ready_requires_dealloc_with_init() {
    let err = type_ready(&NO_DEALLOC_TYPE).unwrap_err();
    assert!(err.is(ErrorKind::SystemError));
    assert!(!NO_DEALLOC_TYPE.is_ready());
}

#[test]
fn methods_dispatch_with_arity_checks() {
    let rt = Runtime::new();
    let pair = make_pair(&rt, 3, 4);
    assert_eq!(rt.call_method(&pair, "sum", Tuple::new()).unwrap(), Value::Int(7));

    let err = rt
        .call_method(&pair, "sum", Tuple::from(vec![Value::Int(1)]))
        .unwrap_err();
    assert!(err.is(ErrorKind::TypeError));
    assert!(err.message.contains("takes no arguments (1 given)"));

    let sum = rt.getattr(&pair, "sum").unwrap();
    let mut kwargs = Kwargs::new();
    kwargs.insert("x", Value::Int(1));
    let err = rt.call(&sum, Tuple::new(), Some(&kwargs)).unwrap_err();
    assert!(err.message.contains(messages::NO_KEYWORDS));
}

#[test]
fn sentinel_mismatches_become_system_errors() {
    let rt = Runtime::new();
    let pair = make_pair(&rt, 3, 4);

    let err = rt.call_method(&pair, "broken", Tuple::new()).unwrap_err();
    assert!(err.is(ErrorKind::SystemError));
    assert!(err.message.contains(messages::NULL_WITHOUT_ERROR));

    let err = rt.call_method(&pair, "leaky", Tuple::new()).unwrap_err();
    assert!(err.is(ErrorKind::SystemError));
    assert!(err.message.contains(messages::RESULT_WITH_ERROR));
    assert!(state::occurred().is_none());
}

#[test]
fn protocol_errors_on_unsupported_values() {
    let rt = Runtime::new();
    let err = rt.len(&Value::Int(1)).unwrap_err();
    assert!(err.is(ErrorKind::TypeError));
    let err = rt.call(&Value::str("f"), Tuple::new(), None).unwrap_err();
    assert_eq!(err.message, "'str' object is not callable");
    let pair = make_pair(&rt, 3, 4);
    let err = rt.getattr(&pair, "missing").unwrap_err();
    assert!(err.is(ErrorKind::AttributeError));
    let err = rt.del_item(&pair, 0).unwrap_err();
    assert!(err.is(ErrorKind::TypeError));
}

#[test]
fn class_and_doc_attributes() {
    let rt = Runtime::new();
    let pair = make_pair(&rt, 0, 0);
    let class = rt.getattr(&pair, "__class__").unwrap();
    assert_eq!(rt.getattr(&class, "__name__").unwrap(), Value::str("pair"));
    assert_eq!(rt.getattr(&class, "__qualname__").unwrap(), Value::str("tests.pair"));
    assert_eq!(rt.getattr(&class, "__doc__").unwrap(), Value::str("two ints"));
}

#[test]
fn import_caches_modules() {
    let mut rt = Runtime::new();
    let before = PAIRS_INITS.with(Cell::get);
    let first = rt.import("pairs", init_pairs).unwrap();
    let second = rt.import("pairs", init_pairs).unwrap();
    assert!(std::rc::Rc::ptr_eq(&first, &second));
    assert_eq!(PAIRS_INITS.with(Cell::get), before + 1);
    assert!(rt.module("pairs").is_some());
}

#[test]
fn import_rejects_mismatched_and_silent_failures() {
    let mut rt = Runtime::new();
    let err = rt.import("other", init_pairs).unwrap_err();
    assert!(err.is(ErrorKind::ImportError));
    assert!(rt.module("other").is_none());

    let err = rt.import("silent", init_silent_failure).unwrap_err();
    assert!(err.is(ErrorKind::SystemError));
}
