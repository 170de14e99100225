use hc_embed::{MODULE_NAME, init_test_module};
use hc_runtime::{HostError, ModuleRef, Runtime, Tuple, Value};
use serde_json::json;

use crate::commands::CliError;

pub(crate) fn open_module(rt: &mut Runtime) -> Result<ModuleRef, HostError> {
    rt.import(MODULE_NAME, init_test_module)
}

/// `int:<n>` becomes a host integer; anything else is text.
pub(crate) fn parse_item(s: &str) -> Value {
    match s.strip_prefix("int:").and_then(|n| n.parse::<i64>().ok()) {
        Some(n) => Value::Int(n),
        None => Value::str(s),
    }
}

pub(crate) fn parse_index(s: &str) -> Result<isize, CliError> {
    s.parse()
        .map_err(|_| CliError::Usage(format!("Invalid index: {s}")))
}

pub(crate) fn build_vector<S: AsRef<str>>(rt: &mut Runtime, items: &[S]) -> Result<Value, HostError> {
    let module = Value::Module(open_module(rt)?);
    let ty = rt.getattr(&module, "string_vector")?;
    let args: Tuple = items.iter().map(|s| parse_item(s.as_ref())).collect();
    rt.call(&ty, args, None)
}

pub(crate) fn contents(rt: &Runtime, v: &Value) -> Result<Vec<Value>, HostError> {
    let n = rt.len(v)?;
    (0..n).map(|i| rt.get_item(v, i as isize)).collect()
}

pub(crate) fn render_list(items: &[Value]) -> String {
    let parts: Vec<String> = items.iter().map(Value::repr).collect();
    format!("[{}]", parts.join(", "))
}

pub(crate) fn to_json(v: &Value) -> serde_json::Value {
    match v {
        Value::None => serde_json::Value::Null,
        Value::Bool(b) => json!(b),
        Value::Int(i) => json!(i),
        Value::Str(t) => json!(t.as_str()),
        other => json!(other.to_string()),
    }
}

pub(crate) fn list_json(items: &[Value]) -> serde_json::Value {
    json!({
        "len": items.len(),
        "items": items.iter().map(to_json).collect::<Vec<_>>(),
    })
}

pub(crate) fn print_json(obj: serde_json::Value) {
    println!("{}", obj);
}
