use hc_runtime::{Runtime, Value};
use serde_json::json;

use crate::args::CliArgs;
use crate::commands::CliError;
use crate::commands::common::{open_module, print_json};

pub(crate) fn run(args: &CliArgs, rt: &mut Runtime) -> Result<(), CliError> {
    if !args.positional.is_empty() {
        return Err(CliError::Usage("info takes no arguments".to_string()));
    }
    let module = open_module(rt)?;

    let mut functions = Vec::new();
    let mut types = Vec::new();
    for name in module.names() {
        match module.get(&name) {
            Some(Value::Builtin(def)) => functions.push((name, def.doc)),
            Some(Value::Type(ty)) => {
                let methods: Vec<(&str, &str)> = ty.methods.iter().map(|m| (m.name, m.doc)).collect();
                types.push((name, ty.name, ty.doc, methods));
            }
            _ => {}
        }
    }

    if args.json_out {
        print_json(json!({
            "module": module.name(),
            "doc": module.doc(),
            "functions": functions
                .iter()
                .map(|(name, doc)| json!({ "name": name, "doc": doc }))
                .collect::<Vec<_>>(),
            "types": types
                .iter()
                .map(|(name, qualname, doc, methods)| json!({
                    "name": name,
                    "qualname": qualname,
                    "doc": doc,
                    "methods": methods
                        .iter()
                        .map(|(m, d)| json!({ "name": m, "doc": d }))
                        .collect::<Vec<_>>(),
                }))
                .collect::<Vec<_>>(),
        }));
        return Ok(());
    }

    println!("module {}: {}", module.name(), module.doc());
    for (name, doc) in &functions {
        println!("  function {name}: {doc}");
    }
    for (name, qualname, doc, methods) in &types {
        println!("  type {name} ({qualname}): {doc}");
        for (m, d) in methods {
            println!("    method {m}: {d}");
        }
    }
    Ok(())
}
