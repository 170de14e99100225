use hc_runtime::{Runtime, Tuple, Value};
use serde_json::json;

use crate::args::CliArgs;
use crate::commands::CliError;
use crate::commands::common::{
    build_vector, contents, list_json, open_module, parse_index, parse_item, print_json,
    render_list, to_json,
};

pub(crate) fn strlen(args: &CliArgs, rt: &mut Runtime) -> Result<(), CliError> {
    let [text] = args.positional.as_slice() else {
        return Err(CliError::Usage("Missing <text>".to_string()));
    };
    let module = Value::Module(open_module(rt)?);
    let func = rt.getattr(&module, "strlen")?;
    let n = rt.call(&func, Tuple::from(vec![parse_item(text)]), None)?;
    if args.json_out {
        print_json(json!({ "text": text, "bytes": to_json(&n) }));
    } else {
        println!("{n}");
    }
    Ok(())
}

pub(crate) fn new(args: &CliArgs, rt: &mut Runtime) -> Result<(), CliError> {
    let v = build_vector(rt, &args.positional)?;
    show(args, rt, &v)
}

pub(crate) fn get(args: &CliArgs, rt: &mut Runtime) -> Result<(), CliError> {
    let Some((index, items)) = args.positional.split_first() else {
        return Err(CliError::Usage("Missing <index>".to_string()));
    };
    let index = parse_index(index)?;
    let v = build_vector(rt, items)?;
    let item = rt.get_item(&v, index)?;
    if args.json_out {
        print_json(json!({ "index": index, "value": to_json(&item) }));
    } else {
        println!("{item}");
    }
    Ok(())
}

pub(crate) fn set(args: &CliArgs, rt: &mut Runtime) -> Result<(), CliError> {
    let [index, value, items @ ..] = args.positional.as_slice() else {
        return Err(CliError::Usage("Missing <index> <value>".to_string()));
    };
    let index = parse_index(index)?;
    let v = build_vector(rt, items)?;
    rt.set_item(&v, index, &parse_item(value))?;
    show(args, rt, &v)
}

fn show(args: &CliArgs, rt: &Runtime, v: &Value) -> Result<(), CliError> {
    let items = contents(rt, v)?;
    if args.json_out {
        print_json(list_json(&items));
    } else {
        println!("{}", render_list(&items));
    }
    Ok(())
}
