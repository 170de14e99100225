//! Line scripts driving one `string_vector` at a time.
//!
//! ```text
//! # comment
//! new ab cde f
//! set 1 X
//! get 1
//! show
//! ```

use hc_runtime::{Runtime, Tuple, Value};
use serde_json::json;

use crate::args::CliArgs;
use crate::commands::CliError;
use crate::commands::common::{
    build_vector, contents, list_json, open_module, parse_index, parse_item, print_json,
    render_list, to_json,
};

#[derive(Debug, PartialEq)]
enum Step {
    New(Vec<String>),
    Len,
    Get(isize),
    Set(isize, String),
    Del(isize),
    Front,
    Show,
    Strlen(String),
}

fn parse_line(line: &str) -> Result<Option<Step>, CliError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let words: Vec<&str> = line.split_whitespace().collect();
    let step = match words.as_slice() {
        ["new", items @ ..] => Step::New(items.iter().map(|s| s.to_string()).collect()),
        ["len"] => Step::Len,
        ["get", i] => Step::Get(parse_index(i)?),
        ["set", i, v] => Step::Set(parse_index(i)?, v.to_string()),
        ["del", i] => Step::Del(parse_index(i)?),
        ["front"] => Step::Front,
        ["show"] => Step::Show,
        ["strlen", s] => Step::Strlen(s.to_string()),
        [op, ..] => {
            return Err(CliError::Usage(format!(
                "Bad command: {op} (expected new|len|get|set|del|front|show|strlen)"
            )));
        }
        [] => return Ok(None),
    };
    Ok(Some(step))
}

struct Session<'a> {
    rt: &'a mut Runtime,
    json_out: bool,
    current: Option<Value>,
}

impl Session<'_> {
    fn vector(&self) -> Result<&Value, CliError> {
        self.current
            .as_ref()
            .ok_or_else(|| CliError::Usage("No vector; start with new".to_string()))
    }

    fn emit(&self, op: &str, value: Option<&Value>) {
        match value {
            Some(v) if self.json_out => print_json(json!({ "op": op, "value": to_json(v) })),
            Some(v) => println!("{v}"),
            None if self.json_out => print_json(json!({ "op": op })),
            None => {}
        }
    }

    fn exec(&mut self, step: Step) -> Result<(), CliError> {
        match step {
            Step::New(items) => {
                let v = build_vector(self.rt, &items)?;
                tracing::debug!(items = items.len(), "vector created");
                self.current = Some(v);
                self.emit("new", None);
            }
            Step::Len => {
                let n = self.rt.len(self.vector()?)?;
                self.emit("len", Some(&Value::Int(n as i64)));
            }
            Step::Get(i) => {
                let item = self.rt.get_item(self.vector()?, i)?;
                self.emit("get", Some(&item));
            }
            Step::Set(i, v) => {
                self.rt.set_item(self.vector()?, i, &parse_item(&v))?;
                self.emit("set", None);
            }
            Step::Del(i) => {
                self.rt.del_item(self.vector()?, i)?;
                self.emit("del", None);
            }
            Step::Front => {
                let item = self.rt.call_method(self.vector()?, "front", Tuple::new())?;
                self.emit("front", Some(&item));
            }
            Step::Show => {
                let items = contents(self.rt, self.vector()?)?;
                if self.json_out {
                    print_json(json!({ "op": "show", "value": list_json(&items) }));
                } else {
                    println!("{}", render_list(&items));
                }
            }
            Step::Strlen(s) => {
                let module = Value::Module(open_module(self.rt)?);
                let func = self.rt.getattr(&module, "strlen")?;
                let n = self.rt.call(&func, Tuple::from(vec![parse_item(&s)]), None)?;
                self.emit("strlen", Some(&n));
            }
        }
        Ok(())
    }
}

pub(crate) fn run(args: &CliArgs, rt: &mut Runtime) -> Result<(), CliError> {
    let [path] = args.positional.as_slice() else {
        return Err(CliError::Usage("Missing <file>".to_string()));
    };
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Usage(format!("Read failed: {e}")))?;

    let mut session = Session {
        rt,
        json_out: args.json_out,
        current: None,
    };
    for (n, line) in text.lines().enumerate() {
        let at_line = |e: CliError| CliError::Line(n + 1, Box::new(e));
        let Some(step) = parse_line(line).map_err(at_line)? else {
            continue;
        };
        session.exec(step).map_err(at_line)?;
    }
    Ok(())
}
