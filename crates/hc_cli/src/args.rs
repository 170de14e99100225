pub(crate) struct CliArgs {
    pub cmd: String,
    pub json_out: bool,
    pub verbose: bool,
    pub raw_index: bool,
    pub positional: Vec<String>,
}

pub(crate) fn usage() -> &'static str {
    "Usage: hc <info|strlen|new|get|set|run> [json] [verbose] [raw-index] <args>"
}

pub(crate) fn parse_args() -> Result<CliArgs, String> {
    parse(std::env::args().skip(1).collect())
}

fn parse(mut argv: Vec<String>) -> Result<CliArgs, String> {
    if argv.is_empty() {
        return Err(usage().to_string());
    }
    let cmd = argv.remove(0);

    let mut json_out = false;
    let mut verbose = false;
    let mut raw_index = false;
    let mut positional: Vec<String> = Vec::new();

    for a in argv {
        if a.starts_with("--") {
            return Err(format!("Unknown option: {a}"));
        }
        match a.as_str() {
            "json" => json_out = true,
            "verbose" => verbose = true,
            "raw-index" => raw_index = true,
            _ => positional.push(a),
        }
    }

    Ok(CliArgs {
        cmd,
        json_out,
        verbose,
        raw_index,
        positional,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_are_bare_words() {
        let args = parse(argv(&["get", "json", "1", "raw-index", "a", "b"])).unwrap();
        assert_eq!(args.cmd, "get");
        assert!(args.json_out);
        assert!(args.raw_index);
        assert!(!args.verbose);
        assert_eq!(args.positional, ["1", "a", "b"]);
    }

    #[test]
    fn dashed_options_are_rejected() {
        let err = parse(argv(&["new", "--json", "a"])).err().unwrap();
        assert_eq!(err, "Unknown option: --json");
    }

    #[test]
    fn missing_command_reports_usage() {
        assert_eq!(parse(Vec::new()).err().unwrap(), usage());
    }

    #[test]
    fn single_dash_is_positional() {
        let args = parse(argv(&["new", "-", "-1"])).unwrap();
        assert_eq!(args.positional, ["-", "-1"]);
    }
}
