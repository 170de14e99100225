mod args;
mod commands;

use hc_runtime::{Runtime, RuntimeConfig};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::args::CliArgs;
use crate::commands::CliError;

fn init_tracing(verbose: bool) {
    let env_filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env("HC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

fn main() {
    let args = match args::parse_args() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    init_tracing(args.verbose);

    let mut rt = Runtime::with_config(RuntimeConfig {
        wrap_negative_indices: !args.raw_index,
    });
    if let Err(e) = dispatch(&args, &mut rt) {
        eprintln!("{e}");
        std::process::exit(e.exit_code());
    }
}

fn dispatch(args: &CliArgs, rt: &mut Runtime) -> Result<(), CliError> {
    match args.cmd.as_str() {
        "info" => commands::info::run(args, rt),
        "strlen" => commands::seq::strlen(args, rt),
        "new" => commands::seq::new(args, rt),
        "get" => commands::seq::get(args, rt),
        "set" => commands::seq::set(args, rt),
        "run" => commands::run::run(args, rt),
        _ => Err(CliError::Usage(format!("Unknown command: {}", args.cmd))),
    }
}
