use std::fmt;

use hc_runtime::HostError;

pub(crate) mod common;
pub(crate) mod info;
pub(crate) mod run;
pub(crate) mod seq;

pub(crate) enum CliError {
    /// Bad command line or script syntax.
    Usage(String),
    Host(HostError),
    /// A script line failed; carries the 1-based line number.
    Line(usize, Box<CliError>),
}

impl CliError {
    pub(crate) fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::Host(_) => 1,
            CliError::Line(_, inner) => inner.exit_code(),
        }
    }
}

impl From<HostError> for CliError {
    fn from(e: HostError) -> Self {
        CliError::Host(e)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(msg) => f.write_str(msg),
            CliError::Host(e) => write!(f, "{e}"),
            CliError::Line(n, inner) => write!(f, "line {n}: {inner}"),
        }
    }
}
