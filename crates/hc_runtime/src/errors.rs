//! Host error kinds and the per-thread current-error indicator.

use std::fmt;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    UsageError,
    ValueError,
    RuntimeError,
    IndexError,
    TypeError,
    AttributeError,
    MemoryError,
    SystemError,
    ImportError,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::UsageError => "UsageError",
            ErrorKind::ValueError => "ValueError",
            ErrorKind::RuntimeError => "RuntimeError",
            ErrorKind::IndexError => "IndexError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::AttributeError => "AttributeError",
            ErrorKind::MemoryError => "MemoryError",
            ErrorKind::SystemError => "SystemError",
            ErrorKind::ImportError => "ImportError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An error raised inside the host, as seen by whoever fetches it.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct HostError {
    pub kind: ErrorKind,
    pub message: String,
}

impl HostError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UsageError, message)
    }

    pub fn value(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValueError, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RuntimeError, message)
    }

    pub fn index(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IndexError, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TypeError, message)
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SystemError, message)
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

pub mod messages {
    pub const INDEX_OUT_OF_RANGE: &str = "index out of range";
    pub const NULL_WITHOUT_ERROR: &str = "error return without exception set";
    pub const RESULT_WITH_ERROR: &str = "returned a result with an exception set";
    pub const OUT_OF_MEMORY: &str = "out of memory";
    pub const NO_KEYWORDS: &str = "takes no keyword arguments";
}

/// The current-error indicator.
///
/// Entry points report failure by setting an error here and returning a
/// sentinel; the caller that observes the sentinel fetches the error with
/// [`take`]. One indicator exists per thread.
pub mod state {
    use std::cell::RefCell;

    use super::{ErrorKind, HostError};

    thread_local! {
        static CURRENT: RefCell<Option<HostError>> = const { RefCell::new(None) };
    }

    /// Overwrites any error already pending.
    pub fn set(err: HostError) {
        tracing::trace!(kind = %err.kind, message = %err.message, "error set");
        CURRENT.with(|c| *c.borrow_mut() = Some(err));
    }

    pub fn set_string(kind: ErrorKind, message: &str) {
        set(HostError::new(kind, message));
    }

    pub fn occurred() -> Option<ErrorKind> {
        CURRENT.with(|c| c.borrow().as_ref().map(|e| e.kind))
    }

    pub fn take() -> Option<HostError> {
        CURRENT.with(|c| c.borrow_mut().take())
    }

    pub fn clear() {
        CURRENT.with(|c| *c.borrow_mut() = None);
    }

    /// Fetches the error behind a sentinel return from `who`.
    pub fn fetch(who: &str) -> HostError {
        take().unwrap_or_else(|| {
            HostError::system(format!("{who}: {}", super::messages::NULL_WITHOUT_ERROR))
        })
    }

    /// Rejects a successful return from `who` that left an error pending.
    pub fn check_clean(who: &str) -> Result<(), HostError> {
        match take() {
            None => Ok(()),
            Some(pending) => Err(HostError::system(format!(
                "{who} {} ({pending})",
                super::messages::RESULT_WITH_ERROR
            ))),
        }
    }
}
