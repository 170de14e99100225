//! Text decoding and encoding at the host boundary.

use crate::core::Text;
use crate::errors::{HostError, state};
use crate::Value;

/// Borrows the UTF-8 bytes of a host string.
pub fn as_utf8(v: &Value) -> Result<&str, HostError> {
    match v {
        Value::Str(t) => Ok(t.as_str()),
        other => Err(HostError::type_error(format!(
            "bad argument type: expected str, got {}",
            other.type_name()
        ))),
    }
}

/// Like [`as_utf8`], but reports failure through the current-error
/// indicator and returns `None`.
///
/// The adapters in `hc_embed` call [`as_utf8`] and propagate its `Result`.
pub fn as_utf8_and_size(v: &Value) -> Option<&str> {
    match as_utf8(v) {
        Ok(s) => Some(s),
        Err(err) => {
            state::set(err);
            None
        }
    }
}

pub fn from_str(s: &str) -> Value {
    Value::Str(Text::from_str(s))
}

pub fn from_string(s: String) -> Value {
    Value::Str(Text::from_string(s))
}
