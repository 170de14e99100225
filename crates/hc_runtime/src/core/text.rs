//! Host string storage with small string optimization.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::rc::Rc;
use std::str;

pub const INLINE_CAP: usize = 22;

/// Immutable UTF-8 text owned by a host string value.
///
/// Strings up to [`INLINE_CAP`] bytes live inline; longer strings share one
/// heap buffer between clones.
#[derive(Clone)]
pub enum Text {
    Inline { len: u8, buf: [u8; INLINE_CAP] },
    Heap(Rc<str>),
}

impl Text {
    pub fn new() -> Self {
        Self::Inline {
            len: 0,
            buf: [0u8; INLINE_CAP],
        }
    }

    pub fn from_str(s: &str) -> Self {
        if s.len() <= INLINE_CAP {
            let mut buf = [0u8; INLINE_CAP];
            buf[..s.len()].copy_from_slice(s.as_bytes());
            return Self::Inline {
                len: s.len() as u8,
                buf,
            };
        }
        Self::Heap(Rc::from(s))
    }

    pub fn from_string(s: String) -> Self {
        if s.len() <= INLINE_CAP {
            return Self::from_str(&s);
        }
        Self::Heap(Rc::from(s.into_boxed_str()))
    }

    pub fn as_str(&self) -> &str {
        match self {
            Text::Inline { len, buf } => {
                let s = &buf[..*len as usize];
                // Inline bytes are only ever copied from a `&str`.
                unsafe { str::from_utf8_unchecked(s) }
            }
            Text::Heap(data) => data,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.as_str().as_bytes()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Text::Inline { len, .. } => *len as usize,
            Text::Heap(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn char_count(&self) -> usize {
        let s = self.as_str();
        if s.is_ascii() { s.len() } else { s.chars().count() }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Text::Inline { .. })
    }
}

impl Default for Text {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Text {
    fn eq(&self, other: &Self) -> bool {
        if let (Text::Heap(a), Text::Heap(b)) = (self, other) {
            if Rc::ptr_eq(a, b) {
                return true;
            }
        }
        self.as_str() == other.as_str()
    }
}

impl Eq for Text {}

impl Hash for Text {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Text {
    fn from(value: &str) -> Self {
        Text::from_str(value)
    }
}

impl From<String> for Text {
    fn from(value: String) -> Self {
        Text::from_string(value)
    }
}

impl AsRef<str> for Text {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl Deref for Text {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}
