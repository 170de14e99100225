//! Runtime configuration.

#[derive(Clone, Copy, Debug)]
pub struct RuntimeConfig {
    /// Add the sequence length to negative indices before calling a type's
    /// `item`/`ass_item` slots. When off, negative indices reach the slots
    /// unchanged.
    pub wrap_negative_indices: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            wrap_negative_indices: true,
        }
    }
}
