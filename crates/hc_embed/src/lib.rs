//! Embeds native Rust values in host runtime records.
//!
//! A record is the host header followed by a [`ScopedSlot`] holding the
//! payload. [`lifecycle`] drives the slot through initialization and
//! teardown, [`bridge`] exposes a payload as a host sequence, and
//! [`registration`] publishes `test_module` with its `string_vector` type.

pub mod bridge;
pub mod lifecycle;
pub mod registration;
pub mod slot;
pub mod string_vector;

pub use bridge::{NativeSequence, normalize_index, sequence_methods};
pub use lifecycle::{NativeInit, NativeObject, class_dealloc, class_init, construct_native};
pub use registration::{MODULE_NAME, TEST_MODULE, TEST_MODULE_TYPES, build_module, init_test_module};
pub use slot::ScopedSlot;
pub use string_vector::{STRING_VECTOR_TYPE, StringVector};
