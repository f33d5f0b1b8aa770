//! Chip registry
//!
//! Every supported PIC is described by a [`ChipDescriptor`]. Descriptors are
//! kept in a [`Registry`], which is built from the compiled-in table and can
//! be extended with RON chip files at runtime.

mod builtin;
mod database;
mod features;
mod types;

pub use builtin::CHIPS;
pub use database::{ChipDbError, Registry};
pub use features::Features;
pub use types::{ChipDescriptor, ID_MASK, REVISION_MASK, SENTINEL_ID};
