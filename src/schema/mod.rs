//! Static schema metadata for the internship database.
//!
//! The descriptor is built once at startup, validated, and then read-only
//! for the lifetime of the process. Classification, synthesis, and
//! rendering all take it as an explicit argument so they stay pure
//! functions of their inputs.

mod descriptor;

pub use descriptor::{ColumnDescriptor, SchemaDescriptor, SemanticType, TableDescriptor};
