//! Matter data model pieces the bridge consumes and produces.
//!
//! Attribute reports come in from a controller subscription; cluster
//! commands go back out through it.

pub mod attributes;
pub mod clusters;

pub use attributes::{AttributeName, AttributeReport};
pub use clusters::ClusterCommand;
