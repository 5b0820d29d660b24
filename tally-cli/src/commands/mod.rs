//! CLI command implementations.

pub mod check;
pub mod history;
pub mod migrate;
pub mod version;
