//! Application services
//!
//! Concrete service structs that orchestrate domain logic over the I/O
//! boundary traits.

mod tree;

pub use tree::{BranchReport, RootSummary, TreeReport, TreeService};
