//! comptree: composite tree analysis for structural models
//!
//! Walks the composite attributes, ports and association ends of a root type
//! and reports, branch by branch, whether they form a well-formed tree.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
