//! systemconf: declare the programs a machine should have, their
//! dependencies, and how to check and install each one.
//!
//! One YAML file, validated up front, executed in dependency order.

pub mod cli;
pub mod core;
pub mod transport;
