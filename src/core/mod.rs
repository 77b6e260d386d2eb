//! Core logic: types, parsing, indices, graph, recipes, validation, execution.

pub mod data;
pub mod error;
pub mod executor;
pub mod graph;
pub mod index;
pub mod parser;
pub mod recipe;
pub mod types;
pub mod validator;
