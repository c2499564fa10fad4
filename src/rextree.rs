//! Main module for rextree library functionality

pub mod diag;
pub mod filtering;
pub mod models;
pub mod parsing;
pub mod scripting;
pub mod serializing;
pub mod snapshot;
pub mod token;
pub mod tree;
pub mod validation;
