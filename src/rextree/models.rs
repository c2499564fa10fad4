//! View models built on the ordered tree
//!
//! Two unrelated consumers share the container and the visibility engine:
//! the regex-token tree and the pattern-alias tree. Each instantiates the
//! container with its own column-cell type and its own sorting, find and
//! duplicate-merge strategies.

pub mod patterns;
pub mod tokens;
