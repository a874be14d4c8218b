//! Test support for the Strata workspace.
//!
//! Integration tests live in `tests/`; the [`helpers`] module provides a
//! single-ledger harness bundling the engine with its in-memory
//! collaborators.

pub mod helpers;
