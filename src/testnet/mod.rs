//! Helpers for unit tests: low-difficulty ledgers and pre-funded miners.

pub mod test_utils;

pub use test_utils::*;
