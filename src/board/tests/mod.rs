//! Unit tests for the board module.
//!
//! Tests are organised by layer: the mutation engine and its ordering
//! rules, the domain value types, and the synchronized session.

mod domain_tests;
