//! Consolidated test modules.
//!
//! End-to-end scenarios that exercise the analytical pipeline across
//! components, parameterized over representative usage shapes.
