//! Domain primitives shared by the persistence and HTTP layers.
//!
//! This crate performs no I/O: it holds the error taxonomy, common type
//! aliases, input validation rules, and pagination arithmetic.

pub mod error;
pub mod pagination;
pub mod types;
pub mod validation;
