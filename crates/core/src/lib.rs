//! Domain logic for the fleet database administration toolkit.
//!
//! This crate is pure logic with no I/O: identifier validation, result-set
//! value serialization, the raw-statement guard, CSV parsing, audit action
//! vocabulary, role/capability mapping, the encoding-repair plan, and the
//! table registry. The `db` and `api` crates build on top of it.

pub mod audit;
pub mod csv;
pub mod deadline;
pub mod encoding;
pub mod error;
pub mod guard;
pub mod ident;
pub mod registry;
pub mod roles;
pub mod types;
pub mod value;
