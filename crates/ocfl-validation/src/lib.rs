//! OCFL conformance findings.
//!
//! Validation in OCFL is best-effort: a check keeps going after the first
//! problem and reports everything it found. This crate supplies the two
//! pieces every checker shares:
//!
//! - [`Code`] -- the catalogue of `E` (MUST) and `W` (SHOULD) codes, with
//!   per-revision lookup and a fallback table for codes renumbered between
//!   specification revisions
//! - [`ValidationSession`] -- the ordered, de-duplicable accumulator that a
//!   check writes findings into and returns to its caller

pub mod catalog;
pub mod session;

pub use catalog::{resolve, Code, Resolved};
pub use session::{Severity, ValidationEntry, ValidationSession};
