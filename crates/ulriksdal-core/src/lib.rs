#![forbid(unsafe_code)]

//! Core types for the Ulriksdal XML-DSig library: the error taxonomy,
//! algorithm and namespace constants, and the secure validation policy.

pub mod algorithm;
pub mod error;
pub mod ns;
pub mod policy;

pub use error::{Error, Result};
pub use policy::SecureValidationPolicy;
