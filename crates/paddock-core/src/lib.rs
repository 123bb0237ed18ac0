//! Core types and trait definitions for the paddock park-state store.
//!
//! This crate is deliberately free of HTTP and database dependencies;
//! every other crate in the workspace depends on it.

pub mod animal;
pub mod cache;
pub mod error;
pub mod event;
pub mod habitat;
pub mod status;
pub mod store;

pub use error::{ClassifyError, Error, ErrorClass, Result};
