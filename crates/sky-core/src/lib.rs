//! Core building blocks for Skyline.
//!
//! This crate hosts what every other Skyline crate depends on:
//! - the error type and `Result` alias
//! - validated data types (event schedules, cache states, tree ids)
//! - the collaborator traits that keep tree storage and parameter
//!   management outside the likelihood engine

pub mod error;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
