//! shepherd-core - Core types and traits for the shepherd query pipeline
//!
//! This crate provides the foundational types, traits, error handling, and
//! configuration used throughout the shepherd system.

pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::{Result, ShepherdError};
pub use traits::*;
pub use types::*;
