//! Shared domain types, error taxonomy, and configuration for the world
//! server: the one crate every other crate in the workspace depends on.

#![deny(unsafe_code)]

pub mod ast;
pub mod config;
pub mod context;
pub mod error;
pub mod ids;
pub mod lambda;
pub mod model;
pub mod prelude;
pub mod value;
pub mod world;

pub use error::{Result, WovError};
pub use prelude::*;
