//! The capability-based security kernel: minting, delegation, transfer,
//! and parameter-match predicate checking.

#![deny(unsafe_code)]

pub mod error;
pub mod kernel;
pub mod predicates;

pub use error::{CapabilityError, CapabilityResult};
pub use kernel::CapabilityKernel;
