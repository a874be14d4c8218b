//! # strata-core
//! Foundation types, fixed-point math, and trait seams for the Strata protocol.

pub mod constants;
pub mod error;
pub mod fixedpoint;
pub mod memory;
pub mod traits;
pub mod types;
