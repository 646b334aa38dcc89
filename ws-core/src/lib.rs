//! Foundation layer shared by every workspace crate.
//!
//! - [`rop`]: railway-oriented chaining of pipeline steps
//! - [`error`]: the infrastructure error type
//! - [`secrets`]: random token and name suffix generation

pub mod error;
pub mod rop;
pub mod secrets;

pub use error::{Result, WsError};
pub use rop::{FallibleStep, InfallibleStep, Railway, Step, StepMode};
