//! # timerloop-core
//!
//! Shared types for the timerloop timer-and-poll core: the error
//! taxonomy, environment-variable config helpers, the ambient logging
//! macros, and the `Coroutine` collaborator trait that `timerloop-rt`
//! drives but never implements.

pub mod coroutine;
pub mod env;
pub mod error;
pub mod log;

pub use coroutine::{Coroutine, CoroutineRef, FinishReason};
pub use env::{env_get, env_get_bool, env_get_opt};
pub use error::{CortError, CortResult};
pub use log::LogLevel;
