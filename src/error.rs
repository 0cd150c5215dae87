//! Unified error types for the gateway LED firmware.
//!
//! Follows embedded best practice: a single `Error` enum that every subsystem
//! can convert into, keeping the top-level event loop's error handling uniform.
//! All variants are `Copy` so they can be cheaply passed through the manager
//! and the request boundary without allocation.

use core::fmt;

/// Every fallible operation in the LED subsystem funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An override request named a category outside the 8 fixed slots.
    /// Surfaced to the caller as a rejected request, never silently coerced.
    InvalidCategory,
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCategory => write!(f, "unknown override category"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
