//! EVSE gateway status-LED firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

// Exactly one render backend is selected at build time; mixing them is a
// configuration error, not a runtime branch.
#[cfg(all(feature = "pwm-rgb", feature = "pixel-strip"))]
compile_error!("select exactly one LED backend feature (pwm-rgb, pixel-strip, fx-strip)");
#[cfg(all(feature = "pwm-rgb", feature = "fx-strip"))]
compile_error!("select exactly one LED backend feature (pwm-rgb, pixel-strip, fx-strip)");
#[cfg(all(feature = "pixel-strip", feature = "fx-strip"))]
compile_error!("select exactly one LED backend feature (pwm-rgb, pixel-strip, fx-strip)");
#[cfg(not(any(feature = "pwm-rgb", feature = "pixel-strip", feature = "fx-strip")))]
compile_error!("select a LED backend feature (pwm-rgb, pixel-strip, fx-strip)");

pub mod app;
pub mod config;
pub mod events;
pub mod led;

mod error;
mod pins;

pub use error::{Error, Result};

// Re-export the ESP-IDF-aware modules so the crate compiles everywhere;
// the hardware implementations are guarded by cfg attributes inside.
pub mod adapters;
pub mod drivers;
