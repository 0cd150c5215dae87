//! Status-LED engine: arbitration, overrides, colour resolution, and the
//! cooperative manager task that drives the render backend.

pub mod arbiter;
pub mod manager;
pub mod overrides;
pub mod palette;
