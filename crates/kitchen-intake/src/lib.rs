//! Core library for the kitchen marketplace application intake service.
//!
//! The interesting machinery lives under [`workflows::intake`]: a
//! requirements-driven form engine covering schema construction, default
//! resolution, live form state, multipart submission assembly, and the tiered
//! status presentation used by the applicant-facing surface.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
