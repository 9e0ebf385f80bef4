//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Math types and orientation helpers
//! - Frame-driven readiness polling
//! - Logging utilities

pub mod math;
pub mod poll;
pub mod logging;
