//! Probability building blocks for Skyline.
//!
//! This crate hosts the small numerically-stable primitives shared by the
//! likelihood accumulators. Anything that needs a careful floating-point
//! formulation lives here, with its tests, rather than inline in domain
//! code.

pub mod math;
