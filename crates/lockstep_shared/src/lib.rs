//! # LOCKSTEP Shared
//!
//! Common types used by the kernel and by every driver built on top of it.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - GPU or window-related crates
//! - threading primitives
//!
//! Anything that renders belongs behind `lockstep_core::backend`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;

pub use constants::{DEFAULT_ENTITY_CAPACITY, DEFAULT_MAX_FRAME_STEP_US, DEFAULT_TICK_HZ};
pub use math::{Quaternion, Transform, Vec2, Vec3};
