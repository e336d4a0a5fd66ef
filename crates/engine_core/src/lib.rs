//! Core engine types and utilities for Textroll.
//!
//! This crate provides the foundational types used across all simulation crates:
//! - 2D math re-exports
//! - Fixed-step time management

pub mod time;

pub use time::*;

// Re-export commonly used types
pub use glam::Vec2;
