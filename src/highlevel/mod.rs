//! High-level entry point.
//!
//! This layer provides [`ResourceStateController`], which owns one instance
//! of every component, runs the initialisation sequence and gates the core
//! by [`SystemState`](crate::state::SystemState).
//!
//! For finer control, build the pieces from [`kernel`](crate::kernel),
//! [`memory`](crate::memory) and [`cognition`](crate::cognition) directly.

pub mod controller;

pub use controller::{Collaborators, ResourceStateController};
