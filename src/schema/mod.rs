//! Unified cog.raw_session.v1 schema
//!
//! This module defines the input contract with the task runners: one
//! assessment session carrying raw telemetry for each task attempted, and the
//! adapter that turns a batch of sessions into timestamped feature vectors.

mod adapter;
mod raw_session;

pub use adapter::*;
pub use raw_session::*;
