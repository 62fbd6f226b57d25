//! Integration test utilities for the gateway transport
//!
//! This crate provides a scripted in-process WebSocket gateway so the
//! transport client can be driven end-to-end without a real backend.

pub mod helpers;

pub use helpers::*;
