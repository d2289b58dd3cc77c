//! Integration test utilities for the relay
//!
//! This crate provides helpers for running end-to-end tests against a real
//! relay server over WebSocket.

pub mod helpers;

pub use helpers::*;
