//! Test module organization for rig polling
//!
//! Unit tests for the polling engine run against scripted dialers so every
//! network outcome (refused probe, malformed payload, slow controller) is
//! deterministic.

pub mod collector_tests;
pub mod net_tests;
pub mod support;
