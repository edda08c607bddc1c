//! codedrill · adaptive offline coding practice.
//!
//! Selection engine (scoring, sampling, stratified sets, progress gating)
//! and the interactive practice session, with every outside concern behind
//! a trait.

pub mod util;
pub mod domain;
pub mod config;
pub mod seeds;
pub mod catalog;
pub mod scoring;
pub mod sampler;
pub mod ranking;
pub mod practice;
pub mod progress;
pub mod stats;
pub mod events;
pub mod gate;
pub mod constraints;
pub mod sandbox;
pub mod workspace;
pub mod console;
pub mod validate;
pub mod session;
pub mod telemetry;

#[cfg(test)]
mod testing;
