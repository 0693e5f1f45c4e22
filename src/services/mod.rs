// src/services/mod.rs

//! The attempt workflow: gate, grading, persistence and timing.

pub mod attempt;
pub mod catalog;
pub mod gate;
pub mod grading;
pub mod render;
pub mod timing;
