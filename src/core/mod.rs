// src/core/mod.rs

pub mod classifier;
pub mod engine;
pub mod matrix;
pub mod tables;
pub mod tree;
pub mod triads;
pub mod types;
